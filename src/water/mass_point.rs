use std::collections::VecDeque;

use bevy::math::FloatExt;
use bevy::prelude::*;

/// One simulated node of the surface chain, tied to a mesh vertex.
///
/// Displacement is purely vertical: `current_force` doubles as the signed
/// Y offset the write-back stage applies on top of `base_position`.
#[derive(Clone, Copy, Debug)]
pub struct MassPoint {
    /// Index into the owning mesh's vertex buffer. Fixed at construction.
    pub vertex_index: usize,
    /// Rest position with zero displacement. Fixed at construction.
    pub base_position: Vec3,
    /// Signed rate of vertical displacement change.
    pub velocity: f32,
    /// Accumulated signed vertical displacement.
    pub current_force: f32,
    /// Ambient oscillation offset, recomputed every frame.
    pub base_turbulent: f32,
    /// Arena index of the neighbor toward the far end of the chain.
    left: Option<usize>,
    /// Arena index of the neighbor toward the chain start.
    right: Option<usize>,
}

impl MassPoint {
    fn new(vertex_index: usize, base_position: Vec3) -> Self {
        Self {
            vertex_index,
            base_position,
            velocity: 0.0,
            current_force: 0.0,
            base_turbulent: 0.0,
            left: None,
            right: None,
        }
    }

    /// Spring displacement plus the ambient turbulence offset.
    pub fn final_force(&self) -> f32 {
        self.current_force + self.base_turbulent
    }

    pub fn left(&self) -> Option<usize> {
        self.left
    }

    pub fn right(&self) -> Option<usize> {
        self.right
    }
}

/// Attenuation factors for impulse propagation along the chain.
#[derive(Clone, Copy, Debug)]
pub struct SpreadAttenuation {
    /// Applied per neighbor hop.
    pub second: f32,
    /// Applied when an impulse reflects off a chain end.
    pub wall: f32,
}

/// A pending propagation step: visit `target` carrying `force` at
/// traversal depth `deep`.
#[derive(Clone, Copy, Debug)]
struct SpreadTask {
    target: usize,
    force: f32,
    deep: u32,
}

/// An open path of [`MassPoint`]s stored in a single arena, with neighbor
/// links as indices. Order is fixed at construction: point `i`'s right
/// neighbor is `i - 1` and its left neighbor is `i + 1`.
#[derive(Clone, Debug, Default)]
pub struct MassPointChain {
    points: Vec<MassPoint>,
}

impl MassPointChain {
    /// Build a chain from a vertex buffer and a parallel per-vertex color
    /// array. Vertices with color alpha > 0 participate, ordered by
    /// ascending alpha (the mesh generator bakes chain order into that
    /// channel). Missing colors or no positive alpha give an empty chain.
    pub fn from_vertex_colors(vertices: &[[f32; 3]], colors: &[[f32; 4]]) -> Self {
        let mut tagged: Vec<(usize, f32)> = colors
            .iter()
            .enumerate()
            .take(vertices.len())
            .filter(|(_, c)| c[3] > 0.0)
            .map(|(i, c)| (i, c[3]))
            .collect();
        tagged.sort_by(|a, b| a.1.total_cmp(&b.1));

        Self::from_ordered_indices(vertices, tagged.iter().map(|(i, _)| *i))
    }

    /// Build a chain from an explicit ordered list of participating vertex
    /// indices. Indices out of range are skipped.
    pub fn from_ordered_indices(
        vertices: &[[f32; 3]],
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut points: Vec<MassPoint> = indices
            .into_iter()
            .filter(|&i| i < vertices.len())
            .map(|i| MassPoint::new(i, Vec3::from_array(vertices[i])))
            .collect();

        let len = points.len();
        for (i, point) in points.iter_mut().enumerate() {
            if i > 0 {
                point.right = Some(i - 1);
            }
            if i + 1 < len {
                point.left = Some(i + 1);
            }
        }

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[MassPoint] {
        &self.points
    }

    pub fn point_mut(&mut self, index: usize) -> Option<&mut MassPoint> {
        self.points.get_mut(index)
    }

    /// Distribute every pending impulse: each point holding a positive
    /// `current_force` spreads it to its neighbors.
    pub fn propagate(&mut self, atte: SpreadAttenuation) {
        for i in 0..self.points.len() {
            let force = self.points[i].current_force;
            if force > 0.0 {
                self.spread(i, force, atte);
            }
        }
    }

    /// Bounded worklist traversal. Each worked task adds `force * second`
    /// to present neighbors and enqueues a hop at an incremented depth; an
    /// absent neighbor reflects `force * wall` into the opposite side at
    /// the *same* depth (a reflection does not cost a hop). The depth
    /// counter is local to a task and shared by both of its branches, so
    /// the second branch of a task whose first branch hopped runs one
    /// level deeper. Tasks deeper than 1 are dropped, which bounds the
    /// traversal to two rings around the origin.
    fn spread(&mut self, origin: usize, force: f32, atte: SpreadAttenuation) {
        let mut work = VecDeque::new();
        work.push_back(SpreadTask {
            target: origin,
            force,
            deep: 1,
        });

        while let Some(task) = work.pop_front() {
            let SpreadTask {
                target,
                force,
                mut deep,
            } = task;
            if deep > 1 {
                continue;
            }
            let left = self.points[target].left;
            let right = self.points[target].right;

            match left {
                Some(l) => {
                    self.points[l].velocity += force * atte.second;
                    deep += 1;
                    work.push_back(SpreadTask {
                        target: l,
                        force: self.points[l].velocity,
                        deep,
                    });
                }
                None => {
                    if let Some(r) = right {
                        work.push_back(SpreadTask {
                            target: r,
                            force: force * atte.wall,
                            deep,
                        });
                    }
                }
            }

            match right {
                Some(r) => {
                    self.points[r].velocity += force * atte.second;
                    deep += 1;
                    work.push_back(SpreadTask {
                        target: r,
                        force: self.points[r].velocity,
                        deep,
                    });
                }
                None => {
                    if let Some(l) = left {
                        work.push_back(SpreadTask {
                            target: l,
                            force: force * atte.wall,
                            deep,
                        });
                    }
                }
            }
        }
    }

    /// Recompute the ambient offset for every point at wall-clock `time`.
    pub fn apply_turbulence(&mut self, time: f32, scale: f32) {
        for (i, point) in self.points.iter_mut().enumerate() {
            point.base_turbulent = base_turbulence(i, time, scale);
        }
    }

    /// One damped-spring step for every point.
    pub fn step_springs(&mut self, dt: f32, k: f32, atte: f32) {
        for point in &mut self.points {
            let f = -point.current_force * (dt * k);
            point.velocity += f;
            point.velocity = point.velocity.lerp(0.0, (dt * atte).clamp(0.0, 1.0));
            point.current_force += point.velocity;
        }
    }

    /// Write displaced positions into `vertices` at each point's
    /// `vertex_index`. Only Y moves.
    pub fn write_positions(&self, vertices: &mut [[f32; 3]]) {
        for point in &self.points {
            if let Some(v) = vertices.get_mut(point.vertex_index) {
                let displaced = point.base_position + Vec3::Y * point.final_force();
                *v = displaced.to_array();
            }
        }
    }

    /// Index of the point whose world-space rest position is closest to
    /// `target`. First minimum wins on ties. `None` for an empty chain.
    pub fn nearest_point(&self, to_world: &GlobalTransform, target: Vec3) -> Option<usize> {
        let mut best = None;
        let mut best_distance = f32::MAX;
        for (i, point) in self.points.iter().enumerate() {
            let world = to_world.affine().transform_point3(point.base_position);
            let distance = world.distance(target);
            if distance < best_distance {
                best_distance = distance;
                best = Some(i);
            }
        }
        best
    }
}

/// Ambient surface motion for chain slot `index` at wall-clock `time`.
/// Pure in `(index, time, scale)`; carries no state across frames.
pub fn base_turbulence(index: usize, time: f32, scale: f32) -> f32 {
    let i = index as f32;
    ((i + 2.0 + time * 6.0).cos() * 0.002 + (i * 3.0 + time * 9.0).sin() * 0.003) * scale
}
