use bevy::prelude::*;
use bevy::mesh::{Indices, Mesh, PrimitiveTopology};
use tracing::debug;

use super::mass_point::{MassPointChain, SpreadAttenuation};

/// Tuning knobs for one water surface. Defaults are the calm-pond values
/// the simulation was tuned around; all of them are externally settable
/// and none are validated at runtime.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterSettings {
    /// Surface extent in local units (width, height).
    pub size: Vec2,
    /// Number of horizontal segments in the generated plane mesh; the
    /// simulated top edge has `segments + 1` chain points.
    pub segments: usize,
    /// Height of the strip around the top edge in which effect points are
    /// recognized, in local units.
    pub interactable_range: f32,
    /// Scale of the ambient turbulence offset.
    pub base_turbulent_scale: f32,
    /// Hooke's-law stiffness.
    pub stiffness_k: f32,
    /// Velocity damping toward rest, per second.
    pub attenuation: f32,
    /// First-neighbor spread attenuation. Exposed for tuning parity with
    /// the second/wall factors; the propagation pass currently only
    /// consults those two.
    pub spread_atte: f32,
    /// Per-hop spread attenuation.
    pub spread_atte_second: f32,
    /// Attenuation applied when an impulse reflects off a chain end.
    pub spread_atte_wall: f32,
    /// Skip the frame step while the surface is not visible to any camera.
    pub cull_when_invisible: bool,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            size: Vec2::ONE,
            segments: 20,
            interactable_range: 0.2,
            base_turbulent_scale: 1.0,
            stiffness_k: 39.0,
            attenuation: 10.0,
            spread_atte: 0.8,
            spread_atte_second: 0.31,
            spread_atte_wall: 0.8,
            cull_when_invisible: true,
        }
    }
}

impl WaterSettings {
    pub fn spread_attenuation(&self) -> SpreadAttenuation {
        SpreadAttenuation {
            second: self.spread_atte_second,
            wall: self.spread_atte_wall,
        }
    }
}

/// World-space rectangle in which effect points are recognized. Fully
/// derived from the surface transform; recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct InteractArea {
    pub min: Vec2,
    pub max: Vec2,
}

impl InteractArea {
    /// Strip spanning the full scaled width, `range * scale.y` tall,
    /// vertically centered on the scaled top edge of the surface.
    pub fn from_surface(position: Vec3, scale: Vec3, size: Vec2, range: f32) -> Self {
        let x0 = position.x;
        let x1 = position.x + size.x * scale.x;
        let top = position.y + size.y * scale.y;
        let half = range * scale.y * 0.5;
        Self {
            min: Vec2::new(x0.min(x1), (top - half).min(top + half)),
            max: Vec2::new(x0.max(x1), (top - half).max(top + half)),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// CPU-side mesh data for the water plane: two rows of `segments + 1`
/// vertices, with the top row's color alpha ramping upward in chain order.
pub struct WaterMeshData {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    /// Top-edge vertex indices in chain order (ascending x).
    pub top_edge: Vec<usize>,
}

impl WaterMeshData {
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

/// Generate the plane strip. Local origin is the bottom-left corner, +x
/// rightward, +y upward. Only the top row carries a positive color alpha,
/// ramping from 0.1 to 1.0 left to right, so a chain rebuilt from the
/// color channel matches `top_edge`.
pub fn generate_plane(size: Vec2, segments: usize) -> WaterMeshData {
    let segments = segments.max(1);
    let cols = segments + 1;
    let w = size.x / segments as f32;

    let mut positions = Vec::with_capacity(cols * 2);
    let mut uvs = Vec::with_capacity(cols * 2);
    for row in 0..2 {
        for col in 0..cols {
            positions.push([col as f32 * w, row as f32 * size.y, 0.0]);
            uvs.push([col as f32 / segments as f32, row as f32]);
        }
    }

    let mut indices = Vec::with_capacity(segments * 6);
    for i in 0..segments as u32 {
        let bottom = i;
        let top = i + cols as u32;
        // Two CCW triangles per segment, facing +z.
        indices.extend_from_slice(&[bottom, bottom + 1, top + 1]);
        indices.extend_from_slice(&[bottom, top + 1, top]);
    }

    let dim = Vec4::new(0.1, 0.1, 0.1, 0.1);
    let bright = Vec4::ONE;
    let mut colors = vec![[0.0; 4]; cols * 2];
    let mut top_edge = Vec::with_capacity(cols);
    for col in 0..cols {
        let vertex = cols + col;
        colors[vertex] = dim.lerp(bright, col as f32 / (cols - 1) as f32).to_array();
        top_edge.push(vertex);
    }

    WaterMeshData {
        positions,
        uvs,
        colors,
        indices,
        top_edge,
    }
}

/// One simulated water surface: the mass-point chain, the cached vertex
/// buffer the integrator writes into, and the current interaction area.
#[derive(Component)]
pub struct WaterSurface {
    pub settings: WaterSettings,
    chain: MassPointChain,
    vertices: Vec<[f32; 3]>,
    area: InteractArea,
}

impl WaterSurface {
    /// Build a surface from generated mesh data, chaining the top edge via
    /// the explicit index list.
    pub fn new(settings: WaterSettings, mesh: &WaterMeshData) -> Self {
        let chain =
            MassPointChain::from_ordered_indices(&mesh.positions, mesh.top_edge.iter().copied());
        Self {
            settings,
            chain,
            vertices: mesh.positions.clone(),
            area: InteractArea::default(),
        }
    }

    /// Build a surface from an existing vertex/color pair, deriving chain
    /// membership and order from the color alpha channel.
    pub fn from_vertex_colors(
        settings: WaterSettings,
        positions: &[[f32; 3]],
        colors: &[[f32; 4]],
    ) -> Self {
        let chain = MassPointChain::from_vertex_colors(positions, colors);
        Self {
            settings,
            chain,
            vertices: positions.to_vec(),
            area: InteractArea::default(),
        }
    }

    pub fn chain(&self) -> &MassPointChain {
        &self.chain
    }

    /// Mutable chain access for host code that injects impulses directly
    /// instead of going through effect points.
    pub fn chain_mut(&mut self) -> &mut MassPointChain {
        &mut self.chain
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn area(&self) -> InteractArea {
        self.area
    }

    /// Refresh the interaction area from the surface's world transform.
    pub fn update_area(&mut self, transform: &GlobalTransform) {
        let (scale, _, translation) = transform.to_scale_rotation_translation();
        self.area = InteractArea::from_surface(
            translation,
            scale,
            self.settings.size,
            self.settings.interactable_range,
        );
    }

    /// Resolve one effect point against the current area.
    ///
    /// Entering the area while `interacting` is false injects the point's
    /// force into the velocity of the nearest chain point (by rest
    /// position in world space) and latches the flag; the flag clears only
    /// once the point leaves the area again. Returns the chain index hit.
    pub fn interact(
        &mut self,
        transform: &GlobalTransform,
        position: Vec3,
        force: f32,
        interacting: &mut bool,
    ) -> Option<usize> {
        if !self.area.contains(position.truncate()) {
            *interacting = false;
            return None;
        }
        if *interacting {
            return None;
        }
        *interacting = true;

        self.inject_nearest(transform, position, force)
    }

    /// Set the velocity of the chain point nearest to `position` (by rest
    /// position in world space) to `force`. Returns the chain index hit;
    /// `None` on an empty chain.
    pub fn inject_nearest(
        &mut self,
        transform: &GlobalTransform,
        position: Vec3,
        force: f32,
    ) -> Option<usize> {
        let hit = self.chain.nearest_point(transform, position);
        if let Some(i) = hit {
            if let Some(point) = self.chain.point_mut(i) {
                point.velocity = force;
                debug!(chain_index = i, force, "effect point hit water surface");
            }
        }
        hit
    }

    /// Advance one frame: spread pending impulses, refresh turbulence,
    /// integrate the springs, and write the displaced vertex buffer.
    /// Each stage runs over the whole chain before the next begins.
    pub fn step(&mut self, dt: f32, time: f32) {
        if self.chain.is_empty() {
            return;
        }
        self.chain.propagate(self.settings.spread_attenuation());
        self.chain
            .apply_turbulence(time, self.settings.base_turbulent_scale);
        self.chain
            .step_springs(dt, self.settings.stiffness_k, self.settings.attenuation);
        self.chain.write_positions(&mut self.vertices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_surface() -> WaterSurface {
        let settings = WaterSettings {
            size: Vec2::new(4.0, 1.0),
            segments: 4,
            interactable_range: 0.5,
            base_turbulent_scale: 0.0,
            ..Default::default()
        };
        let mesh = generate_plane(settings.size, settings.segments);
        WaterSurface::new(settings, &mesh)
    }

    #[test]
    fn plane_has_two_rows_and_ramped_top_alpha() {
        let data = generate_plane(Vec2::new(2.0, 1.0), 4);
        assert_eq!(data.positions.len(), 10);
        assert_eq!(data.indices.len(), 24);
        assert_eq!(data.top_edge, vec![5, 6, 7, 8, 9]);

        for col in 0..5 {
            assert_eq!(data.colors[col][3], 0.0);
            assert!(data.colors[5 + col][3] > 0.0);
        }
        for pair in data.colors[5..].windows(2) {
            assert!(pair[0][3] < pair[1][3]);
        }
        // The ramp covers its endpoints.
        assert_eq!(data.colors[5][3], 0.1);
        assert_eq!(data.colors[9][3], 1.0);
    }

    #[test]
    fn chain_rebuilt_from_colors_matches_explicit_order() {
        let data = generate_plane(Vec2::new(2.0, 1.0), 6);
        let from_colors = MassPointChain::from_vertex_colors(&data.positions, &data.colors);
        let explicit =
            MassPointChain::from_ordered_indices(&data.positions, data.top_edge.iter().copied());
        assert_eq!(from_colors.len(), explicit.len());
        for (a, b) in from_colors.points().iter().zip(explicit.points()) {
            assert_eq!(a.vertex_index, b.vertex_index);
        }
    }

    #[test]
    fn area_is_centered_on_the_scaled_top_edge() {
        let area = InteractArea::from_surface(
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, 3.0, 1.0),
            Vec2::new(4.0, 1.0),
            0.5,
        );
        assert_eq!(area.min, Vec2::new(1.0, 5.0 - 0.75));
        assert_eq!(area.max, Vec2::new(9.0, 5.0 + 0.75));

        // Inclusive bounds.
        assert!(area.contains(Vec2::new(1.0, 4.25)));
        assert!(area.contains(Vec2::new(9.0, 5.75)));
        assert!(!area.contains(Vec2::new(9.01, 5.0)));
    }

    #[test]
    fn area_normalizes_negative_scale() {
        let area = InteractArea::from_surface(
            Vec3::ZERO,
            Vec3::new(-1.0, 1.0, 1.0),
            Vec2::new(4.0, 1.0),
            0.2,
        );
        assert_eq!(area.min.x, -4.0);
        assert_eq!(area.max.x, 0.0);
    }

    #[test]
    fn effect_point_triggers_once_per_entry() {
        let mut surface = test_surface();
        let transform = GlobalTransform::IDENTITY;
        surface.update_area(&transform);

        let mut interacting = false;
        // Top edge sits at y = 1; aim just above the third chain point.
        let inside = Vec3::new(2.1, 1.1, 0.0);
        let hit = surface.interact(&transform, inside, -5.0, &mut interacting);
        assert_eq!(hit, Some(2));
        assert!(interacting);
        assert_eq!(surface.chain().points()[2].velocity, -5.0);

        // Still inside: latched, no re-trigger even closer to another point.
        let hit = surface.interact(&transform, Vec3::new(3.0, 1.1, 0.0), -5.0, &mut interacting);
        assert_eq!(hit, None);
        assert_eq!(surface.chain().points()[3].velocity, 0.0);

        // Leaving clears the latch; re-entering triggers again.
        let outside = Vec3::new(2.0, 3.0, 0.0);
        assert_eq!(surface.interact(&transform, outside, -5.0, &mut interacting), None);
        assert!(!interacting);
        let hit = surface.interact(&transform, inside, -2.0, &mut interacting);
        assert_eq!(hit, Some(2));
        assert_eq!(surface.chain().points()[2].velocity, -2.0);
    }

    #[test]
    fn empty_surface_interacts_and_steps_without_fault() {
        let settings = WaterSettings::default();
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let colors = vec![[0.0; 4]; 2];
        let mut surface = WaterSurface::from_vertex_colors(settings, &positions, &colors);
        let transform = GlobalTransform::IDENTITY;
        surface.update_area(&transform);

        let mut interacting = false;
        let inside = Vec3::new(0.5, 1.0, 0.0);
        assert_eq!(surface.interact(&transform, inside, 3.0, &mut interacting), None);
        // The flag still latches so the point re-arms on exit like any other.
        assert!(interacting);

        let before = surface.vertices().to_vec();
        surface.step(1.0 / 60.0, 0.5);
        assert_eq!(surface.vertices(), &before[..]);
    }

    #[test]
    fn calm_surface_with_zero_turbulence_stays_at_rest() {
        let mut surface = test_surface();
        let before = surface.vertices().to_vec();
        for frame in 0..60 {
            surface.step(1.0 / 60.0, frame as f32 / 60.0);
        }
        assert_eq!(surface.vertices(), &before[..]);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn settings_round_trip_through_json() {
        let settings = WaterSettings {
            stiffness_k: 21.0,
            segments: 8,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: WaterSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stiffness_k, 21.0);
        assert_eq!(back.segments, 8);
        assert_eq!(back.spread_atte_second, settings.spread_atte_second);
    }

    #[test]
    fn injected_velocity_displaces_and_settles() {
        let mut surface = test_surface();
        let transform = GlobalTransform::IDENTITY;
        surface.update_area(&transform);

        let mut interacting = false;
        surface.interact(&transform, Vec3::new(2.0, 1.0, 0.0), 0.4, &mut interacting);

        let dt = 1.0 / 60.0;
        surface.step(dt, 0.0);
        let displaced = surface.vertices()[surface.chain().points()[2].vertex_index][1];
        assert!(displaced > 1.0);

        for frame in 1..1200 {
            surface.step(dt, frame as f32 * dt);
        }
        for point in surface.chain().points() {
            assert!(point.current_force.abs() < 1e-3);
        }
    }
}
