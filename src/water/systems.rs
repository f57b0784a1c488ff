use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::RngExt;

use crate::config::*;
use super::surface::{WaterSettings, WaterSurface, generate_plane};

/// An external trigger that injects velocity into the nearest chain point
/// when it enters a surface's interaction area. Position comes from the
/// entity's `GlobalTransform`; `interacting` belongs to the resolver and
/// latches while the point stays inside the area.
#[derive(Component, Clone, Copy, Debug)]
pub struct EffectPoint {
    pub force: f32,
    pub interacting: bool,
}

impl EffectPoint {
    pub fn new(force: f32) -> Self {
        Self {
            force,
            interacting: false,
        }
    }
}

/// Demo projectile: falls under gravity until it leaves the screen.
#[derive(Component, Clone, Copy, Debug)]
pub struct Droplet {
    pub velocity: Vec2,
}

/// Shared render handles for droplets.
#[derive(Resource)]
pub struct DropletAssets {
    mesh: Handle<Mesh>,
    material: Handle<ColorMaterial>,
}

#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct CursorWorld(pub Vec2);

/// Ambient rain spawner clock.
#[derive(Resource)]
pub struct RainTimer(pub Timer);

impl Default for RainTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(RAIN_INTERVAL, TimerMode::Repeating))
    }
}

/// Spawn the camera, the water surface, and the droplet render assets.
pub fn spawn_water_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.spawn(Camera2d);

    let settings = WaterSettings {
        size: SURFACE_SIZE,
        segments: SURFACE_SEGMENTS,
        interactable_range: INTERACTABLE_RANGE,
        base_turbulent_scale: BASE_TURBULENT_SCALE,
        ..Default::default()
    };
    let data = generate_plane(settings.size, settings.segments);
    let surface = WaterSurface::new(settings, &data);

    let mesh = meshes.add(data.into_mesh());
    let material = materials.add(Color::srgb(0.15, 0.45, 0.8));
    commands.spawn((
        surface,
        Mesh2d(mesh),
        MeshMaterial2d(material),
        Transform::from_xyz(SURFACE_POS.x, SURFACE_POS.y, 0.0),
    ));

    commands.insert_resource(DropletAssets {
        mesh: meshes.add(Circle::new(DROPLET_RADIUS)),
        material: materials.add(Color::srgb(0.7, 0.85, 1.0)),
    });
}

/// Native-only quit: press Esc or Q to exit the app. (No-op on wasm32.)
pub fn exit_on_esc_or_q_if_native(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if cfg!(not(target_arch = "wasm32")) {
        if keys.any_just_pressed([KeyCode::Escape, KeyCode::KeyQ]) {
            exit.write(AppExit::Success);
        }
    }
}

/// Update the cursor's world position each frame (2D camera).
pub fn update_cursor_world(
    windows: Query<&Window, With<PrimaryWindow>>,
    q_cam: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mut cursor: ResMut<CursorWorld>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    if let Some(screen_pos) = window.cursor_position() {
        if let Ok((camera, cam_xform)) = q_cam.single() {
            if let Ok(world_pos) = camera.viewport_to_world_2d(cam_xform, screen_pos) {
                cursor.0 = world_pos;
            }
        }
    }
}

fn spawn_droplet(commands: &mut Commands, assets: &DropletAssets, position: Vec2) {
    commands.spawn((
        Droplet { velocity: Vec2::ZERO },
        EffectPoint::new(DROPLET_FORCE),
        Mesh2d(assets.mesh.clone()),
        MeshMaterial2d(assets.material.clone()),
        Transform::from_xyz(position.x, position.y, 1.0),
    ));
}

/// Left click drops a droplet at the cursor.
pub fn spawn_droplet_on_click(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    cursor: Res<CursorWorld>,
    assets: Res<DropletAssets>,
) {
    if buttons.just_pressed(MouseButton::Left) {
        spawn_droplet(&mut commands, &assets, cursor.0);
    }
}

/// Ambient rain: a droplet at a random x above the surface on each tick.
pub fn rain_droplets(
    mut commands: Commands,
    time: Res<Time>,
    mut timer: ResMut<RainTimer>,
    assets: Res<DropletAssets>,
) {
    if timer.0.tick(time.delta()).just_finished() {
        let mut rng = rand::rng();
        let x = SURFACE_POS.x + rng.random_range(0.0..SURFACE_SIZE.x);
        spawn_droplet(&mut commands, &assets, Vec2::new(x, RAIN_SPAWN_Y));
    }
}

/// Integrate droplet motion and cull droplets that sank out of view.
pub fn move_droplets(
    mut commands: Commands,
    time: Res<Time>,
    mut droplets: Query<(Entity, &mut Droplet, &mut Transform)>,
) {
    let dt = time.delta_secs();
    for (entity, mut droplet, mut transform) in &mut droplets {
        droplet.velocity.y += DROPLET_GRAVITY * dt;
        transform.translation.x += droplet.velocity.x * dt;
        transform.translation.y += droplet.velocity.y * dt;
        if transform.translation.y < DROPLET_DESPAWN_Y {
            commands.entity(entity).despawn();
        }
    }
}

/// Recompute every surface's interaction area from its world transform.
pub fn update_interact_areas(mut surfaces: Query<(&GlobalTransform, &mut WaterSurface)>) {
    for (transform, mut surface) in &mut surfaces {
        surface.update_area(transform);
    }
}

/// Scan all effect points against every surface's interaction area,
/// injecting velocity on entry.
///
/// The `interacting` latch is shared by all surfaces, so containment is
/// resolved across surfaces per point: the latch clears only once no
/// surface contains the point. Surfaces culled for invisibility neither
/// trigger nor hold the latch.
pub fn resolve_effect_points(
    mut surfaces: Query<(&GlobalTransform, &mut WaterSurface, Option<&ViewVisibility>)>,
    mut points: Query<(&GlobalTransform, &mut EffectPoint)>,
) {
    for (point_tf, mut point) in &mut points {
        let position = point_tf.translation();
        let mut inside_any = false;
        for (surface_tf, mut surface, visibility) in &mut surfaces {
            if surface.settings.cull_when_invisible && visibility.is_some_and(|v| !v.get()) {
                continue;
            }
            if !surface.area().contains(position.truncate()) {
                continue;
            }
            inside_any = true;
            if !point.interacting {
                surface.inject_nearest(surface_tf, position, point.force);
            }
        }
        point.interacting = inside_any;
    }
}

/// Advance every visible surface one frame and commit the displaced
/// vertex buffer to its mesh in a single attribute replace.
pub fn step_water_surfaces(
    time: Res<Time>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut surfaces: Query<(&mut WaterSurface, &Mesh2d, &ViewVisibility)>,
) {
    let dt = time.delta_secs();
    let elapsed = time.elapsed_secs();
    for (mut surface, mesh2d, visibility) in &mut surfaces {
        if surface.settings.cull_when_invisible && !visibility.get() {
            continue;
        }
        surface.step(dt, elapsed);
        if let Some(mesh) = meshes.get_mut(&mesh2d.0) {
            mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, surface.vertices().to_vec());
        }
    }
}
