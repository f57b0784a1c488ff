use bevy::prelude::*;

pub mod mass_point;
pub mod surface;
pub mod systems;

pub mod debug;

pub use mass_point::{MassPointChain, SpreadAttenuation, base_turbulence};
pub use surface::{InteractArea, WaterSettings, WaterSurface};
pub use systems::EffectPoint;

use systems::{
    CursorWorld, RainTimer, exit_on_esc_or_q_if_native, move_droplets, rain_droplets,
    resolve_effect_points, spawn_droplet_on_click, spawn_water_scene, step_water_surfaces,
    update_cursor_world, update_interact_areas,
};

/// Plug this into your App with `.add_plugins(WaterPlugin)`.
pub struct WaterPlugin;

impl Plugin for WaterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CursorWorld>()
            .init_resource::<RainTimer>()
            .add_systems(Startup, spawn_water_scene)
            // Demo input and droplet motion; droplets move before the
            // resolver scans them so a frame's hit uses fresh positions.
            .add_systems(
                Update,
                (
                    update_cursor_world,
                    spawn_droplet_on_click,
                    rain_droplets,
                    move_droplets,
                    exit_on_esc_or_q_if_native,
                    debug::draw_water_gizmos,
                ),
            )
            // Frame order: area refresh -> effect point resolution ->
            // spread / turbulence / springs / mesh write-back.
            .add_systems(
                Update,
                (
                    update_interact_areas,
                    resolve_effect_points,
                    step_water_surfaces,
                )
                    .chain()
                    .after(move_droplets),
            );
    }
}
