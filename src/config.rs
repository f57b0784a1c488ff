use bevy::prelude::*;

/// Water surface placement and resolution (world units are pixels with the
/// default 2D camera).
pub const SURFACE_SIZE: Vec2 = Vec2::new(800.0, 160.0);
pub const SURFACE_SEGMENTS: usize = 40;
pub const SURFACE_POS: Vec2 = Vec2::new(-400.0, -240.0);

/// Height of the strip around the water line that recognizes droplets.
pub const INTERACTABLE_RANGE: f32 = 50.0;

/// The raw turbulence term is a few thousandths of a unit; scale it up to
/// pixel-visible calm-water motion.
pub const BASE_TURBULENT_SCALE: f32 = 600.0;

/// Droplet demo tuning.
pub const DROPLET_RADIUS: f32 = 5.0;
/// Velocity injected into the chain on impact; negative pushes the
/// surface down first.
pub const DROPLET_FORCE: f32 = -9.0;
pub const DROPLET_GRAVITY: f32 = -980.0;
pub const DROPLET_DESPAWN_Y: f32 = -520.0;

/// Ambient rain cadence and spawn height.
pub const RAIN_INTERVAL: f32 = 1.4;
pub const RAIN_SPAWN_Y: f32 = 320.0;

/// Outline the surface and its interaction strip.
pub const DRAW_GIZMOS: bool = true;
