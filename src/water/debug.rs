use bevy::prelude::*;

use crate::config::DRAW_GIZMOS;
use super::surface::WaterSurface;

/// Outline each surface's rest rectangle and its interaction strip.
pub fn draw_water_gizmos(
    mut gizmos: Gizmos,
    surfaces: Query<(&GlobalTransform, &WaterSurface)>,
) {
    if !DRAW_GIZMOS {
        return;
    }
    for (transform, surface) in &surfaces {
        let (scale, _, translation) = transform.to_scale_rotation_translation();
        let extent = surface.settings.size * scale.truncate();
        let center = translation.truncate() + extent * 0.5;
        gizmos.rect_2d(
            Isometry2d::from_translation(center),
            extent,
            Color::srgba(1.0, 1.0, 1.0, 0.25),
        );

        let area = surface.area();
        gizmos.rect_2d(
            Isometry2d::from_translation((area.min + area.max) * 0.5),
            area.max - area.min,
            Color::srgba(0.2, 0.4, 1.0, 0.6),
        );
    }
}
