use bevy::prelude::*;

use ripple2d::water::WaterPlugin;

fn main() {
    App::new()
        // Night-sky backdrop behind the water
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.06)))
        .add_plugins(DefaultPlugins)
        .add_plugins(WaterPlugin)
        .run();
}
