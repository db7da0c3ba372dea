use bevy::prelude::*;

use crate::orbit::{Orrery, Playback};
use crate::ui::PanelVisibility;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (pause_toggle, reset_speeds, help_toggle, diagnostics_toggle),
        );
    }
}

fn pause_toggle(mut playback: ResMut<Playback>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        playback.toggle();
        info!("animation {:?}", *playback);
    }
}

fn reset_speeds(mut orrery: ResMut<Orrery>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        orrery.reset_speed_factors();
        info!("speed factors reset");
    }
}

fn help_toggle(mut visibility: ResMut<PanelVisibility>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        visibility.help = !visibility.help;
    }
}

fn diagnostics_toggle(mut visibility: ResMut<PanelVisibility>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        visibility.diagnostics = !visibility.diagnostics;
    }
}
