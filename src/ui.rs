use bevy::diagnostic::{DiagnosticsStore, EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::orbit::{Orrery, Playback, SPEED_FACTOR_MAX, SPEED_FACTOR_MIN, SPEED_FACTOR_STEP};
use crate::registry::BodyRegistry;

#[derive(Resource)]
pub struct PanelVisibility {
    pub help: bool,
    pub diagnostics: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            help: true,
            diagnostics: false,
        }
    }
}

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<PanelVisibility>()
            .add_systems(Update, (controls_panel, help_panel, diagnostics_panel));
    }
}

pub fn speed_label(name: &str, factor: f32) -> String {
    format!("{name} Speed: {factor:.1}×")
}

/// Exactly one of the two affordances is offered at a time.
pub fn playback_button_label(playback: Playback) -> &'static str {
    match playback {
        Playback::Running => "Pause",
        Playback::Paused => "Resume",
    }
}

fn controls_panel(
    mut contexts: EguiContexts,
    mut orrery: ResMut<Orrery>,
    mut playback: ResMut<Playback>,
    registry: Res<BodyRegistry>,
    diagnostics: Res<DiagnosticsStore>,
) {
    egui::Window::new("Controls").show(contexts.ctx_mut(), |ui| {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        ui.label(format!("Sim Rate: {:.2}x", orrery.global_scale()));

        ui.separator();

        if ui.button(playback_button_label(*playback)).clicked() {
            let changed = if playback.is_paused() {
                playback.resume()
            } else {
                playback.pause()
            };
            if changed {
                info!("animation {:?}", *playback);
            }
        }

        ui.separator();

        for descriptor in registry.iter() {
            let mut factor = orrery.speed_factor(descriptor.name).unwrap_or(1.0);
            ui.label(speed_label(descriptor.name, factor));
            let slider = egui::Slider::new(&mut factor, SPEED_FACTOR_MIN..=SPEED_FACTOR_MAX)
                .step_by(SPEED_FACTOR_STEP)
                .show_value(false);
            if ui.add(slider).changed() {
                if let Err(err) = orrery.set_speed_factor(descriptor.name, factor) {
                    warn!("ignoring speed change: {err}");
                }
            }
        }
    });
}

fn help_panel(mut contexts: EguiContexts, visibility: Res<PanelVisibility>) {
    if visibility.help {
        egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
            ui.label("Space: Pause / Resume");
            ui.label("R: Reset Speeds");
            ui.label("H: Toggle Help");
            ui.label("F3: Toggle Diagnostics");
        });
    }
}

fn diagnostics_panel(
    mut contexts: EguiContexts,
    visibility: Res<PanelVisibility>,
    diagnostics: Res<DiagnosticsStore>,
) {
    if visibility.diagnostics {
        egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
            if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
                if let Some(value) = fps.smoothed() {
                    ui.label(format!("FPS: {:.1}", value));
                }
            }
            if let Some(entity_count) = diagnostics.get(&EntityCountDiagnosticsPlugin::ENTITY_COUNT)
            {
                if let Some(value) = entity_count.value() {
                    ui.label(format!("Entities: {}", value));
                }
            }
        });
    }
}
