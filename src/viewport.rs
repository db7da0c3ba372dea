use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::MainCamera;

/// Last known size of the primary window, in logical pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
        }
    }
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// Records a new size. Degenerate sizes (minimized windows) are ignored and
    /// return `None`; otherwise the new aspect ratio is returned.
    pub fn on_resize(&mut self, width: f32, height: f32) -> Option<f32> {
        if !(width > 0.0 && height > 0.0) {
            return None;
        }
        self.width = width;
        self.height = height;
        Some(self.aspect_ratio())
    }
}

pub struct ViewportPlugin;
impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>()
            .add_systems(Startup, capture_initial_size)
            .add_systems(Update, handle_resize);
    }
}

fn capture_initial_size(mut viewport: ResMut<Viewport>, windows: Query<&Window, With<PrimaryWindow>>) {
    if let Ok(window) = windows.get_single() {
        viewport.on_resize(window.width(), window.height());
    }
}

/// bevy's `camera_system` also rewrites the aspect ratio from the window's
/// physical size in `PostUpdate` and stays authoritative; this mirrors it from
/// `Viewport` so both agree within the frame the event arrives.
fn handle_resize(
    mut resized: EventReader<WindowResized>,
    mut viewport: ResMut<Viewport>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
) {
    let Some(ev) = resized.read().last() else {
        return;
    };
    let Some(aspect) = viewport.on_resize(ev.width, ev.height) else {
        return;
    };
    debug!("viewport resized to {}x{}", ev.width, ev.height);
    for mut projection in &mut cameras {
        if let Projection::Perspective(p) = &mut *projection {
            p.aspect_ratio = aspect;
        }
    }
}
