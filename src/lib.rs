//! Animated solar-system orrery built on bevy.
//!
//! - `registry`: the static body catalog.
//! - `orbit`: live body state, pause state and the per-frame step.
//! - `scene`: builds the sun, starfield, orbit guides and planet subtrees.
//! - `ui` / `input`: speed sliders, pause/resume and keyboard shortcuts.
//! - `viewport`: keeps the camera projection in step with the window.

use bevy::prelude::*;

pub mod config;
pub mod error;
pub mod geometry;
pub mod input;
pub mod orbit;
pub mod registry;
pub mod scene;
pub mod ui;
pub mod viewport;

#[derive(Component)]
pub struct MainCamera;
