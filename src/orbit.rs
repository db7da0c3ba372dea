//! Orbit state and the per-frame animation step.
//!
//! Everything here is plain data so the stepping logic can be driven without
//! an `App`; the bevy systems at the bottom only forward `Time` and copy the
//! results onto transforms.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::config::OrreryConfig;
use crate::error::OrreryError;
use crate::registry::BodyDescriptor;

pub const SPEED_FACTOR_MIN: f32 = 0.0;
pub const SPEED_FACTOR_MAX: f32 = 5.0;
pub const SPEED_FACTOR_STEP: f64 = 0.1;

/// Pause state shared between the control panel and the scheduler.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Playback {
    #[default]
    Running,
    Paused,
}

impl Playback {
    /// Returns `true` if the state changed.
    pub fn pause(&mut self) -> bool {
        let changed = *self == Playback::Running;
        *self = Playback::Paused;
        changed
    }

    pub fn resume(&mut self) -> bool {
        let changed = *self == Playback::Paused;
        *self = Playback::Running;
        changed
    }

    pub fn toggle(&mut self) {
        match *self {
            Playback::Running => self.pause(),
            Playback::Paused => self.resume(),
        };
    }

    pub fn is_paused(&self) -> bool {
        *self == Playback::Paused
    }
}

/// Entities making up one body's scene subtree:
/// pivot → carrier → (globe, ring).
///
/// The carrier holds the orbital position and the globe holds axial spin, so a
/// ring parented to the carrier keeps its tilt while the planet turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyVisual {
    pub pivot: Entity,
    pub carrier: Entity,
    pub globe: Entity,
    pub ring: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyState {
    pub descriptor: &'static BodyDescriptor,
    /// Radians, kept in `[0, 2π)`.
    pub current_angle: f32,
    pub speed_factor: f32,
    /// Radians, kept in `[0, 2π)`.
    pub spin: f32,
    pub position: Vec3,
    pub visual: Option<BodyVisual>,
}

impl BodyState {
    pub fn new(descriptor: &'static BodyDescriptor, initial_angle: f32) -> Self {
        Self {
            descriptor,
            current_angle: initial_angle.rem_euclid(TAU),
            speed_factor: 1.0,
            spin: 0.0,
            position: orbit_position(initial_angle, descriptor.orbit_distance),
            visual: None,
        }
    }

    pub fn with_visual(mut self, visual: BodyVisual) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Angle advanced over `dt` seconds at the current speed factor.
    pub fn angular_step(&self, dt: f32, global_scale: f32) -> f32 {
        self.descriptor.base_angular_speed * self.speed_factor * dt * global_scale
    }

    // Wrapped each frame: an unbounded f32 angle rounds away part of every step.
    fn advance(&mut self, dt: f32, global_scale: f32, spin_step: f32) {
        let step = self.angular_step(dt, global_scale);
        self.current_angle = (self.current_angle + step).rem_euclid(TAU);
        self.position = orbit_position(self.current_angle, self.descriptor.orbit_distance);
        self.spin = (self.spin + spin_step).rem_euclid(TAU);
    }
}

/// Point on a circle of radius `distance` in the X-Z plane.
pub fn orbit_position(angle: f32, distance: f32) -> Vec3 {
    Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
}

/// Every live body, in registry order.
#[derive(Resource, Debug, Clone)]
pub struct Orrery {
    bodies: Vec<BodyState>,
    global_scale: f32,
    spin_step: f32,
}

impl Default for Orrery {
    fn default() -> Self {
        Self::from_config(&OrreryConfig::default())
    }
}

impl Orrery {
    pub fn new(global_scale: f32, spin_step: f32) -> Self {
        Self {
            bodies: Vec::new(),
            global_scale,
            spin_step,
        }
    }

    pub fn from_config(config: &OrreryConfig) -> Self {
        Self::new(config.global_scale, config.spin_step)
    }

    pub fn push(&mut self, body: BodyState) {
        self.bodies.push(body);
    }

    pub fn bodies(&self) -> &[BodyState] {
        &self.bodies
    }

    pub fn body(&self, name: &str) -> Option<&BodyState> {
        self.bodies.iter().find(|b| b.name() == name)
    }

    pub fn global_scale(&self) -> f32 {
        self.global_scale
    }

    /// One animation frame. Returns `false` without touching any body while paused.
    pub fn tick(&mut self, playback: Playback, dt: f32) -> bool {
        if playback.is_paused() {
            return false;
        }
        for body in &mut self.bodies {
            body.advance(dt, self.global_scale, self.spin_step);
        }
        true
    }

    pub fn speed_factor(&self, name: &str) -> Option<f32> {
        self.body(name).map(|b| b.speed_factor)
    }

    /// Overwrites one body's speed factor, clamped to the slider range.
    pub fn set_speed_factor(&mut self, name: &str, value: f32) -> Result<f32, OrreryError> {
        if !value.is_finite() {
            return Err(OrreryError::InvalidSpeedFactor {
                name: name.to_owned(),
                value,
            });
        }
        let body = self
            .bodies
            .iter_mut()
            .find(|b| b.descriptor.name == name)
            .ok_or_else(|| OrreryError::UnknownBody(name.to_owned()))?;
        body.speed_factor = value.clamp(SPEED_FACTOR_MIN, SPEED_FACTOR_MAX);
        Ok(body.speed_factor)
    }

    pub fn reset_speed_factors(&mut self) {
        for body in &mut self.bodies {
            body.speed_factor = 1.0;
        }
    }
}

pub struct OrbitPlugin;
impl Plugin for OrbitPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Playback>()
            .init_resource::<Orrery>()
            .add_systems(Update, (advance_orbits, sync_body_transforms).chain());
    }
}

fn advance_orbits(mut orrery: ResMut<Orrery>, playback: Res<Playback>, time: Res<Time>) {
    orrery.tick(*playback, time.delta_seconds());
}

pub(crate) fn sync_body_transforms(orrery: Res<Orrery>, mut transforms: Query<&mut Transform>) {
    if !orrery.is_changed() {
        return;
    }
    for body in orrery.bodies() {
        let Some(visual) = body.visual else {
            continue;
        };
        if let Ok(mut t) = transforms.get_mut(visual.carrier) {
            t.translation = body.position;
        }
        if let Ok(mut t) = transforms.get_mut(visual.globe) {
            t.rotation = Quat::from_rotation_y(body.spin);
        }
    }
}
