use std::collections::HashSet;

use bevy::prelude::*;

use crate::error::RegistryError;

/// One catalog entry. Distances and radii are scene units, not astronomical ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    pub name: &'static str,
    pub radius: f32,
    pub orbit_distance: f32,
    /// Radians per second before the speed factor and global scale apply.
    pub base_angular_speed: f32,
    pub texture: &'static str,
    pub ring_texture: Option<&'static str>,
    pub bump_texture: Option<&'static str>,
    /// Falls back to `OrreryConfig::default_bump_scale` when unset.
    pub bump_scale: Option<f32>,
}

impl BodyDescriptor {
    pub const fn planet(
        name: &'static str,
        radius: f32,
        orbit_distance: f32,
        base_angular_speed: f32,
        texture: &'static str,
    ) -> Self {
        Self {
            name,
            radius,
            orbit_distance,
            base_angular_speed,
            texture,
            ring_texture: None,
            bump_texture: None,
            bump_scale: None,
        }
    }

    pub const fn with_ring(mut self, ring_texture: &'static str) -> Self {
        self.ring_texture = Some(ring_texture);
        self
    }

    pub const fn with_bump(mut self, bump_texture: &'static str, scale: Option<f32>) -> Self {
        self.bump_texture = Some(bump_texture);
        self.bump_scale = scale;
        self
    }
}

pub const SUN_RADIUS: f32 = 5.0;
pub const SUN_TEXTURE: &str = "sun.jpg";

pub static PLANETS: [BodyDescriptor; 8] = [
    BodyDescriptor::planet("Mercury", 1.0, 10.0, 4.15, "mercury.jpg"),
    BodyDescriptor::planet("Venus", 1.2, 15.0, 1.62, "venus.jpg"),
    BodyDescriptor::planet("Earth", 1.3, 20.0, 1.00, "earth.jpg"),
    BodyDescriptor::planet("Mars", 1.1, 25.0, 0.53, "mars.jpg"),
    BodyDescriptor::planet("Jupiter", 3.5, 34.0, 0.084, "jupiter.jpg"),
    BodyDescriptor::planet("Saturn", 3.0, 43.0, 0.034, "saturn.jpg").with_ring("saturn_ring.png"),
    BodyDescriptor::planet("Uranus", 2.2, 50.0, 0.012, "uranus.jpg"),
    BodyDescriptor::planet("Neptune", 2.1, 57.0, 0.006, "neptune.jpg"),
];

/// Validated, ordered view over a static catalog. Order drives orbit draw
/// order and the slider panel layout.
#[derive(Resource, Debug, Clone, Copy)]
pub struct BodyRegistry {
    bodies: &'static [BodyDescriptor],
}

impl BodyRegistry {
    pub fn new(bodies: &'static [BodyDescriptor]) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for body in bodies {
            if !seen.insert(body.name) {
                return Err(RegistryError::DuplicateName(body.name));
            }
            if !(body.radius.is_finite() && body.radius > 0.0) {
                return Err(RegistryError::InvalidRadius {
                    name: body.name,
                    radius: body.radius,
                });
            }
            if !(body.orbit_distance.is_finite() && body.orbit_distance > 0.0) {
                return Err(RegistryError::InvalidOrbitDistance {
                    name: body.name,
                    distance: body.orbit_distance,
                });
            }
        }
        Ok(Self { bodies })
    }

    pub fn solar_system() -> Self {
        Self { bodies: &PLANETS }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static BodyDescriptor> {
        self.bodies.iter()
    }

    pub fn get(&self, name: &str) -> Option<&'static BodyDescriptor> {
        self.bodies.iter().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DUPLICATED: [BodyDescriptor; 2] = [
        BodyDescriptor::planet("Earth", 1.0, 10.0, 1.0, "earth.jpg"),
        BodyDescriptor::planet("Earth", 2.0, 20.0, 1.0, "earth.jpg"),
    ];

    static FLAT: [BodyDescriptor; 1] = [BodyDescriptor::planet("Flat", 0.0, 10.0, 1.0, "flat.jpg")];

    static HOMELESS: [BodyDescriptor; 1] =
        [BodyDescriptor::planet("Homeless", 1.0, -3.0, 1.0, "homeless.jpg")];

    #[test]
    fn builtin_catalog_is_valid() {
        let registry = BodyRegistry::new(&PLANETS).unwrap();
        assert_eq!(registry.len(), 8);
        let names: Vec<_> = registry.iter().map(|b| b.name).collect();
        assert_eq!(names.first(), Some(&"Mercury"));
        assert_eq!(names.last(), Some(&"Neptune"));
    }

    #[test]
    fn only_saturn_carries_a_ring() {
        let ringed: Vec<_> = PLANETS
            .iter()
            .filter(|b| b.ring_texture.is_some())
            .map(|b| b.name)
            .collect();
        assert_eq!(ringed, ["Saturn"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        assert_eq!(
            BodyRegistry::new(&DUPLICATED).unwrap_err(),
            RegistryError::DuplicateName("Earth")
        );
    }

    #[test]
    fn rejects_degenerate_geometry() {
        assert!(matches!(
            BodyRegistry::new(&FLAT),
            Err(RegistryError::InvalidRadius { name: "Flat", .. })
        ));
        assert!(matches!(
            BodyRegistry::new(&HOMELESS),
            Err(RegistryError::InvalidOrbitDistance { name: "Homeless", .. })
        ));
    }

    #[test]
    fn lookup_by_name() {
        let registry = BodyRegistry::solar_system();
        assert_eq!(registry.get("Mars").map(|b| b.orbit_distance), Some(25.0));
        assert!(registry.get("Pluto").is_none());
    }
}
