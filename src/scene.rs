use std::f32::consts::TAU;

use bevy::asset::LoadState;
use bevy::pbr::{ExtendedMaterial, MaterialExtension, NotShadowCaster};
use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderRef, ShaderType};
use bevy::render::texture::{ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::OrreryConfig;
use crate::geometry::{
    dashed_circle, line_list_mesh, point_cloud_mesh, ring_mesh, ring_rotation, starfield_points,
    RING_INNER_SCALE, RING_OUTER_SCALE, RING_SEGMENTS,
};
use crate::orbit::{BodyState, BodyVisual, Orrery};
use crate::registry::{BodyDescriptor, BodyRegistry, SUN_RADIUS, SUN_TEXTURE};

const SPHERE_SEGMENTS: usize = 64;
const ORBIT_GUIDE_COLOR: Color = Color::srgba(0.533, 0.533, 0.533, 0.45);
const RING_OPACITY: f32 = 0.9;
const RING_ALPHA_CUTOFF: f32 = 0.5;
const RING_SHADER: &str = "shaders/ring_cutout.wgsl";
/// Emissive multiplier on the sun texture; above 1.0 so bloom picks it up.
const SUN_GLOW: f32 = 2.5;

/// Where surface maps come from. Loads are fire-and-forget: the handle is
/// usable immediately and the image arrives later.
pub trait TextureSource {
    fn surface_texture(&self, path: String) -> Handle<Image>;
}

impl TextureSource for AssetServer {
    fn surface_texture(&self, path: String) -> Handle<Image> {
        self.load_with_settings(path, |settings: &mut ImageLoaderSettings| {
            settings.is_srgb = true;
            settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
                anisotropy_clamp: 16,
                ..ImageSamplerDescriptor::linear()
            });
        })
    }
}

#[derive(Component)]
pub struct Sun;

#[derive(Component)]
pub struct Starfield;

#[derive(Component)]
pub struct OrbitGuide;

#[derive(Component)]
pub struct Globe;

#[derive(Component)]
pub struct PlanetRing;

#[derive(ShaderType, Reflect, Debug, Clone, Copy, PartialEq)]
pub struct RingCutoutParams {
    pub cutoff: f32,
    pub opacity: f32,
}

/// Uniform opacity followed by an alpha test, which `StandardMaterial`
/// cannot do in one alpha mode.
#[derive(Asset, AsBindGroup, Reflect, Debug, Clone)]
pub struct RingCutout {
    #[uniform(100)]
    pub params: RingCutoutParams,
}

impl MaterialExtension for RingCutout {
    fn fragment_shader() -> ShaderRef {
        RING_SHADER.into()
    }
}

pub type RingMaterial = ExtendedMaterial<StandardMaterial, RingCutout>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSlot {
    BaseColor,
    Emissive,
    Depth,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PendingMaterial {
    Standard(Handle<StandardMaterial>),
    Ring(Handle<RingMaterial>),
}

#[derive(Debug, Clone)]
pub struct PendingTexture {
    pub material: PendingMaterial,
    pub texture: Handle<Image>,
    pub slot: TextureSlot,
}

/// Textures still in flight. A failed load is stripped from its material so
/// the body keeps rendering, just untextured.
#[derive(Resource, Default, Debug)]
pub struct PendingTextures(pub Vec<PendingTexture>);

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn initial_phase(rng: &mut impl Rng) -> f32 {
    rng.gen_range(0.0..TAU)
}

pub fn bump_scale(descriptor: &BodyDescriptor, config: &OrreryConfig) -> f32 {
    descriptor.bump_scale.unwrap_or(config.default_bump_scale)
}

pub fn surface_material(
    texture: Handle<Image>,
    bump: Option<(Handle<Image>, f32)>,
) -> StandardMaterial {
    let mut material = StandardMaterial {
        base_color_texture: Some(texture),
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..default()
    };
    if let Some((height_map, scale)) = bump {
        material.depth_map = Some(height_map);
        material.parallax_depth_scale = scale;
    }
    material
}

pub fn ring_material(texture: Handle<Image>) -> RingMaterial {
    RingMaterial {
        base: StandardMaterial {
            base_color_texture: Some(texture),
            alpha_mode: AlphaMode::Blend,
            double_sided: true,
            cull_mode: None,
            perceptual_roughness: 1.0,
            metallic: 0.0,
            ..default()
        },
        extension: RingCutout {
            params: RingCutoutParams {
                cutoff: RING_ALPHA_CUTOFF,
                opacity: RING_OPACITY,
            },
        },
    }
}

pub fn orbit_guide_material() -> StandardMaterial {
    StandardMaterial {
        base_color: ORBIT_GUIDE_COLOR,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    }
}

/// The sun takes no light; its texture is emitted instead.
pub fn sun_material(texture: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::BLACK,
        emissive: LinearRgba::rgb(SUN_GLOW, SUN_GLOW, SUN_GLOW),
        emissive_texture: Some(texture),
        perceptual_roughness: 1.0,
        reflectance: 0.0,
        ..default()
    }
}

fn strip_texture(material: &mut StandardMaterial, slot: TextureSlot) {
    match slot {
        TextureSlot::BaseColor => material.base_color_texture = None,
        TextureSlot::Emissive => material.emissive_texture = None,
        TextureSlot::Depth => material.depth_map = None,
    }
}

/// Borrowed world access used while building the scene at startup.
pub struct SceneBuilder<'a, 'w, 's, T: TextureSource + ?Sized> {
    pub commands: &'a mut Commands<'w, 's>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
    pub ring_materials: &'a mut Assets<RingMaterial>,
    pub textures: &'a T,
    pub config: &'a OrreryConfig,
    pub pending: Vec<PendingTexture>,
}

impl<'a, 'w, 's, T: TextureSource + ?Sized> SceneBuilder<'a, 'w, 's, T> {
    fn texture(&self, file: &str) -> Handle<Image> {
        self.textures.surface_texture(self.config.texture_path(file))
    }

    fn track(&mut self, material: PendingMaterial, textures: &[(Handle<Image>, TextureSlot)]) {
        for (texture, slot) in textures {
            self.pending.push(PendingTexture {
                material: material.clone(),
                texture: texture.clone(),
                slot: *slot,
            });
        }
    }

    fn add_material(
        &mut self,
        material: StandardMaterial,
        textures: &[(Handle<Image>, TextureSlot)],
    ) -> Handle<StandardMaterial> {
        let handle = self.materials.add(material);
        self.track(PendingMaterial::Standard(handle.clone()), textures);
        handle
    }

    pub fn compose_sun(&mut self) -> Entity {
        let texture = self.texture(SUN_TEXTURE);
        let material =
            self.add_material(sun_material(texture.clone()), &[(texture, TextureSlot::Emissive)]);
        let mesh = self
            .meshes
            .add(Sphere::new(SUN_RADIUS).mesh().uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS));
        self.commands
            .spawn((
                PbrBundle {
                    mesh,
                    material,
                    ..default()
                },
                NotShadowCaster,
                Sun,
                Name::new("Sun"),
            ))
            .id()
    }

    pub fn compose_lights(&mut self) {
        self.commands.spawn((
            PointLightBundle {
                point_light: PointLight {
                    color: Color::WHITE,
                    intensity: 60_000_000.0,
                    range: 5000.0,
                    radius: SUN_RADIUS,
                    shadows_enabled: false,
                    ..default()
                },
                ..default()
            },
            Name::new("Sunlight"),
        ));
        self.commands.insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 120.0,
        });
    }

    pub fn compose_starfield(&mut self, rng: &mut impl Rng, count: usize) -> Entity {
        let points = starfield_points(rng, count, self.config.star_extent);
        let mesh = self.meshes.add(point_cloud_mesh(&points));
        let material = self.materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            ..default()
        });
        debug!("starfield: {} points", points.len());
        self.commands
            .spawn((
                PbrBundle {
                    mesh,
                    material,
                    ..default()
                },
                NotShadowCaster,
                Starfield,
                Name::new("Starfield"),
            ))
            .id()
    }

    pub fn compose_orbit_guide(&mut self, radius: f32) -> Entity {
        let pieces = dashed_circle(
            radius,
            self.config.orbit_samples,
            self.config.dash_size,
            self.config.gap_size,
        );
        let mesh = self.meshes.add(line_list_mesh(&pieces));
        let material = self.materials.add(orbit_guide_material());
        self.commands
            .spawn((
                PbrBundle {
                    mesh,
                    material,
                    ..default()
                },
                NotShadowCaster,
                OrbitGuide,
                Name::new(format!("Orbit r={radius}")),
            ))
            .id()
    }

    /// Spawns pivot → carrier → globe (+ ring) for one body and returns its live state.
    pub fn compose_body(
        &mut self,
        descriptor: &'static BodyDescriptor,
        initial_angle: f32,
    ) -> BodyState {
        let mut textures = Vec::new();
        let base = self.texture(descriptor.texture);
        textures.push((base.clone(), TextureSlot::BaseColor));

        let mut globe_mesh = Sphere::new(descriptor.radius)
            .mesh()
            .uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        let mut bump = None;
        if let Some(bump_file) = descriptor.bump_texture {
            match globe_mesh.clone().with_generated_tangents() {
                Ok(with_tangents) => {
                    globe_mesh = with_tangents;
                    let height_map = self.texture(bump_file);
                    textures.push((height_map.clone(), TextureSlot::Depth));
                    bump = Some((height_map, bump_scale(descriptor, self.config)));
                }
                Err(err) => warn!("{}: skipping bump map, no tangents: {err}", descriptor.name),
            }
        }

        let material = self.add_material(surface_material(base, bump), &textures);
        let state = BodyState::new(descriptor, initial_angle);

        let globe = self
            .commands
            .spawn((
                PbrBundle {
                    mesh: self.meshes.add(globe_mesh),
                    material,
                    ..default()
                },
                Globe,
                Name::new(descriptor.name),
            ))
            .id();

        let ring = descriptor.ring_texture.map(|ring_file| {
            let texture = self.texture(ring_file);
            let material = self.ring_materials.add(ring_material(texture.clone()));
            self.track(
                PendingMaterial::Ring(material.clone()),
                &[(texture, TextureSlot::BaseColor)],
            );
            let mesh = self.meshes.add(ring_mesh(
                descriptor.radius * RING_INNER_SCALE,
                descriptor.radius * RING_OUTER_SCALE,
                RING_SEGMENTS,
            ));
            self.commands
                .spawn((
                    MaterialMeshBundle::<RingMaterial> {
                        mesh,
                        material,
                        transform: Transform::from_rotation(ring_rotation()),
                        ..default()
                    },
                    NotShadowCaster,
                    PlanetRing,
                    Name::new(format!("{} ring", descriptor.name)),
                ))
                .id()
        });

        let carrier = self
            .commands
            .spawn((
                SpatialBundle::from_transform(Transform::from_translation(state.position)),
                Name::new(format!("{} carrier", descriptor.name)),
            ))
            .add_child(globe)
            .id();
        if let Some(ring) = ring {
            self.commands.entity(carrier).add_child(ring);
        }

        let pivot = self
            .commands
            .spawn((
                SpatialBundle::default(),
                Name::new(format!("{} pivot", descriptor.name)),
            ))
            .add_child(carrier)
            .id();

        state.with_visual(BodyVisual {
            pivot,
            carrier,
            globe,
            ring,
        })
    }
}

pub struct ScenePlugin;
impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<RingMaterial>::default())
            .init_resource::<PendingTextures>()
            .add_systems(Startup, compose_scene)
            .add_systems(Update, settle_textures);
    }
}

fn compose_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ring_materials: ResMut<Assets<RingMaterial>>,
    asset_server: Res<AssetServer>,
    config: Res<OrreryConfig>,
    registry: Res<BodyRegistry>,
    mut pending: ResMut<PendingTextures>,
) {
    let mut rng = seeded_rng(config.seed);
    let mut builder = SceneBuilder {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
        ring_materials: &mut ring_materials,
        textures: &*asset_server,
        config: &config,
        pending: Vec::new(),
    };

    builder.compose_lights();
    builder.compose_sun();
    builder.compose_starfield(&mut rng, config.star_count);

    let mut orrery = Orrery::from_config(&config);
    for descriptor in registry.iter() {
        builder.compose_orbit_guide(descriptor.orbit_distance);
        let phase = initial_phase(&mut rng);
        orrery.push(builder.compose_body(descriptor, phase));
    }

    pending.0.append(&mut builder.pending);
    info!(
        "composed {} bodies, {} textures loading",
        orrery.bodies().len(),
        pending.0.len()
    );
    commands.insert_resource(orrery);
}

fn settle_textures(
    mut pending: ResMut<PendingTextures>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ring_materials: ResMut<Assets<RingMaterial>>,
    asset_server: Res<AssetServer>,
) {
    if pending.0.is_empty() {
        return;
    }
    pending.0.retain(|entry| match asset_server.load_state(entry.texture.id()) {
        LoadState::Loaded => false,
        LoadState::Failed(_) => {
            let path = entry
                .texture
                .path()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "<unnamed>".into());
            warn!("texture {path} failed to load, rendering untextured");
            match &entry.material {
                PendingMaterial::Standard(handle) => {
                    if let Some(material) = materials.get_mut(handle) {
                        strip_texture(material, entry.slot);
                    }
                }
                PendingMaterial::Ring(handle) => {
                    if let Some(material) = ring_materials.get_mut(handle) {
                        strip_texture(&mut material.base, entry.slot);
                    }
                }
            }
            false
        }
        _ => true,
    });
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bevy::ecs::system::RunSystemOnce;
    use bevy::ecs::world::CommandQueue;

    use super::*;
    use crate::orbit::{orbit_position, sync_body_transforms, Playback};
    use crate::registry::PLANETS;

    /// Hands out placeholder handles and remembers what was asked for.
    #[derive(Default)]
    struct RecordingTextures {
        requested: RefCell<Vec<String>>,
    }

    impl TextureSource for RecordingTextures {
        fn surface_texture(&self, path: String) -> Handle<Image> {
            self.requested.borrow_mut().push(path);
            Handle::default()
        }
    }

    struct Composed {
        world: World,
        state: BodyState,
        pending: Vec<PendingTexture>,
        requested: Vec<String>,
    }

    fn compose(descriptor: &'static BodyDescriptor, initial_angle: f32) -> Composed {
        let mut world = World::new();
        let mut queue = CommandQueue::default();
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let mut ring_materials = Assets::<RingMaterial>::default();
        let textures = RecordingTextures::default();
        let config = OrreryConfig::default();

        let (state, pending) = {
            let mut commands = Commands::new(&mut queue, &world);
            let mut builder = SceneBuilder {
                commands: &mut commands,
                meshes: &mut meshes,
                materials: &mut materials,
                ring_materials: &mut ring_materials,
                textures: &textures,
                config: &config,
                pending: Vec::new(),
            };
            let state = builder.compose_body(descriptor, initial_angle);
            (state, builder.pending)
        };
        queue.apply(&mut world);

        Composed {
            world,
            state,
            pending,
            requested: textures.requested.into_inner(),
        }
    }

    fn parent_of(world: &World, entity: Entity) -> Option<Entity> {
        world.get::<Parent>(entity).map(|p| p.get())
    }

    #[test]
    fn initial_phases_cover_a_full_turn() {
        let mut rng = seeded_rng(Some(11));
        let phases: Vec<f32> = (0..256).map(|_| initial_phase(&mut rng)).collect();
        assert!(phases.iter().all(|p| (0.0..TAU).contains(p)));
        assert!(phases.iter().any(|p| *p < 1.0));
        assert!(phases.iter().any(|p| *p > TAU - 1.0));
    }

    #[test]
    fn same_seed_same_phases() {
        let a: Vec<f32> = {
            let mut rng = seeded_rng(Some(5));
            (0..8).map(|_| initial_phase(&mut rng)).collect()
        };
        let b: Vec<f32> = {
            let mut rng = seeded_rng(Some(5));
            (0..8).map(|_| initial_phase(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn bump_scale_defaults_from_config() {
        static BUMPY: BodyDescriptor =
            BodyDescriptor::planet("Bumpy", 1.0, 5.0, 1.0, "b.jpg").with_bump("b_bump.jpg", None);
        static CRAGGY: BodyDescriptor = BodyDescriptor::planet("Craggy", 1.0, 5.0, 1.0, "c.jpg")
            .with_bump("c_bump.jpg", Some(0.2));

        let config = OrreryConfig::default();
        assert_eq!(bump_scale(&BUMPY, &config), 0.03);
        assert_eq!(bump_scale(&CRAGGY, &config), 0.2);
    }

    #[test]
    fn surface_material_applies_height_map_only_when_given() {
        let plain = surface_material(Handle::default(), None);
        assert!(plain.base_color_texture.is_some());
        assert!(plain.depth_map.is_none());
        assert_eq!(plain.perceptual_roughness, 1.0);
        assert_eq!(plain.metallic, 0.0);

        let bumped = surface_material(Handle::default(), Some((Handle::default(), 0.03)));
        assert!(bumped.depth_map.is_some());
        assert_eq!(bumped.parallax_depth_scale, 0.03);
    }

    #[test]
    fn ring_material_is_double_sided_blended_and_cut_out() {
        let ring = ring_material(Handle::default());
        assert!(ring.base.double_sided);
        assert!(ring.base.cull_mode.is_none());
        assert_eq!(ring.base.alpha_mode, AlphaMode::Blend);
        assert!(ring.base.base_color_texture.is_some());
        assert_eq!(
            ring.extension.params,
            RingCutoutParams {
                cutoff: 0.5,
                opacity: 0.9
            }
        );
    }

    #[test]
    fn sun_glows_from_its_texture() {
        let sun = sun_material(Handle::default());
        assert!(sun.emissive_texture.is_some());
        assert!(sun.emissive.red > 1.0 && sun.emissive.green > 1.0 && sun.emissive.blue > 1.0);
        assert_eq!(sun.base_color, Color::BLACK);

        let mut failed = sun.clone();
        strip_texture(&mut failed, TextureSlot::Emissive);
        assert!(failed.emissive_texture.is_none());
        assert_eq!(failed.emissive, sun.emissive);
    }

    #[test]
    fn ringed_body_builds_pivot_carrier_globe_tree() {
        let saturn = &PLANETS[5];
        let Composed {
            world,
            state,
            pending,
            requested,
        } = compose(saturn, 1.2);

        assert_eq!(state.name(), "Saturn");
        assert_eq!(state.speed_factor, 1.0);
        assert_eq!(state.current_angle, 1.2);
        let visual = state.visual.unwrap();
        let ring = visual.ring.unwrap();

        assert_eq!(parent_of(&world, visual.pivot), None);
        assert_eq!(parent_of(&world, visual.carrier), Some(visual.pivot));
        assert_eq!(parent_of(&world, visual.globe), Some(visual.carrier));
        assert_eq!(parent_of(&world, ring), Some(visual.carrier));
        let children = world.get::<Children>(visual.carrier).unwrap();
        assert!(children.contains(&visual.globe));
        assert!(children.contains(&ring));
        assert!(world.get::<Children>(visual.globe).is_none());

        let pivot = world.get::<Transform>(visual.pivot).unwrap();
        assert_eq!(*pivot, Transform::IDENTITY);
        let carrier = world.get::<Transform>(visual.carrier).unwrap();
        assert_eq!(carrier.translation, orbit_position(1.2, 43.0));
        assert_eq!(world.get::<Transform>(ring).unwrap().rotation, ring_rotation());
        assert!(world.get::<PlanetRing>(ring).is_some());
        assert!(world.get::<Globe>(visual.globe).is_some());

        assert_eq!(requested, ["textures/saturn.jpg", "textures/saturn_ring.png"]);
        assert_eq!(pending.len(), 2);
        assert!(matches!(pending[0].material, PendingMaterial::Standard(_)));
        assert_eq!(pending[0].slot, TextureSlot::BaseColor);
        assert!(matches!(pending[1].material, PendingMaterial::Ring(_)));
        assert_eq!(pending[1].slot, TextureSlot::BaseColor);
    }

    #[test]
    fn plain_body_has_no_ring_and_one_texture() {
        let earth = &PLANETS[2];
        let composed = compose(earth, 0.0);
        let visual = composed.state.visual.unwrap();
        assert!(visual.ring.is_none());
        assert_eq!(composed.pending.len(), 1);
        assert_eq!(composed.requested, ["textures/earth.jpg"]);
        let children = composed.world.get::<Children>(visual.carrier).unwrap();
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn sync_spins_globe_but_not_ring() {
        let Composed {
            mut world, state, ..
        } = compose(&PLANETS[5], 0.4);
        let visual = state.visual.unwrap();
        let ring = visual.ring.unwrap();

        let mut orrery = Orrery::new(0.5, 0.02);
        orrery.push(state);
        for _ in 0..5 {
            orrery.tick(Playback::Running, 0.5);
        }
        let body = orrery.body("Saturn").unwrap().clone();
        world.insert_resource(orrery);

        world.run_system_once(sync_body_transforms);

        let carrier = world.get::<Transform>(visual.carrier).unwrap();
        assert_eq!(carrier.translation, body.position);
        let globe = world.get::<Transform>(visual.globe).unwrap();
        assert_eq!(globe.rotation, Quat::from_rotation_y(body.spin));
        assert_ne!(globe.rotation, Quat::IDENTITY);
        assert_eq!(world.get::<Transform>(ring).unwrap().rotation, ring_rotation());
        let pivot = world.get::<Transform>(visual.pivot).unwrap();
        assert_eq!(*pivot, Transform::IDENTITY);
    }

    #[test]
    fn catalog_has_no_bump_maps_by_default() {
        assert!(PLANETS.iter().all(|p| p.bump_texture.is_none()));
    }
}
