use bevy::core_pipeline::bloom::BloomSettings;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::diagnostic::{EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use orrery::config::OrreryConfig;
use orrery::input::InputPlugin;
use orrery::orbit::OrbitPlugin;
use orrery::registry::{BodyRegistry, PLANETS};
use orrery::scene::ScenePlugin;
use orrery::ui::UiPlugin;
use orrery::viewport::ViewportPlugin;
use orrery::MainCamera;

fn main() -> AppExit {
    let config_path = OrreryConfig::default_path();
    let (config, config_error) = match OrreryConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (OrreryConfig::default(), Some(err)),
    };

    let mut app = App::new();
    app.insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(EntityCountDiagnosticsPlugin)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: config.window_title.clone(),
                        resolution: (config.window_width, config.window_height).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: config.log_filter.clone(),
                    ..default()
                }),
        );

    if let Some(err) = config_error {
        warn!("{}: {err}; using defaults", config_path.display());
    }

    let registry = match BodyRegistry::new(&PLANETS) {
        Ok(registry) => registry,
        Err(err) => {
            error!("invalid body catalog: {err}");
            return AppExit::error();
        }
    };

    app.insert_resource(config)
        .insert_resource(registry)
        .add_plugins((OrbitPlugin, ScenePlugin, UiPlugin, InputPlugin, ViewportPlugin))
        .add_systems(Startup, setup_camera)
        .run()
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera3dBundle {
            camera: Camera {
                hdr: true,
                ..default()
            },
            tonemapping: Tonemapping::AcesFitted,
            projection: PerspectiveProjection {
                fov: 50f32.to_radians(),
                near: 0.1,
                far: 2000.0,
                ..default()
            }
            .into(),
            transform: Transform::from_xyz(0.0, 80.0, 140.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        BloomSettings::NATURAL,
        MainCamera,
    ));
}
