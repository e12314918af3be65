use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use bevy_panorbit_camera::PanOrbitCameraPlugin;
use clap::Parser;
use gw_vivarium::{cli, engine, events, scene, ui};

fn main() {
    let args = cli::Args::parse();

    if args.headless {
        cli::init_tracing(args.verbose);
        if let Err(e) = cli::run_headless(&args) {
            tracing::error!("{e}");
            std::process::exit(1);
        }
        return;
    }

    let (state, catalog) = match (args.load_state(), args.load_catalog()) {
        (Ok(state), Ok(catalog)) => (state, catalog),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "GW Vivarium".into(),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            }),
            EguiPlugin::default(),
            PanOrbitCameraPlugin,
            MeshPickingPlugin,
        ))
        .insert_resource(state)
        .insert_resource(events::EventBrowser::new(catalog))
        .insert_resource(ui::ExportSettings::new(args.out_dir.clone()))
        .init_resource::<ui::ChirpPanel>()
        .init_resource::<engine::Simulation>()
        .init_resource::<scene::FieldTexture>()
        .add_systems(Startup, ui::setup_scene)
        .add_systems(EguiPrimaryContextPass, ui::ui_system)
        .add_systems(
            Update,
            (
                scene::spawn_scene_system,
                engine::simulation_tick_system,
                scene::render_sync_system,
                scene::field_texture_system,
                scene::rotation_system,
                scene::edge_gizmo_system,
            )
                .chain(),
        )
        .run();
}
