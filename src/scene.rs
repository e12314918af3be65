use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use std::f32::consts::PI;

use crate::engine::Simulation;
use crate::field::DiffusionField;
use crate::oscillator::DOMAIN_SIZE;
use crate::state::SimState;

const NODE_HEIGHT: f32 = 0.5;
const NODE_RADIUS: f32 = 0.25;

// --- Components ---

/// Anything torn down on rebuild.
#[derive(Component)]
pub struct SceneEntity;

#[derive(Component)]
pub struct NetworkRoot;

#[derive(Component, Debug, Clone, Copy)]
pub struct OscillatorVisual {
    pub index: usize,
}

// --- Resources ---

#[derive(Resource, Default)]
pub struct FieldTexture {
    pub image: Handle<Image>,
    pub material: Handle<StandardMaterial>,
}

// --- Systems ---

pub fn spawn_scene_system(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut state: ResMut<SimState>,
    mut sim: ResMut<Simulation>,
    mut field_texture: ResMut<FieldTexture>,
    query: Query<Entity, With<SceneEntity>>,
) {
    if !state.rebuild_requested {
        return;
    }

    // 1. Cleanup
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }

    info!(
        "Rebuilding oscillator network with {} nodes...",
        state.node_count
    );

    // 2. Fresh world
    *sim = Simulation::from_state(&state);

    // 3. Background field
    let side = state.grid_size.max(1) as u32;
    let image = Image::new_fill(
        Extent3d {
            width: side,
            height: side,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        bevy::asset::RenderAssetUsages::RENDER_WORLD | bevy::asset::RenderAssetUsages::MAIN_WORLD,
    );
    let image_handle = images.add(image);
    let field_material = materials.add(StandardMaterial {
        base_color_texture: Some(image_handle.clone()),
        unlit: true,
        cull_mode: None,
        ..default()
    });

    commands.spawn((
        SceneEntity,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(DOMAIN_SIZE, DOMAIN_SIZE))),
        MeshMaterial3d(field_material.clone()),
        Transform::default(),
    ));
    field_texture.image = image_handle;
    field_texture.material = field_material;

    // 4. Oscillator nodes
    let sphere = meshes.add(Sphere::new(NODE_RADIUS));
    commands
        .spawn((
            SceneEntity,
            NetworkRoot,
            Transform::default(),
            Visibility::default(),
        ))
        .with_children(|parent| {
            for (index, site) in sim.network.positions().iter().enumerate() {
                parent
                    .spawn((
                        Mesh3d(sphere.clone()),
                        MeshMaterial3d(materials.add(StandardMaterial {
                            base_color: Color::BLACK,
                            metallic: 0.1,
                            perceptual_roughness: 0.8,
                            ..default()
                        })),
                        Transform::from_xyz(site.x, NODE_HEIGHT, site.y),
                        OscillatorVisual { index },
                    ))
                    .observe(on_click_kick);
            }
        });

    info!("Spawned {} oscillator nodes.", sim.network.len());
    state.rebuild_requested = false;
}

pub fn render_sync_system(
    sim: Res<Simulation>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut query: Query<(
        &OscillatorVisual,
        &mut Transform,
        &MeshMaterial3d<StandardMaterial>,
    )>,
) {
    for (visual, mut transform, mat_handle) in query.iter_mut() {
        let Some(node) = sim.network.visual(visual.index) else {
            continue;
        };
        transform.scale = Vec3::splat(node.scale);

        if let Some(mat) = materials.get_mut(&mat_handle.0) {
            let color = Color::hsl(node.hue, 0.85, 0.55);
            let linear = color.to_linear();
            mat.base_color = color;
            mat.emissive = LinearRgba::new(linear.red, linear.green, linear.blue, node.intensity * 2.0);
        }
    }
}

pub fn field_texture_system(
    sim: Res<Simulation>,
    field_texture: Res<FieldTexture>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(image) = images.get_mut(&field_texture.image) else {
        return;
    };
    let texels = field_rgba(&sim.field);
    if image.data.as_ref().is_some_and(|d| d.len() == texels.len()) {
        image.data = Some(texels);
        // Re-bind so the material samples the new texels.
        let _ = materials.get_mut(&field_texture.material);
    }
}

pub fn rotation_system(
    time: Res<Time>,
    state: Res<SimState>,
    mut roots: Query<&mut Transform, With<NetworkRoot>>,
) {
    for mut transform in roots.iter_mut() {
        transform.rotate_y(state.rotation_speed * time.delta_secs());
    }
}

pub fn edge_gizmo_system(
    sim: Res<Simulation>,
    roots: Query<&GlobalTransform, With<NetworkRoot>>,
    mut gizmos: Gizmos,
) {
    let Ok(root) = roots.single() else {
        return;
    };
    let sites = sim.network.positions();
    for (target, source) in sim.network.graph().edges() {
        let (Some(a), Some(b)) = (sites.get(target), sites.get(source)) else {
            continue;
        };
        gizmos.line(
            root.transform_point(Vec3::new(a.x, NODE_HEIGHT, a.y)),
            root.transform_point(Vec3::new(b.x, NODE_HEIGHT, b.y)),
            Color::srgba(1.0, 1.0, 1.0, 0.08),
        );
    }
}

pub fn on_click_kick(
    trigger: On<Pointer<Press>>,
    query: Query<&OscillatorVisual>,
    mut sim: ResMut<Simulation>,
) {
    if let Ok(visual) = query.get(trigger.original_event_target()) {
        sim.network.kick(visual.index, PI);
        info!("Kicked oscillator {}", visual.index);
    }
}

// --- Colour mapping ---

const FIELD_STOPS: [[f32; 3]; 3] = [[0.0, 0.0, 4.0], [183.0, 55.0, 121.0], [252.0, 253.0, 191.0]];

/// Magma-like ramp for a field value in `[0, 1]`.
pub fn field_color(value: f32) -> [u8; 4] {
    let v = value.clamp(0.0, 1.0) * 2.0;
    let (lo, hi, t) = if v < 1.0 {
        (FIELD_STOPS[0], FIELD_STOPS[1], v)
    } else {
        (FIELD_STOPS[1], FIELD_STOPS[2], v - 1.0)
    };
    let mix = |i: usize| (lo[i] + (hi[i] - lo[i]) * t).round() as u8;
    [mix(0), mix(1), mix(2), 255]
}

pub fn field_rgba(field: &DiffusionField) -> Vec<u8> {
    field.cells().iter().flat_map(|&v| field_color(v)).collect()
}
