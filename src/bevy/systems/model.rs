//! Model loading and marker decoration
//!
//! The boat is loaded once, asynchronously. When the load resolves the
//! outcome is handled exactly once: on success the model is added to the
//! scene and the two marker spheres are spawned next to it, on failure the
//! error is logged and the scene stays empty but orbitable.

use bevy::{
    asset::LoadState,
    camera::visibility::RenderLayers,
    gltf::Gltf,
    prelude::*,
};

use crate::bevy::components::{BoatModel, InteractiveMarker};
use crate::bevy::resources::{Markers, ModelLoad, ModelLoadStatus};
use crate::config::{
    layers::{INTERACTION_LAYER, MODEL_LAYER},
    markers::{MarkerSpec, GREEN, RED, SPHERE_RADIUS, SPHERE_SUBDIVISIONS},
    scene::MODEL_PATH,
};
use crate::error::ViewerError;

/// Issue the model load
pub fn start_model_load(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle: Handle<Gltf> = asset_server.load(MODEL_PATH);
    info!("Loading model {MODEL_PATH}");
    commands.insert_resource(ModelLoad::new(MODEL_PATH, handle));
}

/// Poll the pending load and handle its outcome once it resolves
pub fn resolve_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    mut load: ResMut<ModelLoad>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if load.status != ModelLoadStatus::Pending {
        return;
    }

    let outcome = match asset_server.load_state(&load.handle) {
        LoadState::Loaded => first_scene(&gltfs, &load),
        LoadState::Failed(err) => Err(ViewerError::ModelLoad {
            path: load.path.clone(),
            reason: err.to_string(),
        }),
        LoadState::NotLoaded | LoadState::Loading => return,
    };

    load.status = finish_model_load(&mut commands, &mut meshes, &mut materials, outcome);
}

fn first_scene(gltfs: &Assets<Gltf>, load: &ModelLoad) -> Result<Handle<Scene>, ViewerError> {
    let empty = || ViewerError::EmptyModel(load.path.clone());
    let gltf = gltfs.get(&load.handle).ok_or_else(empty)?;
    pick_scene(gltf.default_scene.as_ref(), &gltf.scenes).ok_or_else(empty)
}

/// The declared default scene, else the first one
fn pick_scene(
    default_scene: Option<&Handle<Scene>>,
    scenes: &[Handle<Scene>],
) -> Option<Handle<Scene>> {
    default_scene.or_else(|| scenes.first()).cloned()
}

/// Handle the load outcome: decorate the scene on success, log on failure
pub fn finish_model_load(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    outcome: Result<Handle<Scene>, ViewerError>,
) -> ModelLoadStatus {
    match outcome {
        Ok(scene) => {
            commands.spawn((SceneRoot(scene), BoatModel, Name::new("boat")));
            let markers = spawn_markers(commands, meshes, materials);
            // Hit-testing starts only now that the markers exist
            commands.insert_resource(markers);
            info!("Model {MODEL_PATH} loaded, markers placed");
            ModelLoadStatus::Loaded
        }
        Err(err) => {
            error!("{err}");
            ModelLoadStatus::Failed
        }
    }
}

/// Spawn both marker spheres on the interaction layer
pub fn spawn_markers(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Markers {
    let sphere = meshes.add(
        Sphere::new(SPHERE_RADIUS)
            .mesh()
            .uv(SPHERE_SUBDIVISIONS, SPHERE_SUBDIVISIONS),
    );

    let mut spawn = |spec: &MarkerSpec| {
        let [r, g, b] = spec.color;
        commands
            .spawn((
                Mesh3d(sphere.clone()),
                // One material per marker so highlighting one leaves the other alone
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(r, g, b),
                    emissive: LinearRgba::BLACK,
                    ..default()
                })),
                Transform::from_translation(Vec3::from(spec.position))
                    .with_scale(Vec3::splat(spec.scale)),
                RenderLayers::layer(INTERACTION_LAYER),
                InteractiveMarker {
                    radius: SPHERE_RADIUS * spec.scale,
                },
                Name::new(spec.name),
            ))
            .id()
    };

    Markers {
        green: spawn(&GREEN),
        red: spawn(&RED),
    }
}

/// Put every mesh under the model root on the model layer
///
/// Scene instances spawn their children a few frames after the root, so
/// this runs every frame and only touches meshes that are still untagged.
pub fn tag_model_meshes(
    mut commands: Commands,
    models: Query<Entity, With<BoatModel>>,
    children: Query<&Children>,
    untagged: Query<(), (With<Mesh3d>, Without<RenderLayers>)>,
) {
    for root in &models {
        for entity in children.iter_descendants(root) {
            if untagged.contains(entity) {
                commands
                    .entity(entity)
                    .insert(RenderLayers::layer(MODEL_LAYER));
            }
        }
    }
}
