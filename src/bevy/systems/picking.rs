//! Pointer hover over the marker spheres
//!
//! Each pointer move is mapped to normalized device coordinates, turned into
//! a camera ray and tested against entities on the interaction layer. The
//! nearest marker hit gets a yellow emissive highlight; the previous one gets
//! back the exact emissive color it had before.

use bevy::{
    camera::visibility::RenderLayers,
    math::bounding::{BoundingSphere, RayCast3d},
    prelude::*,
};

use crate::bevy::components::{CameraController, InteractiveMarker};
use crate::bevy::resources::{HoverState, HoveredMarker, PendingPointer};
use crate::config::{layers::INTERACTION_LAYER, markers::HIGHLIGHT_EMISSIVE};
use crate::tauri_bridge::shared_state::PointerSample;

/// Map client coordinates into [-1, 1] NDC against the surface's live
/// bounding box. Top-left is (-1, 1), bottom-right is (1, -1).
pub fn pointer_to_ndc(sample: &PointerSample) -> Option<Vec2> {
    let rect = &sample.rect;
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        (sample.client_x - rect.left) / rect.width * 2.0 - 1.0,
        -((sample.client_y - rect.top) / rect.height) * 2.0 + 1.0,
    ))
}

/// Ray from the camera through an NDC point
pub fn ray_from_ndc(
    ndc: Vec2,
    camera: &Transform,
    projection: &PerspectiveProjection,
) -> Option<Ray3d> {
    let half_height = (projection.fov * 0.5).tan();
    let view_direction = Vec3::new(
        ndc.x * half_height * projection.aspect_ratio,
        ndc.y * half_height,
        -1.0,
    );
    let direction = Dir3::new(camera.rotation * view_direction).ok()?;
    Some(Ray3d::new(camera.translation, direction))
}

/// Nearest candidate on the interaction layer hit by `ray`
pub fn nearest_hit<'a>(
    ray: Ray3d,
    candidates: impl IntoIterator<Item = (Entity, &'a Transform, &'a InteractiveMarker, &'a RenderLayers)>,
) -> Option<Entity> {
    let interaction = RenderLayers::layer(INTERACTION_LAYER);
    let cast = RayCast3d::from_ray(ray, f32::MAX);

    candidates
        .into_iter()
        .filter(|(_, _, _, layers)| layers.intersects(&interaction))
        .filter_map(|(entity, transform, marker, _)| {
            let sphere = BoundingSphere::new(transform.translation, marker.radius);
            cast.sphere_intersection_at(&sphere)
                .map(|distance| (entity, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// What a new hit-test result means for the highlight
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoverChange {
    /// Nothing hovered before or now, or the same marker is still hovered
    Unchanged,
    Enter(Entity),
    Leave(HoveredMarker),
    /// Restore `from`, then highlight `to`
    Swap { from: HoveredMarker, to: Entity },
}

impl HoverState {
    pub fn plan(&self, hit: Option<Entity>) -> HoverChange {
        match (self.hovered, hit) {
            (None, None) => HoverChange::Unchanged,
            (None, Some(to)) => HoverChange::Enter(to),
            (Some(from), None) => HoverChange::Leave(from),
            // Re-highlighting would overwrite the remembered color with yellow
            (Some(from), Some(to)) if from.entity == to => HoverChange::Unchanged,
            (Some(from), Some(to)) => HoverChange::Swap { from, to },
        }
    }
}

fn highlight_color() -> LinearRgba {
    let [r, g, b] = HIGHLIGHT_EMISSIVE;
    LinearRgba::rgb(r, g, b)
}

fn restore(
    marker: HoveredMarker,
    handles: &Query<&MeshMaterial3d<StandardMaterial>>,
    materials: &mut Assets<StandardMaterial>,
) {
    let Ok(handle) = handles.get(marker.entity) else {
        return;
    };
    if let Some(material) = materials.get_mut(&handle.0) {
        material.emissive = marker.original_emissive;
    }
}

fn highlight(
    entity: Entity,
    handles: &Query<&MeshMaterial3d<StandardMaterial>>,
    materials: &mut Assets<StandardMaterial>,
) -> Option<HoveredMarker> {
    let handle = handles.get(entity).ok()?;
    let material = materials.get_mut(&handle.0)?;
    let hovered = HoveredMarker {
        entity,
        original_emissive: material.emissive,
    };
    material.emissive = highlight_color();
    Some(hovered)
}

/// Apply a hover change to the marker materials and the hover state
pub fn apply_hover_change(
    change: HoverChange,
    state: &mut HoverState,
    handles: &Query<&MeshMaterial3d<StandardMaterial>>,
    materials: &mut Assets<StandardMaterial>,
) {
    match change {
        HoverChange::Unchanged => {}
        HoverChange::Enter(to) => {
            state.hovered = highlight(to, handles, materials);
        }
        HoverChange::Leave(from) => {
            restore(from, handles, materials);
            state.hovered = None;
        }
        HoverChange::Swap { from, to } => {
            restore(from, handles, materials);
            state.hovered = highlight(to, handles, materials);
        }
    }
}

/// Hit-test the latest pointer move against the markers
pub fn hover_markers(
    mut pending: ResMut<PendingPointer>,
    mut state: ResMut<HoverState>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    cameras: Query<(&Transform, &Projection), With<CameraController>>,
    candidates: Query<(Entity, &Transform, &InteractiveMarker, &RenderLayers)>,
    handles: Query<&MeshMaterial3d<StandardMaterial>>,
) {
    let Some(ndc) = pending.0.take() else {
        return;
    };
    let Ok((camera, Projection::Perspective(projection))) = cameras.single() else {
        return;
    };

    let hit = ray_from_ndc(ndc, camera, projection).and_then(|ray| nearest_hit(ray, &candidates));
    let change = state.plan(hit);
    if change != HoverChange::Unchanged {
        debug!("Hover change: {change:?}");
    }
    apply_hover_change(change, &mut state, &handles, &mut materials);
}
