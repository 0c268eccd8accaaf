//! Scene setup system
//!
//! This module handles the initial setup of the 3D scene: the offscreen
//! render target, the camera, ambient lighting and the axis helper.

use bevy::{
    asset::Assets,
    camera::{visibility::RenderLayers, RenderTarget},
    core_pipeline::tonemapping::Tonemapping,
    image::Image,
    math::Vec3,
    prelude::*,
    render::{
        render_resource::{Extent3d, TextureFormat, TextureUsages},
        renderer::RenderDevice,
    },
};

use crate::bevy::components::{AxesHelper, CameraController};
use crate::bevy::plugins::image_copy::ImageCopier;
use crate::bevy::resources::{OrbitCameraState, RenderTargetHandle, ViewportRes};
use crate::config::{
    camera::{FAR, FOV_DEGREES, INITIAL_POSITION, NEAR},
    layers::{INTERACTION_LAYER, MODEL_LAYER},
    scene::{AMBIENT_BRIGHTNESS, AXES_LENGTH, CLEAR_COLOR},
};
use crate::tauri_bridge::shared_state::ViewportSize;

pub fn viewport_extent(size: ViewportSize) -> Extent3d {
    Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

/// Offscreen texture the camera renders into
pub fn render_target_image(size: ViewportSize) -> Image {
    let mut image = Image::new_target_texture(size.width, size.height, TextureFormat::bevy_default());
    image.texture_descriptor.usage |= TextureUsages::COPY_SRC;
    image
}

/// Perspective projection for a viewport of the given size
pub fn viewer_projection(size: ViewportSize) -> Projection {
    Projection::Perspective(PerspectiveProjection {
        fov: FOV_DEGREES.to_radians(),
        aspect_ratio: size.aspect_ratio(),
        near: NEAR,
        far: FAR,
        ..default()
    })
}

/// Create the render target texture and its GPU readback copier
pub fn setup_render_target(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    viewport: Res<ViewportRes>,
    render_device: Res<RenderDevice>,
) {
    let render_target_image_handle = images.add(render_target_image(viewport.0));

    commands.spawn(ImageCopier::new(
        render_target_image_handle.clone(),
        viewport_extent(viewport.0),
        &render_device,
    ));

    commands.insert_resource(RenderTargetHandle(render_target_image_handle));
    info!(
        "Render target created at {}x{}",
        viewport.width, viewport.height
    );
}

/// Setup the 3D scene with camera, ambient light and axis helper
pub fn setup_scene(
    mut commands: Commands,
    render_target: Res<RenderTargetHandle>,
    viewport: Res<ViewportRes>,
) {
    info!("Setting up scene...");

    let eye = Vec3::from(INITIAL_POSITION);
    let [r, g, b] = CLEAR_COLOR;

    // The camera sees every layer, markers included
    commands.spawn((
        Camera3d::default(),
        Camera {
            target: RenderTarget::Image(render_target.0.clone().into()),
            clear_color: ClearColorConfig::Custom(Color::srgb(r, g, b)),
            ..default()
        },
        viewer_projection(viewport.0),
        Tonemapping::None,
        Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y),
        RenderLayers::from_layers(&[0, MODEL_LAYER, INTERACTION_LAYER]),
        CameraController,
    ));
    commands.insert_resource(OrbitCameraState::looking_from(eye, Vec3::ZERO));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });

    commands.spawn((
        AxesHelper {
            length: AXES_LENGTH,
        },
        Transform::IDENTITY,
        Name::new("axes_helper"),
    ));

    info!("Scene setup complete!");
}

/// Draw the X/Y/Z axes of every axis helper
pub fn draw_axes_helper(mut gizmos: Gizmos, helpers: Query<(&AxesHelper, &Transform)>) {
    for (helper, transform) in &helpers {
        gizmos.axes(*transform, helper.length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn bootstrap(width: u32, height: u32) -> World {
        let mut world = World::new();
        let size = ViewportSize::new(width, height).unwrap();
        let mut images = Assets::<Image>::default();
        let handle = images.add(render_target_image(size));
        world.insert_resource(images);
        world.insert_resource(RenderTargetHandle(handle));
        world.insert_resource(ViewportRes(size));
        world.run_system_once(setup_scene).unwrap();
        world
    }

    #[test]
    fn camera_starts_at_vantage_point() {
        let mut world = bootstrap(800, 600);
        let mut cameras = world.query_filtered::<&Transform, With<CameraController>>();
        let transform = cameras.single(&world).unwrap();
        assert_eq!(transform.translation, Vec3::new(0.0, 5.0, 10.0));
    }

    #[test]
    fn aspect_matches_viewport() {
        for (width, height) in [(800, 600), (1920, 1080), (333, 777), (1, 1)] {
            let mut world = bootstrap(width, height);
            let mut cameras = world.query_filtered::<&Projection, With<CameraController>>();
            let Projection::Perspective(perspective) = cameras.single(&world).unwrap() else {
                panic!("viewer camera must use a perspective projection");
            };
            assert_eq!(perspective.aspect_ratio, width as f32 / height as f32);
            assert_eq!(perspective.near, NEAR);
            assert_eq!(perspective.far, FAR);
        }
    }

    #[test]
    fn camera_renders_all_layers() {
        let mut world = bootstrap(800, 600);
        let mut cameras = world.query_filtered::<&RenderLayers, With<CameraController>>();
        let layers = cameras.single(&world).unwrap();
        for layer in [0, MODEL_LAYER, INTERACTION_LAYER] {
            assert!(layers.intersects(&RenderLayers::layer(layer)));
        }
    }

    #[test]
    fn ambient_light_and_axes_are_present() {
        let mut world = bootstrap(800, 600);
        assert!(world.get_resource::<AmbientLight>().is_some());
        let mut helpers = world.query::<&AxesHelper>();
        let helpers: Vec<_> = helpers.iter(&world).collect();
        assert_eq!(helpers.len(), 1);
        assert_eq!(helpers[0].length, AXES_LENGTH);
    }

    #[test]
    fn render_target_matches_viewport() {
        let image = render_target_image(ViewportSize::new(640, 360).unwrap());
        assert_eq!(image.size(), UVec2::new(640, 360));
        assert!(image
            .texture_descriptor
            .usage
            .contains(TextureUsages::COPY_SRC));
    }
}
