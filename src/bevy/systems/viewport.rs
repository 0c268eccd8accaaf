//! Frontend event intake
//!
//! Pointer moves and viewport resizes queued by the Tauri commands are
//! applied here, in arrival order, at the start of every frame.

use bevy::{prelude::*, render::renderer::RenderDevice};

use crate::bevy::components::CameraController;
use crate::bevy::plugins::image_copy::ImageCopier;
use crate::bevy::resources::{
    Markers, PendingPointer, RenderTargetHandle, ViewerEventsRes, ViewportRes,
};
use crate::bevy::systems::picking::pointer_to_ndc;
use crate::bevy::systems::scene::viewport_extent;
use crate::tauri_bridge::shared_state::{ViewerEvent, ViewportSize};

/// Drain the frontend event channel
pub fn apply_viewer_events(
    mut commands: Commands,
    events: Res<ViewerEventsRes>,
    markers: Option<Res<Markers>>,
    mut pending: ResMut<PendingPointer>,
    mut viewport: ResMut<ViewportRes>,
    mut images: ResMut<Assets<Image>>,
    render_target: Res<RenderTargetHandle>,
    render_device: Option<Res<RenderDevice>>,
    mut cameras: Query<&mut Projection, With<CameraController>>,
    copiers: Query<Entity, With<ImageCopier>>,
) {
    while let Ok(event) = events.0.receiver.try_recv() {
        match event {
            // Hover only exists once the markers do
            ViewerEvent::PointerMove(sample) if markers.is_some() => {
                if let Some(ndc) = pointer_to_ndc(&sample) {
                    pending.0 = Some(ndc);
                }
            }
            ViewerEvent::PointerMove(_) => {}
            ViewerEvent::Resize(size) if size == viewport.0 => {}
            ViewerEvent::Resize(size) => {
                resize_viewport(size, &mut viewport, &mut images, &render_target, &mut cameras);

                // The readback buffer is sized per target; rebuild it
                if let Some(render_device) = &render_device {
                    for entity in &copiers {
                        commands.entity(entity).despawn();
                    }
                    commands.spawn(ImageCopier::new(
                        render_target.0.clone(),
                        viewport_extent(size),
                        render_device,
                    ));
                }
                info!("Viewport resized to {}x{}", size.width, size.height);
            }
        }
    }
}

/// Resize the render target and update the camera aspect ratio
pub fn resize_viewport(
    size: ViewportSize,
    viewport: &mut ViewportRes,
    images: &mut Assets<Image>,
    render_target: &RenderTargetHandle,
    cameras: &mut Query<&mut Projection, With<CameraController>>,
) {
    viewport.0 = size;

    // Target textures carry no CPU data, only the descriptor changes
    if let Some(image) = images.get_mut(&render_target.0) {
        image.texture_descriptor.size = viewport_extent(size);
    }

    for mut projection in cameras.iter_mut() {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.aspect_ratio = size.aspect_ratio();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bevy::systems::scene::{render_target_image, viewer_projection};
    use crate::tauri_bridge::shared_state::{PointerSample, SurfaceRect, ViewerLink};
    use bevy::ecs::system::RunSystemOnce;

    fn size(width: u32, height: u32) -> ViewportSize {
        ViewportSize::new(width, height).unwrap()
    }

    fn viewer_world() -> (World, ViewerLink) {
        let mut world = World::new();
        let initial = size(800, 600);
        let (link, events) = ViewerLink::new();
        let mut images = Assets::<Image>::default();
        let handle = images.add(render_target_image(initial));
        world.insert_resource(images);
        world.insert_resource(RenderTargetHandle(handle));
        world.insert_resource(ViewportRes(initial));
        world.insert_resource(ViewerEventsRes(events));
        world.init_resource::<PendingPointer>();
        world.spawn((viewer_projection(initial), CameraController));
        link.attach(initial).unwrap();
        (world, link)
    }

    fn aspect(world: &mut World) -> f32 {
        let mut cameras = world.query::<&Projection>();
        match cameras.single(world).unwrap() {
            Projection::Perspective(p) => p.aspect_ratio,
            _ => unreachable!(),
        }
    }

    fn pointer(client_x: f32, client_y: f32) -> ViewerEvent {
        ViewerEvent::PointerMove(PointerSample {
            client_x,
            client_y,
            rect: SurfaceRect {
                left: 0.0,
                top: 0.0,
                width: 800.0,
                height: 600.0,
            },
        })
    }

    #[test]
    fn resize_updates_aspect_and_surface() {
        let (mut world, link) = viewer_world();
        link.send(ViewerEvent::Resize(size(1280, 720))).unwrap();
        world.run_system_once(apply_viewer_events).unwrap();

        assert_eq!(aspect(&mut world), 1280.0 / 720.0);
        assert_eq!(world.resource::<ViewportRes>().0, size(1280, 720));
        let handle = world.resource::<RenderTargetHandle>().0.clone();
        let image = world.resource::<Assets<Image>>().get(&handle).unwrap();
        assert_eq!(image.size(), UVec2::new(1280, 720));
    }

    #[test]
    fn last_resize_wins() {
        let (mut world, link) = viewer_world();
        for (w, h) in [(1024, 768), (300, 900), (640, 480)] {
            link.send(ViewerEvent::Resize(size(w, h))).unwrap();
        }
        world.run_system_once(apply_viewer_events).unwrap();
        assert_eq!(aspect(&mut world), 640.0 / 480.0);
    }

    #[test]
    fn pointer_is_ignored_before_markers_exist() {
        let (mut world, link) = viewer_world();
        link.send(pointer(400.0, 300.0)).unwrap();
        world.run_system_once(apply_viewer_events).unwrap();
        assert_eq!(world.resource::<PendingPointer>().0, None);
    }

    #[test]
    fn latest_pointer_is_kept_once_markers_exist() {
        let (mut world, link) = viewer_world();
        let placeholder = world.spawn_empty().id();
        world.insert_resource(Markers {
            green: placeholder,
            red: placeholder,
        });

        link.send(pointer(0.0, 0.0)).unwrap();
        link.send(pointer(400.0, 300.0)).unwrap();
        world.run_system_once(apply_viewer_events).unwrap();
        assert_eq!(world.resource::<PendingPointer>().0, Some(Vec2::ZERO));
    }
}
