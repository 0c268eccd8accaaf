//! Camera control system
//!
//! This module implements damped orbit camera controls that respond to mouse
//! input from the frontend, allowing users to rotate, pan and zoom the camera.

use bevy::{math::Vec3, prelude::*};
use std::f32::consts::TAU;

use crate::bevy::components::CameraController;
use crate::bevy::resources::{MouseInputRes, OrbitCameraState, ViewportRes};
use crate::config::camera::*;
use crate::tauri_bridge::shared_state::MouseInput;

/// Turn one frame of accumulated input into pending orbit motion
/// - Left button drag: rotate camera (yaw/pitch)
/// - Right button drag: pan the orbit center across the ground plane
/// - Scroll wheel: zoom (adjust distance)
///
/// Drag deltas are in surface pixels and scale with `surface_height`, so a
/// drag covers the same angle whatever the window size.
pub fn queue_orbit_input(
    orbit_state: &mut OrbitCameraState,
    input: &MouseInput,
    surface_height: f32,
) {
    let surface_height = surface_height.max(1.0);
    let dragged = input.delta_x != 0.0 || input.delta_y != 0.0;

    if input.left_button && dragged {
        let radians_per_pixel = TAU * ROTATE_SPEED / surface_height;
        orbit_state.pending_yaw -= input.delta_x * radians_per_pixel;
        // Dragging down lifts the camera toward overhead
        orbit_state.pending_pitch += input.delta_y * radians_per_pixel;
    } else if input.right_button && dragged {
        // World units spanned by one pixel at the depth of the orbit center
        let half_fov = FOV_DEGREES.to_radians() / 2.0;
        let units_per_pixel =
            2.0 * PAN_SPEED * orbit_state.distance * half_fov.tan() / surface_height;
        let (right, forward) = orbit_state.pan_axes();
        orbit_state.pending_pan +=
            (forward * input.delta_y - right * input.delta_x) * units_per_pixel;
    }

    if input.scroll_delta != 0.0 {
        orbit_state.pending_distance -= input.scroll_delta * ZOOM_SPEED;
    }
}

/// Advance the damped orbit by one step and move the camera
pub fn update_camera_from_input(
    mouse_input_res: Option<Res<MouseInputRes>>,
    viewport: Res<ViewportRes>,
    mut orbit_state: ResMut<OrbitCameraState>,
    mut camera_query: Query<&mut Transform, With<CameraController>>,
) {
    if let Some(mouse_res) = mouse_input_res {
        // Read and clear accumulated input
        if let Ok(mut guard) = mouse_res.0 .0.lock() {
            queue_orbit_input(&mut orbit_state, &guard, viewport.height as f32);
            guard.delta_x = 0.0;
            guard.delta_y = 0.0;
            guard.scroll_delta = 0.0;
        }
    }

    orbit_state.step(DAMPING_FACTOR);

    let camera_position = orbit_state.eye();
    for mut transform in camera_query.iter_mut() {
        *transform =
            Transform::from_translation(camera_position).looking_at(orbit_state.center, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tauri_bridge::shared_state::{SharedMouseInput, ViewportSize};
    use approx::assert_relative_eq;
    use bevy::ecs::system::RunSystemOnce;

    fn orbit_world() -> (World, SharedMouseInput) {
        let mut world = World::new();
        let input = SharedMouseInput::default();
        let eye = Vec3::from(INITIAL_POSITION);
        world.insert_resource(MouseInputRes(input.clone()));
        world.insert_resource(ViewportRes(ViewportSize::new(800, 600).unwrap()));
        world.insert_resource(OrbitCameraState::looking_from(eye, Vec3::ZERO));
        world.spawn((
            Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y),
            CameraController,
        ));
        (world, input)
    }

    fn camera_position(world: &mut World) -> Vec3 {
        let mut query = world.query_filtered::<&Transform, With<CameraController>>();
        query.single(world).unwrap().translation
    }

    fn settle(world: &mut World) {
        for _ in 0..100 {
            world.run_system_once(update_camera_from_input).unwrap();
        }
    }

    #[test]
    fn idle_camera_stays_put() {
        let (mut world, _) = orbit_world();
        for _ in 0..10 {
            world.run_system_once(update_camera_from_input).unwrap();
        }
        let position = camera_position(&mut world);
        assert_relative_eq!(position.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(position.y, 5.0, epsilon = 1e-4);
        assert_relative_eq!(position.z, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn drag_keeps_moving_after_input_stops() {
        let (mut world, input) = orbit_world();
        {
            let mut guard = input.0.lock().unwrap();
            guard.delta_x = -100.0;
            guard.left_button = true;
        }

        world.run_system_once(update_camera_from_input).unwrap();
        let first = camera_position(&mut world);
        assert_eq!(input.0.lock().unwrap().delta_x, 0.0);

        world.run_system_once(update_camera_from_input).unwrap();
        let second = camera_position(&mut world);
        // Input was consumed once, but the camera still eases further
        assert!(second.x > first.x);
        assert!(first.x > 0.0);

        let orbit = world.resource::<OrbitCameraState>();
        assert_relative_eq!(orbit.distance, 125f32.sqrt(), epsilon = 1e-4);
    }

    #[test]
    fn downward_drag_raises_camera() {
        let (mut world, input) = orbit_world();
        {
            let mut guard = input.0.lock().unwrap();
            guard.delta_y = 100.0;
            guard.left_button = true;
        }
        settle(&mut world);

        let position = camera_position(&mut world);
        // 100 px of 600 is a sixth of a turn, enough to reach the pitch limit
        assert_relative_eq!(world.resource::<OrbitCameraState>().pitch, MAX_PITCH);
        assert!(position.y > 11.0);
    }

    #[test]
    fn full_height_drag_is_one_revolution() {
        let mut orbit = OrbitCameraState::looking_from(Vec3::from(INITIAL_POSITION), Vec3::ZERO);
        let input = MouseInput {
            delta_x: 600.0,
            left_button: true,
            ..default()
        };
        queue_orbit_input(&mut orbit, &input, 600.0);
        assert_relative_eq!(orbit.pending_yaw, -TAU, epsilon = 1e-5);

        let mut orbit = OrbitCameraState::looking_from(Vec3::from(INITIAL_POSITION), Vec3::ZERO);
        queue_orbit_input(&mut orbit, &input, 1200.0);
        assert_relative_eq!(orbit.pending_yaw, -TAU / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn right_drag_pans_across_ground_plane() {
        let (mut world, input) = orbit_world();
        {
            let mut guard = input.0.lock().unwrap();
            guard.delta_x = 50.0;
            guard.delta_y = 50.0;
            guard.right_button = true;
        }
        settle(&mut world);

        let orbit = world.resource::<OrbitCameraState>().clone();
        // Dragging right drags the scene right, so the center moves left;
        // dragging down moves it away from the camera
        assert!(orbit.center.x < 0.0);
        assert!(orbit.center.z < 0.0);
        assert_eq!(orbit.center.y, 0.0);
        assert_relative_eq!(orbit.distance, 125f32.sqrt(), epsilon = 1e-4);

        let position = camera_position(&mut world);
        assert_relative_eq!(position.y, 5.0, epsilon = 1e-4);
        assert_relative_eq!(position.x, orbit.center.x, epsilon = 1e-4);
    }

    #[test]
    fn pan_is_ignored_while_rotating() {
        let mut orbit = OrbitCameraState::looking_from(Vec3::from(INITIAL_POSITION), Vec3::ZERO);
        let input = MouseInput {
            delta_x: 40.0,
            left_button: true,
            right_button: true,
            ..default()
        };
        queue_orbit_input(&mut orbit, &input, 600.0);
        assert_eq!(orbit.pending_pan, Vec3::ZERO);
        assert!(orbit.pending_yaw < 0.0);
    }

    #[test]
    fn scroll_zooms_in() {
        let (mut world, input) = orbit_world();
        input.0.lock().unwrap().scroll_delta = 4.0;
        settle(&mut world);
        let orbit = world.resource::<OrbitCameraState>();
        assert_relative_eq!(orbit.distance, 125f32.sqrt() - 4.0 * ZOOM_SPEED, epsilon = 1e-3);
    }
}
