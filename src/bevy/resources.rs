//! Bevy resource definitions
//!
//! This module contains all global resources used by Bevy systems.
//! Resources are singleton data that can be accessed by any system.

use bevy::{gltf::Gltf, prelude::*};
use std::time::Duration;

use crate::config::camera::{MAX_DISTANCE, MAX_PITCH, MIN_DISTANCE, MIN_PITCH};
use crate::tauri_bridge::shared_state::{
    SharedFrameBuffer, SharedMouseInput, SharedPerfStats, ViewerEvents, ViewportSize,
};

// =============================================================================
// Camera Control
// =============================================================================

/// Damped orbit camera state in spherical coordinates
///
/// User input adds to the pending deltas; every frame a fraction of them is
/// applied and the rest decays, so motion eases out over several frames.
#[derive(Resource, Debug, Clone)]
pub struct OrbitCameraState {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians), clamped to avoid gimbal lock
    pub pitch: f32,
    /// Distance from the camera to the center point
    pub distance: f32,
    /// The point the camera orbits around
    pub center: Vec3,
    pub pending_yaw: f32,
    pub pending_pitch: f32,
    pub pending_distance: f32,
    pub pending_pan: Vec3,
}

impl OrbitCameraState {
    /// Orbit state that places the camera at `eye` looking at `center`
    pub fn looking_from(eye: Vec3, center: Vec3) -> Self {
        let offset = eye - center;
        let distance = offset.length();
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin(),
            distance,
            center,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_distance: 0.0,
            pending_pan: Vec3::ZERO,
        }
    }

    /// Advance one frame of damped motion
    pub fn step(&mut self, damping: f32) {
        self.yaw += self.pending_yaw * damping;
        self.pitch = (self.pitch + self.pending_pitch * damping).clamp(MIN_PITCH, MAX_PITCH);
        self.distance =
            (self.distance + self.pending_distance * damping).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.center += self.pending_pan * damping;

        let decay = 1.0 - damping;
        self.pending_yaw *= decay;
        self.pending_pitch *= decay;
        self.pending_distance *= decay;
        self.pending_pan *= decay;
    }

    /// Camera right and horizontal forward directions
    ///
    /// Both lie in the ground plane, so panning along them never changes the
    /// height of the orbit center.
    pub fn pan_axes(&self) -> (Vec3, Vec3) {
        let (sin, cos) = self.yaw.sin_cos();
        (Vec3::new(cos, 0.0, -sin), Vec3::new(-sin, 0.0, -cos))
    }

    /// Camera position for the current angles and distance
    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.center + Vec3::new(x, y, z)
    }
}

/// Resource to hold shared mouse input in Bevy
#[derive(Resource)]
pub struct MouseInputRes(pub SharedMouseInput);

// =============================================================================
// Viewer Events & Interaction
// =============================================================================

/// Receiving half of the frontend event channel plus the attachment flag
#[derive(Resource)]
pub struct ViewerEventsRes(pub ViewerEvents);

/// Current size of the render surface
#[derive(Resource, Deref, Clone, Copy, Debug, PartialEq)]
pub struct ViewportRes(pub ViewportSize);

/// Latest pointer position in normalized device coordinates that has not been
/// hit-tested yet
#[derive(Resource, Default, Debug)]
pub struct PendingPointer(pub Option<Vec2>);

/// The marker currently under the pointer and its emissive color from just
/// before it was highlighted
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoveredMarker {
    pub entity: Entity,
    pub original_emissive: LinearRgba,
}

/// Highlight state; at most one marker is hovered at a time
#[derive(Resource, Default, Debug)]
pub struct HoverState {
    pub hovered: Option<HoveredMarker>,
}

/// The two marker spheres. Inserted once the model has loaded; pointer
/// hit-testing only runs while this resource exists.
#[derive(Resource, Clone, Copy, Debug)]
pub struct Markers {
    pub green: Entity,
    pub red: Entity,
}

// =============================================================================
// Model Loading
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelLoadStatus {
    Pending,
    Loaded,
    Failed,
}

/// The single in-flight model load
#[derive(Resource)]
pub struct ModelLoad {
    pub path: String,
    pub handle: Handle<Gltf>,
    pub status: ModelLoadStatus,
}

impl ModelLoad {
    pub fn new(path: impl Into<String>, handle: Handle<Gltf>) -> Self {
        Self {
            path: path.into(),
            handle,
            status: ModelLoadStatus::Pending,
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Handle to the offscreen render target texture
#[derive(Resource)]
pub struct RenderTargetHandle(pub Handle<Image>);

/// Shared frame buffer resource for Bevy
#[derive(Resource, Clone)]
pub struct FrameBufferRes(pub SharedFrameBuffer);

// =============================================================================
// Frame Management
// =============================================================================

/// Counter for total frames rendered
#[derive(Resource, Default)]
pub struct FrameCount(pub u32);

/// Number of pre-roll frames to skip before starting output
#[derive(Resource, Default)]
pub struct PreRollFrames(pub u32);

/// Frame rate limiter to control output FPS
#[derive(Resource)]
pub struct FrameRateLimiter {
    pub last_frame_time: std::time::Instant,
    pub min_frame_interval: Duration,
}

impl FrameRateLimiter {
    pub fn new(target_fps: f64) -> Self {
        Self {
            last_frame_time: std::time::Instant::now(),
            min_frame_interval: Duration::from_secs_f64(1.0 / target_fps),
        }
    }
}

impl Default for FrameRateLimiter {
    fn default() -> Self {
        Self::new(crate::config::TARGET_FPS)
    }
}

// =============================================================================
// Performance Monitoring
// =============================================================================

/// Performance timing tracker for frame processing
#[derive(Resource, Default)]
pub struct FrameTimings {
    pub last_print_time: f64,
    pub frame_times: Vec<f64>,
}

/// Shared performance statistics resource
#[derive(Resource)]
pub struct PerfStatsRes(pub SharedPerfStats);

// =============================================================================
// Channel Communication (Main World <-> Render World)
// =============================================================================

use crossbeam_channel::{Receiver, Sender};

/// Bytes read back from the GPU, still carrying row padding
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Receives data from render world
#[derive(Resource, Deref)]
pub struct MainWorldReceiver(pub Receiver<CapturedFrame>);

/// Sends data to main world
#[derive(Resource, Deref)]
pub struct RenderWorldSender(pub Sender<CapturedFrame>);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orbit_reproduces_initial_vantage_point() {
        let eye = Vec3::new(0.0, 5.0, 10.0);
        let orbit = OrbitCameraState::looking_from(eye, Vec3::ZERO);
        let computed = orbit.eye();
        assert_relative_eq!(computed.x, eye.x, epsilon = 1e-5);
        assert_relative_eq!(computed.y, eye.y, epsilon = 1e-5);
        assert_relative_eq!(computed.z, eye.z, epsilon = 1e-5);
    }

    #[test]
    fn damping_eases_motion_over_frames() {
        let mut orbit = OrbitCameraState::looking_from(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO);
        let start_yaw = orbit.yaw;
        orbit.pending_yaw = 1.0;

        orbit.step(0.25);
        assert_relative_eq!(orbit.yaw - start_yaw, 0.25, epsilon = 1e-6);
        assert_relative_eq!(orbit.pending_yaw, 0.75, epsilon = 1e-6);

        for _ in 0..200 {
            orbit.step(0.25);
        }
        // The whole impulse is eventually applied, never more
        assert_relative_eq!(orbit.yaw - start_yaw, 1.0, epsilon = 1e-4);
        assert!(orbit.pending_yaw.abs() < 1e-6);
    }

    #[test]
    fn zoom_and_pitch_stay_within_limits() {
        let mut orbit = OrbitCameraState::looking_from(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO);
        orbit.pending_distance = 1000.0;
        orbit.pending_pitch = 100.0;
        for _ in 0..50 {
            orbit.step(0.25);
        }
        assert_eq!(orbit.distance, MAX_DISTANCE);
        assert_eq!(orbit.pitch, MAX_PITCH);

        orbit.pending_distance = -1000.0;
        for _ in 0..50 {
            orbit.step(0.25);
        }
        assert_eq!(orbit.distance, MIN_DISTANCE);
    }

    #[test]
    fn pan_axes_follow_yaw() {
        let mut orbit = OrbitCameraState::looking_from(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO);
        let (right, forward) = orbit.pan_axes();
        assert_relative_eq!(right.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-6);

        // Looking along -X from +X, the camera's right is -Z
        orbit.yaw = std::f32::consts::FRAC_PI_2;
        let (right, forward) = orbit.pan_axes();
        assert_relative_eq!(right.z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(forward.x, -1.0, epsilon = 1e-6);
        assert_eq!(right.y, 0.0);
        assert_eq!(forward.y, 0.0);
    }

    #[test]
    fn pan_moves_center_with_damping() {
        let mut orbit = OrbitCameraState::looking_from(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO);
        let offset = orbit.eye() - orbit.center;
        orbit.pending_pan = Vec3::new(2.0, 0.0, 0.0);

        orbit.step(0.25);
        assert_relative_eq!(orbit.center.x, 0.5, epsilon = 1e-6);
        for _ in 0..200 {
            orbit.step(0.25);
        }
        assert_relative_eq!(orbit.center.x, 2.0, epsilon = 1e-4);
        // The camera travels with its center
        let moved = orbit.eye() - orbit.center;
        assert_relative_eq!(moved.x, offset.x, epsilon = 1e-4);
        assert_relative_eq!(moved.z, offset.z, epsilon = 1e-4);
    }
}
