//! Configuration constants and settings for the boat viewer
//!
//! This module contains all configurable parameters such as the initial
//! render resolution, camera setup, marker layout and performance tuning.

/// Initial width of the offscreen render target in pixels, used until the
/// frontend reports its real size
pub const RENDER_WIDTH: u32 = 800;

/// Initial height of the offscreen render target in pixels
pub const RENDER_HEIGHT: u32 = 600;

/// Target frames per second for the Bevy render loop
pub const TARGET_FPS: f64 = 60.0;

/// Number of pre-roll frames to skip before starting output
/// This allows the scene to fully load and stabilize
pub const PRE_ROLL_FRAMES: u32 = 30;

/// Time given to the Bevy thread to create its render device before Tauri starts
pub const STARTUP_GRACE_MS: u64 = 1000;

/// Camera settings
pub mod camera {
    /// Vertical field of view in degrees
    pub const FOV_DEGREES: f32 = 75.0;

    /// Near clipping plane
    pub const NEAR: f32 = 0.1;

    /// Far clipping plane
    pub const FAR: f32 = 2000.0;

    /// Camera vantage point at startup, looking at the origin
    pub const INITIAL_POSITION: [f32; 3] = [0.0, 5.0, 10.0];

    /// Fraction of the pending orbit motion applied per frame
    pub const DAMPING_FACTOR: f32 = 0.25;

    /// Drag rotation multiplier; at 1.0 a drag across the full surface
    /// height turns the camera by one full revolution
    pub const ROTATE_SPEED: f32 = 1.0;

    /// Drag pan multiplier; at 1.0 the point under the cursor at target
    /// depth follows the cursor
    pub const PAN_SPEED: f32 = 1.0;

    /// Zoom speed multiplier for scroll wheel
    pub const ZOOM_SPEED: f32 = 0.5;

    /// Minimum camera distance from center point
    pub const MIN_DISTANCE: f32 = 1.0;

    /// Maximum camera distance from center point
    pub const MAX_DISTANCE: f32 = 30.0;

    /// Maximum pitch angle (radians) to prevent camera flipping
    pub const MAX_PITCH: f32 = 1.5;

    /// Minimum pitch angle (radians) to prevent camera flipping
    pub const MIN_PITCH: f32 = -1.5;
}

/// Scene content settings
pub mod scene {
    /// Model location relative to the asset root
    pub const MODEL_PATH: &str = "models/boat_demo.glb";

    /// Ambient light brightness (cd/m^2)
    pub const AMBIENT_BRIGHTNESS: f32 = 500.0;

    /// Length of each axis drawn by the axis helper
    pub const AXES_LENGTH: f32 = 5.0;

    /// Background color of the render target (sRGB)
    pub const CLEAR_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
}

/// Render layers
///
/// The camera renders every layer; the split only decides which entities a
/// pointer ray may hit.
pub mod layers {
    /// Layer carrying the loaded model meshes
    pub const MODEL_LAYER: usize = 1;

    /// Layer carrying hit-testable markers
    pub const INTERACTION_LAYER: usize = 2;
}

/// Marker sphere settings
pub mod markers {
    /// Sphere radius before scaling
    pub const SPHERE_RADIUS: f32 = 1.0;

    /// Sectors and stacks of the UV sphere
    pub const SPHERE_SUBDIVISIONS: u32 = 32;

    /// Emissive color applied to the hovered marker (linear RGB)
    pub const HIGHLIGHT_EMISSIVE: [f32; 3] = [1.0, 1.0, 0.0];

    /// Placement and look of one marker
    pub struct MarkerSpec {
        pub name: &'static str,
        /// Base color (sRGB)
        pub color: [f32; 3],
        pub scale: f32,
        pub position: [f32; 3],
    }

    pub const GREEN: MarkerSpec = MarkerSpec {
        name: "marker_green",
        color: [0.0, 1.0, 0.0],
        scale: 0.55,
        position: [-0.3, -0.4, -0.6],
    };

    pub const RED: MarkerSpec = MarkerSpec {
        name: "marker_red",
        color: [1.0, 0.0, 0.0],
        scale: 0.5,
        position: [2.0, -0.4, 0.4],
    };
}

/// Performance monitoring settings
pub mod performance {
    /// Interval for printing performance stats (seconds)
    pub const STATS_PRINT_INTERVAL: f64 = 2.0;

    /// Number of frame timing samples to keep for averaging
    pub const FRAME_TIMING_SAMPLES: usize = 60;
}

/// Image compression settings
pub mod compression {
    /// JPEG quality level (0-100, higher = better quality but larger size)
    pub const JPEG_QUALITY: u8 = 85;
}
