//! Bevy systems
//!
//! This module contains all the systems that operate on entities
//! and resources in the Bevy ECS.

pub mod scene;
pub mod model;
pub mod viewport;
pub mod picking;
pub mod camera;
pub mod frame_extraction;

pub use scene::{draw_axes_helper, setup_render_target, setup_scene};
pub use model::{resolve_model_load, start_model_load, tag_model_meshes};
pub use viewport::apply_viewer_events;
pub use picking::hover_markers;
pub use camera::update_camera_from_input;
pub use frame_extraction::extract_and_process_frame;
