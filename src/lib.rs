//! Boat Viewer: interactive 3D model viewer
//!
//! Loads a boat model, places two marker spheres next to it, and lets the
//! user orbit the camera and hover the markers to highlight them.
//!
//! Architecture:
//! - Bevy runs in a background thread with NO window (headless mode) and
//!   renders into an offscreen image sized to the frontend viewport
//! - A render graph node copies the image to a CPU buffer every frame
//! - Frames reach the frontend over the `frame://` protocol (JPEG or raw RGBA)
//! - Pointer, drag and resize events flow back through Tauri commands
//!
//! # Module Structure
//!
//! - `config`: Configuration constants and settings
//! - `error`: Crate error type
//! - `tauri_bridge`: Bridge layer between Tauri and Bevy
//!   - `shared_state`: Thread-safe data structures and the event link
//!   - `commands`: Tauri command handlers
//!   - `protocol`: Custom protocol handlers
//! - `bevy`: Bevy engine integration
//!   - `components`: ECS components
//!   - `resources`: Global resources
//!   - `plugins`: GPU frame readback
//!   - `systems`: Scene, model, picking, camera and frame systems
//!   - `app`: Application setup

// Module declarations
mod bevy;
mod config;
mod error;
mod tauri_bridge;

use std::{thread, time::Duration};
use tauri_bridge::{SharedFrameBuffer, SharedMouseInput, SharedPerfStats, ViewerLink};

/// Main entry point for the Tauri application
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Create shared state
    let buffer = SharedFrameBuffer::default();
    let perf_stats = SharedPerfStats::default();
    let mouse_input = SharedMouseInput::default();
    let (link, viewer_events) = ViewerLink::new();

    // Start Bevy in background thread
    bevy::start_bevy(
        buffer.clone(),
        perf_stats.clone(),
        mouse_input.clone(),
        viewer_events,
    );

    // Wait for Bevy to initialize
    thread::sleep(Duration::from_millis(config::STARTUP_GRACE_MS));

    // Clone for the custom protocol handler
    let protocol_perf_stats = perf_stats.clone();

    let result = tauri::Builder::default()
        .manage(perf_stats)
        .manage(mouse_input)
        .manage(link)
        // Register custom protocol "frame://" for direct binary transfer
        .register_asynchronous_uri_scheme_protocol("frame", move |_ctx, request, responder| {
            let buffer = buffer.clone();
            let perf_stats = protocol_perf_stats.clone();

            // Handle the request in a separate thread to avoid blocking
            std::thread::spawn(move || {
                let response = tauri_bridge::protocol::handle_frame_protocol(
                    request.uri().path(),
                    &buffer,
                    &perf_stats,
                );
                responder.respond(response);
            });
        })
        .invoke_handler(tauri::generate_handler![
            tauri_bridge::commands::get_performance_stats,
            tauri_bridge::commands::send_mouse_input,
            tauri_bridge::commands::mount_viewer,
            tauri_bridge::commands::unmount_viewer,
            tauri_bridge::commands::send_pointer_move,
            tauri_bridge::commands::resize_viewport
        ])
        .run(tauri::generate_context!());

    if let Err(err) = result {
        ::bevy::log::error!("Tauri error: {err}");
        std::process::exit(1);
    }
}
