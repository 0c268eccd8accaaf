//! Bevy application setup and execution
//!
//! This module handles the creation and configuration of the Bevy app,
//! including plugin registration and system scheduling.

use bevy::{
    app::{App, ScheduleRunnerPlugin},
    prelude::*,
    window::ExitCondition,
};
use std::thread;
use std::time::Duration;

use crate::bevy::plugins::ImageCopyPlugin;
use crate::bevy::resources::*;
use crate::bevy::systems::*;
use crate::config::{PRE_ROLL_FRAMES, RENDER_HEIGHT, RENDER_WIDTH, TARGET_FPS};
use crate::error::Result;
use crate::tauri_bridge::shared_state::{
    SharedFrameBuffer, SharedMouseInput, SharedPerfStats, ViewerEvents, ViewportSize,
};

/// Create and configure the Bevy application
pub fn create_app(
    frame_buffer: SharedFrameBuffer,
    perf_stats: SharedPerfStats,
    mouse_input: SharedMouseInput,
    viewer_events: ViewerEvents,
) -> Result<App> {
    let mut app = App::new();

    // Use DefaultPlugins but configure for headless operation
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: None,
                exit_condition: ExitCondition::DontExit,
                ..default()
            })
            .set(ImagePlugin::default_nearest()),
    );

    // Add schedule runner for controlled frame rate
    app.add_plugins(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
        1.0 / TARGET_FPS,
    )));

    // Add custom plugins
    app.add_plugins(ImageCopyPlugin);

    // Register systems
    app.add_systems(
        Startup,
        (setup_render_target, setup_scene, start_model_load).chain(),
    );
    app.add_systems(
        Update,
        (
            apply_viewer_events,
            update_camera_from_input,
            hover_markers.run_if(resource_exists::<Markers>),
        )
            .chain(),
    );
    app.add_systems(
        Update,
        (resolve_model_load, tag_model_meshes, draw_axes_helper),
    );
    app.add_systems(Last, extract_and_process_frame);

    // Insert resources
    app.insert_resource(FrameBufferRes(frame_buffer));
    app.insert_resource(PerfStatsRes(perf_stats));
    app.insert_resource(MouseInputRes(mouse_input));
    app.insert_resource(ViewerEventsRes(viewer_events));
    app.insert_resource(ViewportRes(ViewportSize::new(RENDER_WIDTH, RENDER_HEIGHT)?));
    app.insert_resource(PendingPointer::default());
    app.insert_resource(HoverState::default());
    app.insert_resource(FrameCount::default());
    app.insert_resource(PreRollFrames(PRE_ROLL_FRAMES));
    app.insert_resource(FrameTimings::default());
    app.insert_resource(FrameRateLimiter::default());

    info!("App configured (headless mode with GPU-CPU frame readback)");
    Ok(app)
}

/// Start Bevy in a background thread
pub fn start_bevy(
    buffer: SharedFrameBuffer,
    perf_stats: SharedPerfStats,
    mouse_input: SharedMouseInput,
    viewer_events: ViewerEvents,
) {
    thread::spawn(move || {
        let mut app = match create_app(buffer, perf_stats, mouse_input, viewer_events) {
            Ok(app) => app,
            Err(err) => {
                error!("Failed to configure viewer: {err}");
                return;
            }
        };
        info!("Running render loop...");
        app.run();
    });
}
