//! Tauri command handlers
//!
//! This module contains all the Tauri command functions that can be invoked
//! from the frontend JavaScript/TypeScript code.

use bevy::log::{debug, info};
use tauri::State;

use super::shared_state::{
    PerformanceStats, PointerSample, SharedMouseInput, SharedPerfStats, ViewerEvent, ViewerLink,
    ViewportSize,
};
use crate::error::{Result, ViewerError};

/// Get performance statistics
#[tauri::command]
pub fn get_performance_stats(state: State<SharedPerfStats>) -> Result<PerformanceStats> {
    let guard = state
        .0
        .lock()
        .map_err(|_| ViewerError::LockPoisoned("performance stats"))?;
    Ok(guard.clone())
}

/// Receive mouse input from frontend for camera control
/// Input deltas are accumulated until consumed by Bevy
#[tauri::command]
pub fn send_mouse_input(
    state: State<SharedMouseInput>,
    delta_x: f32,
    delta_y: f32,
    scroll_delta: f32,
    left_button: bool,
    right_button: bool,
) -> Result<()> {
    let mut guard = state
        .0
        .lock()
        .map_err(|_| ViewerError::LockPoisoned("mouse input"))?;
    // Accumulate deltas (will be cleared when Bevy reads them)
    guard.delta_x += delta_x;
    guard.delta_y += delta_y;
    guard.scroll_delta += scroll_delta;
    // Button state is just the current state
    guard.left_button = left_button;
    guard.right_button = right_button;
    Ok(())
}

/// Attach the render surface to the frontend container
#[tauri::command]
pub fn mount_viewer(link: State<ViewerLink>, width: u32, height: u32) -> Result<()> {
    let size = ViewportSize::new(width, height)?;
    info!("Viewer mounted at {width}x{height}");
    link.attach(size)
}

/// Detach the render surface; pointer and resize listeners stop forwarding
#[tauri::command]
pub fn unmount_viewer(link: State<ViewerLink>) {
    link.detach();
    info!("Viewer unmounted");
}

/// Forward a pointer move over the render surface
///
/// Returns `false` when the viewer is not mounted and the event was dropped.
#[tauri::command]
pub fn send_pointer_move(link: State<ViewerLink>, sample: PointerSample) -> Result<bool> {
    link.send(ViewerEvent::PointerMove(sample))
}

/// Forward a host viewport resize
#[tauri::command]
pub fn resize_viewport(link: State<ViewerLink>, width: u32, height: u32) -> Result<bool> {
    let size = ViewportSize::new(width, height)?;
    debug!("Resize requested: {width}x{height}");
    link.send(ViewerEvent::Resize(size))
}
