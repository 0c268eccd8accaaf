//! Bevy component definitions
//!
//! This module contains all component markers and data structures used
//! to tag and identify entities in the Bevy ECS (Entity Component System).

use bevy::prelude::*;

/// Marker component for the viewer camera
///
/// The camera renders to the offscreen target and responds to mouse input
/// for damped orbit control (rotation, pan, zoom).
#[derive(Component)]
pub struct CameraController;

/// Root entity of the loaded boat model
#[derive(Component)]
pub struct BoatModel;

/// A marker sphere that the pointer can hover
///
/// Markers are spawned at the scene root, so their local transform is their
/// world transform.
#[derive(Component, Debug, Clone, Copy)]
pub struct InteractiveMarker {
    /// World-space radius used for hit-testing
    pub radius: f32,
}

/// Debug axis indicator drawn with gizmos every frame
#[derive(Component)]
pub struct AxesHelper {
    pub length: f32,
}
