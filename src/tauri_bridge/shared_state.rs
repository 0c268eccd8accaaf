//! Shared state structures for communication between Tauri and Bevy
//!
//! This module defines thread-safe data structures that allow bidirectional
//! communication between the Tauri frontend and the Bevy render backend.

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use crate::error::{Result, ViewerError};

// =============================================================================
// Frame Buffer
// =============================================================================

/// One rendered frame as tightly packed RGBA8 pixels
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Thread-safe frame buffer shared between Bevy and Tauri
#[derive(Clone, Default)]
pub struct SharedFrameBuffer(pub Arc<Mutex<Option<Frame>>>);

// =============================================================================
// Mouse Input
// =============================================================================

/// Orbit input received from frontend
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct MouseInput {
    /// Accumulated X movement delta
    pub delta_x: f32,
    /// Accumulated Y movement delta
    pub delta_y: f32,
    /// Accumulated scroll wheel delta
    pub scroll_delta: f32,
    /// Left mouse button is pressed
    pub left_button: bool,
    /// Right mouse button is pressed
    pub right_button: bool,
}

/// Thread-safe mouse input shared between Tauri and Bevy
#[derive(Clone, Default)]
pub struct SharedMouseInput(pub Arc<Mutex<MouseInput>>);

// =============================================================================
// Viewer Events
// =============================================================================

/// Size of the host viewport in physical pixels
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ViewerError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// On-screen bounding box of the render surface, as measured by the frontend
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// A pointer-move event in client coordinates together with the live
/// bounding box of the surface it happened over
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PointerSample {
    pub client_x: f32,
    pub client_y: f32,
    pub rect: SurfaceRect,
}

/// Events forwarded from the host to the Bevy schedule, applied in order
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewerEvent {
    PointerMove(PointerSample),
    Resize(ViewportSize),
}

/// Tauri-side handle: owns the attachment flag and the sending half of the
/// event channel for the whole app lifetime
#[derive(Clone)]
pub struct ViewerLink {
    sender: Sender<ViewerEvent>,
    attached: Arc<AtomicBool>,
}

/// Bevy-side half of the link
pub struct ViewerEvents {
    pub receiver: Receiver<ViewerEvent>,
    pub attached: Arc<AtomicBool>,
}

impl ViewerLink {
    pub fn new() -> (ViewerLink, ViewerEvents) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let attached = Arc::new(AtomicBool::new(false));
        (
            ViewerLink {
                sender,
                attached: attached.clone(),
            },
            ViewerEvents { receiver, attached },
        )
    }

    /// Attach the render surface to the host and size it to the host viewport
    pub fn attach(&self, size: ViewportSize) -> Result<()> {
        self.attached.store(true, Ordering::Release);
        self.sender
            .send(ViewerEvent::Resize(size))
            .map_err(|_| ViewerError::ChannelClosed)
    }

    /// Detach the surface. Pointer and resize events are dropped from now on,
    /// whether or not the model has finished loading.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Queue an event. Returns `false` when the surface is detached and the
    /// event was dropped.
    pub fn send(&self, event: ViewerEvent) -> Result<bool> {
        if !self.is_attached() {
            return Ok(false);
        }
        self.sender
            .send(event)
            .map_err(|_| ViewerError::ChannelClosed)?;
        Ok(true)
    }
}

impl ViewerEvents {
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

// =============================================================================
// Performance Statistics
// =============================================================================

/// Performance statistics for debugging and monitoring
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct PerformanceStats {
    pub gpu_transfer_ms: f64,
    pub data_processing_ms: f64,
    pub frame_encoding_ms: f64,
    pub bevy_fps: f64,
    pub frame_count: u32,
    pub data_size_kb: f64,
}

/// Thread-safe performance statistics
#[derive(Clone, Default)]
pub struct SharedPerfStats(pub Arc<Mutex<PerformanceStats>>);

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: u32, height: u32) -> ViewportSize {
        ViewportSize::new(width, height).unwrap()
    }

    #[test]
    fn rejects_empty_viewport() {
        assert!(ViewportSize::new(0, 600).is_err());
        assert!(ViewportSize::new(800, 0).is_err());
        assert_eq!(size(800, 600).aspect_ratio(), 800.0 / 600.0);
    }

    #[test]
    fn events_are_dropped_until_attached() {
        let (link, events) = ViewerLink::new();
        let resize = ViewerEvent::Resize(size(640, 480));

        assert!(!link.send(resize).unwrap());
        assert!(events.receiver.try_recv().is_err());

        link.attach(size(1024, 768)).unwrap();
        assert!(events.is_attached());
        assert_eq!(
            events.receiver.try_recv().unwrap(),
            ViewerEvent::Resize(size(1024, 768))
        );

        assert!(link.send(resize).unwrap());
        assert_eq!(events.receiver.try_recv().unwrap(), resize);
    }

    #[test]
    fn detach_stops_forwarding() {
        let (link, events) = ViewerLink::new();
        link.attach(size(800, 600)).unwrap();
        let _ = events.receiver.try_recv();

        link.detach();
        assert!(!events.is_attached());
        let pointer = ViewerEvent::PointerMove(PointerSample {
            client_x: 10.0,
            client_y: 10.0,
            rect: SurfaceRect {
                left: 0.0,
                top: 0.0,
                width: 800.0,
                height: 600.0,
            },
        });
        assert!(!link.send(pointer).unwrap());
        assert!(events.receiver.try_recv().is_err());
    }

    #[test]
    fn pointer_sample_uses_frontend_field_names() {
        let json = r#"{"clientX":5,"clientY":7,"rect":{"left":1,"top":2,"width":3,"height":4}}"#;
        let sample: PointerSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.client_x, 5.0);
        assert_eq!(sample.rect.height, 4.0);
    }

    #[test]
    fn send_fails_once_bevy_side_is_gone() {
        let (link, events) = ViewerLink::new();
        drop(events);
        assert!(matches!(
            link.attach(size(800, 600)),
            Err(ViewerError::ChannelClosed)
        ));
    }
}
