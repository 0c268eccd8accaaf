//! Error type shared by the Bevy side and the Tauri bridge

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load model `{path}`: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("model `{0}` contains no scene")]
    EmptyModel(String),

    #[error("invalid viewport size {width}x{height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("viewer event channel closed")]
    ChannelClosed,

    #[error("no frame yet (scene still loading)")]
    FrameNotReady,

    #[error("frame data does not match {width}x{height}")]
    FrameSize { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Http(#[from] tauri::http::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

// Tauri commands hand errors to the frontend as plain strings
impl Serialize for ViewerError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_display_string() {
        let err = ViewerError::InvalidViewport { width: 0, height: 600 };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"invalid viewport size 0x600\"");
    }
}
