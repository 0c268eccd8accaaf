//! Custom protocol handlers for efficient data transfer
//!
//! This module implements the `frame://` custom protocol for direct binary
//! transfer of render frames, bypassing Tauri's IPC JSON serialization.

use bevy::log::{debug, error};
use image::{codecs::jpeg::JpegEncoder, ImageBuffer, ImageEncoder, Rgba};
use tauri::http::Response as HttpResponse;

use super::shared_state::{Frame, SharedFrameBuffer, SharedPerfStats};
use crate::config::compression::JPEG_QUALITY;
use crate::error::{Result, ViewerError};

type Response = HttpResponse<Vec<u8>>;

/// Handle requests to the custom `frame://` protocol
///
/// Supported endpoints:
/// - `frame` or `frame.jpg`: JPEG-compressed frame
/// - `frame.raw`: Raw RGBA frame
/// - `stats`: Performance statistics as JSON
pub fn handle_frame_protocol(
    uri_path: &str,
    buffer: &SharedFrameBuffer,
    perf_stats: &SharedPerfStats,
) -> Response {
    let resource = uri_path.trim_start_matches('/');
    debug!("frame:// resource: {resource}");

    let response = match resource {
        "frame" | "frame.jpg" => handle_jpeg_frame(buffer),
        "frame.raw" => handle_raw_frame(buffer),
        "stats" => handle_stats(perf_stats),
        _ => plain_response(404, "Not Found"),
    };

    match response {
        Ok(response) => response,
        Err(ViewerError::FrameNotReady) => {
            plain_response(503, "Frame not ready").unwrap_or_default()
        }
        Err(err) => {
            error!("frame:// request for {resource} failed: {err}");
            plain_response(500, "Internal Error").unwrap_or_default()
        }
    }
}

fn plain_response(status: u16, body: &str) -> Result<Response> {
    Ok(HttpResponse::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(body.as_bytes().to_vec())?)
}

fn frame_response(content_type: &str, frame: &Frame, body: Vec<u8>) -> Result<Response> {
    Ok(HttpResponse::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("X-Frame-Width", frame.width.to_string())
        .header("X-Frame-Height", frame.height.to_string())
        .header("Access-Control-Allow-Origin", "*")
        .header(
            "Access-Control-Expose-Headers",
            "X-Frame-Width, X-Frame-Height",
        )
        .body(body)?)
}

/// Clone the latest frame out of the buffer so encoding happens unlocked
fn latest_frame(buffer: &SharedFrameBuffer) -> Result<Frame> {
    let guard = buffer
        .0
        .lock()
        .map_err(|_| ViewerError::LockPoisoned("frame buffer"))?;
    guard.clone().ok_or(ViewerError::FrameNotReady)
}

/// Compress an RGBA frame to JPEG (no alpha channel)
pub fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or(
            ViewerError::FrameSize {
                width: frame.width,
                height: frame.height,
            },
        )?;
    let rgb_img = image::DynamicImage::ImageRgba8(img).to_rgb8();

    let mut jpeg_data = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_data, JPEG_QUALITY).write_image(
        rgb_img.as_raw(),
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(jpeg_data)
}

fn handle_jpeg_frame(buffer: &SharedFrameBuffer) -> Result<Response> {
    let frame = latest_frame(buffer)?;
    let jpeg_data = encode_jpeg(&frame)?;
    frame_response("image/jpeg", &frame, jpeg_data)
}

fn handle_raw_frame(buffer: &SharedFrameBuffer) -> Result<Response> {
    let frame = latest_frame(buffer)?;
    let body = frame.rgba.clone();
    frame_response("application/octet-stream", &frame, body)
}

fn handle_stats(perf_stats: &SharedPerfStats) -> Result<Response> {
    let json = {
        let guard = perf_stats
            .0
            .lock()
            .map_err(|_| ViewerError::LockPoisoned("performance stats"))?;
        serde_json::to_vec(&*guard)?
    };

    Ok(HttpResponse::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(json)?)
}
