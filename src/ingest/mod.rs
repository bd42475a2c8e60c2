//! Frame sources.
//!
//! This module provides the sources a frame loop can read from:
//! - Synthetic source (`stub://`), for demos and tests
//! - Image sequences (a directory of PNG/JPEG frames)
//! - USB/V4L2 cameras (feature: ingest-v4l2)
//!
//! Every source yields RGBA `Frame`s stamped with a monotonic millisecond
//! timestamp. Acquisition failures at startup are reported as `CaptureError`
//! so callers can show a categorized message.

mod error;
mod normalize;
pub mod sequence;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::frame::Frame;

pub use error::{capture_error_kind, CaptureError, CaptureErrorKind};
pub use normalize::{normalize_to_rgba, PixelFormat};
pub use sequence::ImageSequenceSource;
pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

pub const DEFAULT_SOURCE_URL: &str = "stub://camera";
pub const DEFAULT_CAPTURE_WIDTH: u32 = 1280;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 720;
pub const DEFAULT_CAPTURE_FPS: u32 = 30;

/// Where to capture from and the preferred capture mode.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceConfig {
    /// `stub://<name>`, `v4l2:///dev/videoN`, `/dev/videoN`, `dir://<path>` or a directory path.
    pub url: String,
    /// Ideal width; devices may negotiate another size.
    pub width: u32,
    /// Ideal height; devices may negotiate another size.
    pub height: u32,
    pub fps: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
            fps: DEFAULT_CAPTURE_FPS,
        }
    }
}

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// A device or file that supplies decoded frames.
pub trait FrameSource {
    /// Acquire the device. Failures here are fatal to startup.
    fn connect(&mut self) -> Result<()>;

    /// True once stable dimensions and at least one decodable frame exist.
    fn ready(&self) -> bool;

    /// Capture the frame currently presented by the source.
    fn current_frame(&mut self) -> Result<Frame>;

    /// Timestamp of the most recently captured frame, in milliseconds.
    fn current_timestamp(&self) -> f64;

    fn is_healthy(&self) -> bool {
        true
    }

    /// True when a finite source has no frames left.
    fn is_finished(&self) -> bool {
        false
    }

    fn stats(&self) -> SourceStats;
}

/// Open the source named by `config.url`.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    let url = config.url.trim();
    if url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(config.clone())));
    }
    if let Some(path) = url.strip_prefix("dir://") {
        return Ok(Box::new(ImageSequenceSource::new(Path::new(path), config.fps)));
    }
    if url.starts_with("v4l2://") || url.starts_with("/dev/video") {
        return open_device(config);
    }
    if url.contains("://") {
        return Err(anyhow!("unsupported source url '{}'", url));
    }
    Ok(Box::new(ImageSequenceSource::new(Path::new(url), config.fps)))
}

#[cfg(feature = "ingest-v4l2")]
fn open_device(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    let device = config.url.trim().trim_start_matches("v4l2://").to_string();
    Ok(Box::new(V4l2Source::new(SourceConfig {
        url: device,
        ..config.clone()
    })))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_device(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    Err(CaptureError::new(
        CaptureErrorKind::DeviceMissing,
        format!("{}: camera capture requires the ingest-v4l2 feature", config.url),
    )
    .into())
}
