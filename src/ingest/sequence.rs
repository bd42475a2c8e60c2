//! Image sequence source.
//!
//! Reads PNG/JPEG frames from a local directory in file-name order. Frames are
//! decoded lazily, one per `current_frame` call, and stamped at the configured
//! frame rate. The source reports `is_finished` once every file has been read.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use super::{CaptureError, CaptureErrorKind, FrameSource, SourceStats};
use crate::frame::{Frame, FrameDimensions};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct ImageSequenceSource {
    dir: PathBuf,
    fps: u32,
    files: Vec<PathBuf>,
    next_index: usize,
    connected: bool,
    dimensions: Option<FrameDimensions>,
    last_timestamp_ms: f64,
}

impl ImageSequenceSource {
    pub fn new(dir: &Path, fps: u32) -> Self {
        Self {
            dir: dir.to_path_buf(),
            fps: fps.max(1),
            files: Vec::new(),
            next_index: 0,
            connected: false,
            dimensions: None,
            last_timestamp_ms: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }
}

impl FrameSource for ImageSequenceSource {
    fn connect(&mut self) -> Result<()> {
        let display = self.dir.display().to_string();
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| CaptureError::from_io(&e, &display))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", display))?
                .path();
            if path.is_file() && Self::is_image(&path) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(CaptureError::new(
                CaptureErrorKind::DeviceMissing,
                format!("{}: no png or jpeg frames found", display),
            )
            .into());
        }

        log::info!(
            "ImageSequenceSource: connected to {} ({} frames @ {} fps)",
            display,
            files.len(),
            self.fps
        );
        self.files = files;
        self.next_index = 0;
        self.connected = true;
        Ok(())
    }

    fn ready(&self) -> bool {
        self.connected && self.next_index < self.files.len()
    }

    fn current_frame(&mut self) -> Result<Frame> {
        if !self.connected {
            return Err(anyhow!("image sequence {} not connected", self.dir.display()));
        }
        let path = self
            .files
            .get(self.next_index)
            .ok_or_else(|| anyhow!("image sequence {} exhausted", self.dir.display()))?
            .clone();
        let image = image::open(&path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();

        if let Some(dims) = self.dimensions {
            if dims != FrameDimensions::new(width, height) {
                log::warn!(
                    "ImageSequenceSource: {} is {}x{}, previous frames were {}x{}",
                    path.display(),
                    width,
                    height,
                    dims.width,
                    dims.height
                );
            }
        }
        self.dimensions = Some(FrameDimensions::new(width, height));

        let timestamp_ms = self.next_index as f64 * 1000.0 / self.fps as f64;
        self.next_index += 1;
        self.last_timestamp_ms = timestamp_ms;
        Frame::new(image.into_raw(), width, height, timestamp_ms)
    }

    fn current_timestamp(&self) -> f64 {
        self.last_timestamp_ms
    }

    fn is_finished(&self) -> bool {
        self.connected && self.next_index >= self.files.len()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.next_index as u64,
            source: self.dir.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::capture_error_kind;
    use image::{Rgba, RgbaImage};

    fn write_frame(dir: &Path, name: &str, color: [u8; 4]) -> Result<()> {
        let image = RgbaImage::from_pixel(8, 4, Rgba(color));
        image.save(dir.join(name))?;
        Ok(())
    }

    #[test]
    fn reads_frames_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_frame(dir.path(), "002.png", [0, 255, 0, 255])?;
        write_frame(dir.path(), "001.png", [255, 0, 0, 255])?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;

        let mut source = ImageSequenceSource::new(dir.path(), 10);
        assert!(!source.ready());
        source.connect()?;
        assert_eq!(source.len(), 2);
        assert!(source.ready());

        let first = source.current_frame()?;
        assert_eq!((first.width, first.height), (8, 4));
        assert_eq!(first.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(first.timestamp_ms, 0.0);

        let second = source.current_frame()?;
        assert_eq!(second.pixel(0, 0), Some([0, 255, 0, 255]));
        assert_eq!(second.timestamp_ms, 100.0);

        assert!(source.is_finished());
        assert!(!source.ready());
        assert!(source.current_frame().is_err());
        Ok(())
    }

    #[test]
    fn empty_directory_is_device_missing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut source = ImageSequenceSource::new(dir.path(), 30);
        let err = source.connect().unwrap_err();
        assert_eq!(capture_error_kind(&err), CaptureErrorKind::DeviceMissing);
        Ok(())
    }
}
