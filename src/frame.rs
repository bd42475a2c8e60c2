//! Frame snapshots.
//!
//! - `Frame`: immutable per-tick RGBA snapshot produced by a `FrameSource`.
//! - `FrameDimensions`: width/height pair used by the renderer and the motion detector.
//!
//! Every core component reads frames; none of them mutate one. The motion detector
//! copies what it needs into its own prior buffer.

use anyhow::{anyhow, Result};

/// Bytes per pixel in every frame buffer (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One decoded video frame.
///
/// Pixels are interleaved RGBA quadruplets in row-major order. The buffer length
/// is validated at construction, so `pixels().len() == width * height * 4` always holds.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic capture time in milliseconds.
    pub timestamp_ms: f64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ms: f64) -> Result<Self> {
        let expected = expected_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGBA frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ms,
        })
    }

    /// A frame filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4], timestamp_ms: f64) -> Result<Self> {
        let len = expected_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Self::new(data, width, height, timestamp_ms)
    }

    pub fn dimensions(&self) -> FrameDimensions {
        FrameDimensions::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value of the pixel at (x, y), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[offset..offset + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.data
    }
}

fn expected_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(anyhow!("frame dimensions must be non-zero"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_wrong_length() {
        assert!(Frame::new(vec![0u8; 15], 2, 2, 0.0).is_err());
        assert!(Frame::new(vec![0u8; 16], 2, 2, 0.0).is_ok());
    }

    #[test]
    fn frame_rejects_zero_dimensions() {
        assert!(Frame::new(Vec::new(), 0, 4, 0.0).is_err());
    }

    #[test]
    fn solid_frame_reads_back_pixels() -> Result<()> {
        let frame = Frame::solid(3, 2, [10, 20, 30, 255], 5.0)?;
        assert_eq!(frame.pixels().len(), 24);
        assert_eq!(frame.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(frame.pixel(3, 0), None);
        assert_eq!(frame.dimensions().pixel_count(), 6);
        Ok(())
    }
}
