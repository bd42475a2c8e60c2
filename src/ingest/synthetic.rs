//! Synthetic frame source (`stub://`).
//!
//! Renders a dark background with a bright block sliding left to right, plus
//! low-amplitude sensor noise that stays under the default motion threshold.
//! Timestamps advance at the configured frame rate rather than wall time, so
//! runs are reproducible.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FrameSource, SourceConfig, SourceStats};
use crate::frame::{Frame, BYTES_PER_PIXEL};

const BACKGROUND: [u8; 3] = [24, 28, 36];
const BLOCK: [u8; 3] = [220, 180, 140];
const NOISE_AMPLITUDE: i16 = 3;
/// Frames for the block to cross the full width once.
const SWEEP_FRAMES: u64 = 90;

pub struct SyntheticSource {
    config: SourceConfig,
    connected: bool,
    frame_count: u64,
    last_timestamp_ms: f64,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            connected: false,
            frame_count: 0,
            last_timestamp_ms: 0.0,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    fn block_origin(&self) -> (u32, u32) {
        let w = self.config.width;
        let h = self.config.height;
        let block = (w.min(h) / 4).max(1);
        let travel = w.saturating_sub(block) as u64;
        let phase = self.frame_count % SWEEP_FRAMES;
        let x = (travel * phase / SWEEP_FRAMES.max(1)) as u32;
        let y = h.saturating_sub(block) / 2;
        (x, y)
    }

    fn render(&mut self) -> Vec<u8> {
        let w = self.config.width;
        let h = self.config.height;
        let block = (w.min(h) / 4).max(1);
        let (bx, by) = self.block_origin();

        let mut pixels = Vec::with_capacity(w as usize * h as usize * BYTES_PER_PIXEL);
        for y in 0..h {
            for x in 0..w {
                let inside = x >= bx && x < bx + block && y >= by && y < by + block;
                let base = if inside { BLOCK } else { BACKGROUND };
                for channel in base {
                    let noise = self.rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
                    pixels.push((channel as i16 + noise).clamp(0, 255) as u8);
                }
                pixels.push(255);
            }
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        if self.config.width == 0 || self.config.height == 0 || self.config.fps == 0 {
            return Err(anyhow!(
                "synthetic source needs non-zero dimensions and fps, got {}x{}@{}",
                self.config.width,
                self.config.height,
                self.config.fps
            ));
        }
        self.connected = true;
        log::info!(
            "SyntheticSource: connected to {} ({}x{} @ {} fps)",
            self.config.url,
            self.config.width,
            self.config.height,
            self.config.fps
        );
        Ok(())
    }

    fn ready(&self) -> bool {
        self.connected
    }

    fn current_frame(&mut self) -> Result<Frame> {
        if !self.connected {
            return Err(anyhow!("synthetic source not connected"));
        }
        let timestamp_ms = self.frame_count as f64 * 1000.0 / self.config.fps as f64;
        let pixels = self.render();
        self.frame_count += 1;
        self.last_timestamp_ms = timestamp_ms;
        Frame::new(pixels, self.config.width, self.config.height, timestamp_ms)
    }

    fn current_timestamp(&self) -> f64 {
        self.last_timestamp_ms
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: self.config.url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SourceConfig {
        SourceConfig {
            url: "stub://test".to_string(),
            width: 64,
            height: 32,
            fps: 20,
        }
    }

    #[test]
    fn not_ready_until_connected() -> Result<()> {
        let mut source = SyntheticSource::new(config());
        assert!(!source.ready());
        assert!(source.current_frame().is_err());
        source.connect()?;
        assert!(source.ready());
        Ok(())
    }

    #[test]
    fn timestamps_follow_frame_rate() -> Result<()> {
        let mut source = SyntheticSource::new(config());
        source.connect()?;
        let first = source.current_frame()?;
        let second = source.current_frame()?;
        assert_eq!(first.timestamp_ms, 0.0);
        assert_eq!(second.timestamp_ms, 50.0);
        assert_eq!(source.current_timestamp(), 50.0);
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn block_moves_between_frames() -> Result<()> {
        let mut source = SyntheticSource::new(config());
        source.connect()?;
        let a = source.block_origin();
        source.current_frame()?;
        for _ in 0..10 {
            source.current_frame()?;
        }
        assert_ne!(a, source.block_origin());
        Ok(())
    }

    #[test]
    fn rejects_zero_fps() {
        let mut source = SyntheticSource::new(SourceConfig {
            fps: 0,
            ..config()
        });
        assert!(source.connect().is_err());
    }
}
