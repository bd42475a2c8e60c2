//! Frame-difference motion detection.
//!
//! The detector keeps exactly one prior frame. Each call compares a strided
//! subsample of the current frame against it, then replaces it with the current
//! frame whatever the outcome. Detection never draws: changed samples are
//! returned as canvas-space rectangles and painted by the renderer.

use crate::frame::{Frame, FrameDimensions, BYTES_PER_PIXEL};
use crate::render::Rect;

pub const DEFAULT_MOTION_THRESHOLD: u8 = 30;
pub const DEFAULT_MOTION_SENSITIVITY: f32 = 0.02;
pub const DEFAULT_MOTION_STEP: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionConfig {
    /// Mean absolute RGB delta a sample must exceed to count as changed.
    pub threshold: u8,
    /// Share of changed samples that must be exceeded to report motion.
    pub sensitivity: f32,
    /// Sample every `step`-th pixel of the flattened frame.
    pub step: usize,
    /// Collect highlight regions for changed samples.
    pub collect_regions: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MOTION_THRESHOLD,
            sensitivity: DEFAULT_MOTION_SENSITIVITY,
            step: DEFAULT_MOTION_STEP,
            collect_regions: true,
        }
    }
}

/// Outcome of one motion comparison.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionReport {
    pub detected: bool,
    /// `changed / sampled`; zero when there was no prior frame.
    pub fraction: f32,
    pub changed: usize,
    pub sampled: usize,
    /// Highlight rectangles in output canvas coordinates.
    pub regions: Vec<Rect>,
}

struct PriorFrame {
    dims: FrameDimensions,
    pixels: Vec<u8>,
}

pub struct MotionDetector {
    config: MotionConfig,
    prior: Option<PriorFrame>,
    last_detected: bool,
}

impl MotionDetector {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config: MotionConfig {
                step: config.step.max(1),
                ..config
            },
            prior: None,
            last_detected: false,
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.config.threshold = threshold;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.config.sensitivity = sensitivity;
    }

    /// Drop the prior frame. The next call stores a reference and reports no motion.
    pub fn reset(&mut self) {
        self.prior = None;
        self.last_detected = false;
    }

    pub fn has_prior(&self) -> bool {
        self.prior.is_some()
    }

    /// Flag computed by the most recent call.
    pub fn last_detected(&self) -> bool {
        self.last_detected
    }

    /// Compare against the prior frame; highlight regions are scaled to frame size.
    pub fn detect_motion(&mut self, frame: &Frame) -> bool {
        self.detect(frame, frame.dimensions()).detected
    }

    /// Compare against the prior frame; highlight regions are scaled to `canvas`.
    pub fn detect(&mut self, frame: &Frame, canvas: FrameDimensions) -> MotionReport {
        let dims = frame.dimensions();
        let report = match self.prior.as_ref() {
            Some(prior) if prior.dims == dims => {
                compare(&self.config, &prior.pixels, frame, canvas)
            }
            Some(prior) => {
                log::debug!(
                    "motion: frame size changed {}x{} -> {}x{}, resetting reference",
                    prior.dims.width,
                    prior.dims.height,
                    dims.width,
                    dims.height
                );
                MotionReport::default()
            }
            None => MotionReport::default(),
        };

        self.store_prior(frame);
        self.last_detected = report.detected;
        report
    }

    fn store_prior(&mut self, frame: &Frame) {
        let dims = frame.dimensions();
        match self.prior.as_mut() {
            Some(prior) if prior.dims == dims => {
                prior.pixels.clear();
                prior.pixels.extend_from_slice(frame.pixels());
            }
            _ => {
                self.prior = Some(PriorFrame {
                    dims,
                    pixels: frame.pixels().to_vec(),
                });
            }
        }
    }
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

fn compare(
    config: &MotionConfig,
    prior: &[u8],
    frame: &Frame,
    canvas: FrameDimensions,
) -> MotionReport {
    let current = frame.pixels();
    let step = config.step;
    let frame_width = frame.width as usize;
    let scale_x = canvas.width as f32 / frame.width as f32;
    let scale_y = canvas.height as f32 / frame.height as f32;
    // avg(dr, dg, db) > threshold  <=>  dr + dg + db > 3 * threshold
    let limit = 3 * config.threshold as u32;

    let mut sampled = 0usize;
    let mut changed = 0usize;
    let mut regions = Vec::new();

    for offset in (0..current.len()).step_by(BYTES_PER_PIXEL * step) {
        sampled += 1;
        let delta = channel_delta(current[offset], prior[offset])
            + channel_delta(current[offset + 1], prior[offset + 1])
            + channel_delta(current[offset + 2], prior[offset + 2]);
        if delta <= limit {
            continue;
        }
        changed += 1;
        if config.collect_regions {
            let index = offset / BYTES_PER_PIXEL;
            let x = (index % frame_width) as f32 * scale_x;
            let y = (index / frame_width) as f32 * scale_y;
            regions.push(Rect::new(
                x,
                y,
                step as f32 * scale_x,
                step as f32 * scale_y,
            ));
        }
    }

    let fraction = if sampled == 0 {
        0.0
    } else {
        changed as f32 / sampled as f32
    };

    MotionReport {
        detected: fraction > config.sensitivity,
        fraction,
        changed,
        sampled,
        regions,
    }
}

fn channel_delta(a: u8, b: u8) -> u32 {
    a.abs_diff(b) as u32
}
