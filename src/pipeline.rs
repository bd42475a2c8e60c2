//! Frame loop driver.
//!
//! One call to [`run_tick`] processes exactly one frame: read it from the
//! source, clear the overlay, paint motion highlights, then poll each enabled
//! landmark provider and paint hands, pose and face in that order. Ticks never
//! overlap and there is no frame-drop policy; a slow provider simply lowers the
//! frame rate.
//!
//! Each modality keeps the last entity list its provider returned. A provider
//! answering "no new result" leaves that list in place, so the overlay holds
//! steady between model updates. A provider error clears it for the tick.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::detect::{ProviderPoll, ProviderRegistry};
use crate::frame::{Frame, FrameDimensions};
use crate::ingest::FrameSource;
use crate::landmarks::{DetectedEntity, DetectionResult, Modality};
use crate::motion::{MotionConfig, MotionDetector};
use crate::render::{OverlayRenderer, Surface};

const FPS_WINDOW_MS: f64 = 1000.0;

/// Which overlays run each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    pub hands: bool,
    pub pose: bool,
    pub face: bool,
    pub motion: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            hands: true,
            pose: true,
            face: true,
            motion: true,
        }
    }
}

impl RenderConfig {
    pub fn is_enabled(&self, modality: Modality) -> bool {
        match modality {
            Modality::Hands => self.hands,
            Modality::Pose => self.pose,
            Modality::Face => self.face,
        }
    }

    pub fn set(&mut self, modality: Modality, enabled: bool) {
        match modality {
            Modality::Hands => self.hands = enabled,
            Modality::Pose => self.pose = enabled,
            Modality::Face => self.face = enabled,
        }
    }
}

/// One switchable overlay layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    Landmarks(Modality),
    Motion,
}

impl Overlay {
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("motion") {
            return Some(Overlay::Motion);
        }
        Modality::parse(value).map(Overlay::Landmarks)
    }
}

/// Runtime switch such as `hands off`, `motion on` or a bare `face` (flip).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleCommand {
    pub overlay: Overlay,
    /// `None` flips the current state.
    pub enabled: Option<bool>,
}

impl ToggleCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty toggle command"))?;
        let overlay = Overlay::parse(name).ok_or_else(|| {
            anyhow!("'{}' is not one of hands, pose, face, motion", name)
        })?;
        let enabled = match words.next().map(str::to_ascii_lowercase).as_deref() {
            None => None,
            Some("on") => Some(true),
            Some("off") => Some(false),
            Some(other) => return Err(anyhow!("expected on or off, got '{}'", other)),
        };
        if words.next().is_some() {
            return Err(anyhow!("trailing input in toggle command '{}'", line.trim()));
        }
        Ok(Self { overlay, enabled })
    }
}

/// Frames per second over a one-second window of frame timestamps.
#[derive(Clone, Debug, Default)]
pub struct FpsCounter {
    window_start_ms: Option<f64>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame at `now_ms`; returns the most recently completed rate.
    pub fn tick(&mut self, now_ms: f64) -> u32 {
        let start = *self.window_start_ms.get_or_insert(now_ms);
        self.frames += 1;
        let elapsed = now_ms - start;
        if elapsed > FPS_WINDOW_MS {
            self.fps = (self.frames as f64 * 1000.0 / elapsed).round() as u32;
            self.frames = 0;
            self.window_start_ms = Some(now_ms);
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// What one tick observed.
#[derive(Clone, Debug, Default)]
pub struct TickSummary {
    pub timestamp_ms: f64,
    pub dimensions: Option<FrameDimensions>,
    pub hands: usize,
    pub pose: bool,
    pub faces: usize,
    pub motion: bool,
    pub motion_fraction: f32,
    pub fps: u32,
    pub detections: DetectionResult,
}

#[derive(Clone, Debug)]
pub enum TickOutcome {
    /// The running flag was cleared; nothing was read.
    Halted,
    /// The source has no usable frame yet.
    NotReady,
    /// The frame was processed; it is handed back for compositing.
    Rendered { summary: TickSummary, frame: Frame },
}

/// Everything the loop carries from one tick to the next.
pub struct TickContext {
    config: RenderConfig,
    motion: MotionDetector,
    providers: ProviderRegistry,
    cache: BTreeMap<Modality, Vec<DetectedEntity>>,
    fps: FpsCounter,
    running: Arc<AtomicBool>,
    ticks: u64,
}

impl TickContext {
    pub fn new(config: RenderConfig, motion: MotionConfig, providers: ProviderRegistry) -> Self {
        Self {
            config,
            motion: MotionDetector::new(motion),
            providers,
            cache: BTreeMap::new(),
            fps: FpsCounter::new(),
            running: Arc::new(AtomicBool::new(true)),
            ticks: 0,
        }
    }

    /// Shared flag; clearing it halts the loop before the next tick.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    pub fn motion_detector(&self) -> &MotionDetector {
        &self.motion
    }

    pub fn motion_detector_mut(&mut self) -> &mut MotionDetector {
        &mut self.motion
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Enable or disable a landmark overlay. Disabling drops its cached result.
    pub fn set_enabled(&mut self, modality: Modality, enabled: bool) {
        self.config.set(modality, enabled);
        if !enabled {
            self.cache.remove(&modality);
        }
        log::info!("overlay {} {}", modality, if enabled { "on" } else { "off" });
    }

    /// Turning motion on starts from a fresh reference frame.
    pub fn set_motion_enabled(&mut self, enabled: bool) {
        if enabled && !self.config.motion {
            self.motion.reset();
        }
        self.config.motion = enabled;
        log::info!("overlay motion {}", if enabled { "on" } else { "off" });
    }

    /// Apply a runtime switch; returns the layer's new state.
    pub fn apply(&mut self, command: ToggleCommand) -> bool {
        match command.overlay {
            Overlay::Motion => {
                let enabled = command.enabled.unwrap_or(!self.config.motion);
                self.set_motion_enabled(enabled);
                enabled
            }
            Overlay::Landmarks(modality) => {
                let enabled = command
                    .enabled
                    .unwrap_or(!self.config.is_enabled(modality));
                self.set_enabled(modality, enabled);
                enabled
            }
        }
    }

    fn poll(
        &mut self,
        modality: Modality,
        frame: &Frame,
        timestamp_ms: f64,
    ) -> &[DetectedEntity] {
        match self.providers.detect(modality, frame, timestamp_ms) {
            Ok(ProviderPoll::Fresh(entities)) => {
                self.cache.insert(modality, entities);
            }
            Ok(ProviderPoll::Stale) => {}
            Ok(ProviderPoll::Missing) => {
                self.cache.remove(&modality);
            }
            Err(err) => {
                log::warn!("{} detection failed: {:#}", modality, err);
                self.cache.remove(&modality);
            }
        }
        self.cache.get(&modality).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Process one frame from `source` onto `renderer`.
pub fn run_tick<S: Surface>(
    ctx: &mut TickContext,
    source: &mut dyn FrameSource,
    renderer: &mut OverlayRenderer<S>,
) -> Result<TickOutcome> {
    if !ctx.is_running() {
        return Ok(TickOutcome::Halted);
    }
    if !source.ready() {
        return Ok(TickOutcome::NotReady);
    }

    let frame = source.current_frame()?;
    let timestamp_ms = frame.timestamp_ms;
    renderer.fit_to(frame.dimensions());
    renderer.clear_surface();

    let mut summary = TickSummary {
        timestamp_ms,
        dimensions: Some(frame.dimensions()),
        ..TickSummary::default()
    };

    if ctx.config.motion {
        let report = ctx.motion.detect(&frame, renderer.dimensions());
        renderer.render_motion(&report.regions);
        summary.motion = report.detected;
        summary.motion_fraction = report.fraction;
    }

    for modality in Modality::ALL {
        if !ctx.config.is_enabled(modality) {
            continue;
        }
        let entities = ctx.poll(modality, &frame, timestamp_ms);
        match modality {
            Modality::Hands => summary.hands = renderer.render_hands(entities),
            Modality::Pose => summary.pose = renderer.render_pose(entities),
            Modality::Face => summary.faces = renderer.render_face(entities),
        }
        summary.detections.insert(modality, entities.to_vec());
    }

    ctx.ticks += 1;
    summary.fps = ctx.fps.tick(timestamp_ms);
    Ok(TickOutcome::Rendered { summary, frame })
}
