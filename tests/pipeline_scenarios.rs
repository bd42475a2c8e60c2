use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use vision_overlay::detect::{RecordedFrame, Recording};
use vision_overlay::ingest::SourceStats;
use vision_overlay::{
    run_tick, DetectedEntity, DisplayList, Frame, FrameDimensions, FrameSource, Modality,
    MotionConfig, OverlayRenderer, OverlayStyle, Point, ProviderRegistry, RenderConfig,
    ReplayProvider, StubProvider, TickContext, TickOutcome, TickSummary,
};

/// Plays a fixed list of frames, then reports not ready.
struct ScriptedSource {
    frames: VecDeque<Frame>,
    delivered: u64,
    last_timestamp_ms: f64,
}

impl ScriptedSource {
    fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            delivered: 0,
            last_timestamp_ms: 0.0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn ready(&self) -> bool {
        !self.frames.is_empty()
    }

    fn current_frame(&mut self) -> Result<Frame> {
        let frame = self
            .frames
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))?;
        self.delivered += 1;
        self.last_timestamp_ms = frame.timestamp_ms;
        Ok(frame)
    }

    fn current_timestamp(&self) -> f64 {
        self.last_timestamp_ms
    }

    fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.delivered,
            source: "script".to_string(),
        }
    }
}

fn black(width: u32, height: u32, timestamp_ms: f64) -> Frame {
    Frame::solid(width, height, [0, 0, 0, 255], timestamp_ms).unwrap()
}

/// 40x10 black frame with the first `changed` sampled pixels (step 4) set to white.
fn with_changed_samples(changed: usize, timestamp_ms: f64) -> Frame {
    let mut pixels = black(40, 10, 0.0).into_pixels();
    for sample in 0..changed {
        let offset = sample * 4 * 4;
        pixels[offset..offset + 3].copy_from_slice(&[255, 255, 255]);
    }
    Frame::new(pixels, 40, 10, timestamp_ms).unwrap()
}

fn renderer() -> OverlayRenderer<DisplayList> {
    OverlayRenderer::new(DisplayList::new(1, 1), OverlayStyle::default())
}

fn motion_context() -> TickContext {
    let config = RenderConfig {
        hands: false,
        pose: false,
        face: false,
        motion: true,
    };
    TickContext::new(config, MotionConfig::default(), ProviderRegistry::new())
}

fn tick(
    ctx: &mut TickContext,
    source: &mut ScriptedSource,
    renderer: &mut OverlayRenderer<DisplayList>,
) -> TickSummary {
    match run_tick(ctx, source, renderer).unwrap() {
        TickOutcome::Rendered { summary, .. } => summary,
        other => panic!("expected a rendered tick, got {:?}", other),
    }
}

#[test]
fn identical_frames_then_five_percent_change() {
    let mut source = ScriptedSource::new(vec![
        black(40, 10, 0.0),
        black(40, 10, 33.0),
        with_changed_samples(5, 66.0),
    ]);
    let mut ctx = motion_context();
    let mut renderer = renderer();

    assert!(!tick(&mut ctx, &mut source, &mut renderer).motion);
    let second = tick(&mut ctx, &mut source, &mut renderer);
    assert!(!second.motion);
    assert_eq!(second.motion_fraction, 0.0);
    assert_eq!(renderer.surface().fill_rects().count(), 0);

    let third = tick(&mut ctx, &mut source, &mut renderer);
    assert!(third.motion);
    assert!((third.motion_fraction - 0.05).abs() < 1e-6);
    assert_eq!(renderer.surface().fill_rects().count(), 5);

    assert!(matches!(
        run_tick(&mut ctx, &mut source, &mut renderer).unwrap(),
        TickOutcome::NotReady
    ));
}

#[test]
fn change_at_sensitivity_boundary_is_not_motion() {
    let mut source =
        ScriptedSource::new(vec![black(40, 10, 0.0), with_changed_samples(2, 33.0)]);
    let mut ctx = motion_context();
    let mut renderer = renderer();

    tick(&mut ctx, &mut source, &mut renderer);
    let summary = tick(&mut ctx, &mut source, &mut renderer);
    // 2 of 100 samples is exactly the 0.02 sensitivity, which must be exceeded.
    assert!(!summary.motion);
    assert_eq!(renderer.surface().fill_rects().count(), 2);
}

#[test]
fn resolution_change_resets_motion_and_resizes_overlay() {
    let mut source = ScriptedSource::new(vec![
        black(40, 10, 0.0),
        Frame::solid(20, 10, [255, 255, 255, 255], 33.0).unwrap(),
    ]);
    let mut ctx = motion_context();
    let mut renderer = renderer();

    tick(&mut ctx, &mut source, &mut renderer);
    assert_eq!(renderer.dimensions(), FrameDimensions::new(40, 10));
    let summary = tick(&mut ctx, &mut source, &mut renderer);
    assert!(!summary.motion);
    assert_eq!(renderer.dimensions(), FrameDimensions::new(20, 10));
}

#[test]
fn re_enabling_motion_starts_from_a_fresh_reference() {
    let mut source = ScriptedSource::new(vec![
        black(40, 10, 0.0),
        with_changed_samples(50, 33.0),
        black(40, 10, 66.0),
    ]);
    let mut ctx = motion_context();
    let mut renderer = renderer();

    tick(&mut ctx, &mut source, &mut renderer);
    assert!(tick(&mut ctx, &mut source, &mut renderer).motion);

    ctx.set_motion_enabled(false);
    ctx.set_motion_enabled(true);
    // The third frame differs from the second, but the reference was dropped.
    assert!(!tick(&mut ctx, &mut source, &mut renderer).motion);
}

#[test]
fn failing_provider_degrades_to_zero_entities() {
    let mut registry = ProviderRegistry::new();
    registry.register(StubProvider::new(Modality::Hands).failing_every(1));
    registry.register(StubProvider::new(Modality::Pose));
    let mut ctx = TickContext::new(RenderConfig::default(), MotionConfig::default(), registry);
    let mut source = ScriptedSource::new(vec![black(64, 48, 0.0), black(64, 48, 33.0)]);
    let mut renderer = renderer();

    for _ in 0..2 {
        let summary = tick(&mut ctx, &mut source, &mut renderer);
        assert_eq!(summary.hands, 0);
        assert!(summary.pose);
        assert_eq!(summary.faces, 0);
    }
    assert!(renderer.surface().texts().all(|t| !t.ends_with("Hand")));
    assert!(renderer.surface().texts().any(|t| t == "Person Detected"));
}

#[test]
fn stale_replay_keeps_the_previous_result() {
    let face = DetectedEntity::new(
        (0..478)
            .map(|i| Point::new(0.3 + (i % 20) as f32 * 0.01, 0.3 + (i / 20) as f32 * 0.01))
            .collect(),
    );
    let recording = Recording {
        modality: Modality::Face,
        frames: vec![
            RecordedFrame {
                timestamp_ms: 0.0,
                entities: vec![face],
            },
            RecordedFrame {
                timestamp_ms: 150.0,
                entities: vec![],
            },
        ],
    };
    let mut registry = ProviderRegistry::new();
    registry.register(ReplayProvider::new("recorded", recording).unwrap());
    let mut ctx = TickContext::new(RenderConfig::default(), MotionConfig::default(), registry);
    let mut source = ScriptedSource::new(vec![
        black(64, 48, 0.0),
        black(64, 48, 100.0),
        black(64, 48, 200.0),
    ]);
    let mut renderer = renderer();

    assert_eq!(tick(&mut ctx, &mut source, &mut renderer).faces, 1);
    // No newer recording at 100 ms: the face stays on screen.
    let held = tick(&mut ctx, &mut source, &mut renderer);
    assert_eq!(held.faces, 1);
    assert!(renderer.surface().texts().any(|t| t == "Face Detected"));
    // The 150 ms recording has no faces.
    assert_eq!(tick(&mut ctx, &mut source, &mut renderer).faces, 0);
}

#[test]
fn halting_stops_before_reading_a_frame() {
    let registry = ProviderRegistry::new();
    let mut ctx = TickContext::new(RenderConfig::default(), MotionConfig::default(), registry);
    let mut source = ScriptedSource::new(vec![black(8, 8, 0.0)]);
    let mut renderer = renderer();

    let running = ctx.running_flag();
    running.store(false, std::sync::atomic::Ordering::SeqCst);
    assert!(matches!(
        run_tick(&mut ctx, &mut source, &mut renderer).unwrap(),
        TickOutcome::Halted
    ));
    assert_eq!(source.stats().frames_captured, 0);
}
