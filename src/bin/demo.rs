//! demo - end-to-end synthetic run of the overlay pipeline
//!
//! Drives the synthetic camera through stub landmark providers for
//! `--seconds` x `--fps` frames, writes every composited frame as a PNG and
//! finishes with a JSON summary of what was detected.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use vision_overlay::ingest::SyntheticSource;
use vision_overlay::render::load_font;
use vision_overlay::ui::{StatusLine, Ui, UiMode};
use vision_overlay::{
    run_tick, FrameSource, Modality, MotionConfig, OverlayRenderer, OverlayStyle,
    ProviderRegistry, RasterSurface, RenderConfig, SourceConfig, StubProvider, TickContext,
    TickOutcome,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration in seconds of synthetic video.
    #[arg(long, default_value_t = 3)]
    seconds: u64,
    /// Frames per second for the synthetic source.
    #[arg(long, default_value_t = 10)]
    fps: u32,
    #[arg(long, default_value_t = 640)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Hands reported by the stub hand provider.
    #[arg(long, default_value_t = 2)]
    hands: usize,
    /// Output directory for frames and summary.
    #[arg(long, default_value = "demo_out")]
    out: String,
    /// Terminal output: auto, plain or pretty.
    #[arg(long, default_value = "auto")]
    ui: String,
    /// Font for text labels in the PNG frames. Labels are left out without one.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize)]
struct DemoSummary {
    frames: u64,
    motion_frames: u64,
    pose_frames: u64,
    max_hands: usize,
    max_faces: usize,
    final_fps: u32,
    final_status: String,
    labels_rendered: bool,
    labels_skipped: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    let mode = UiMode::parse(&args.ui)
        .ok_or_else(|| anyhow!("--ui must be one of auto, plain, pretty"))?;
    let ui = Ui::new(mode, std::io::stderr().is_terminal());

    let out_dir = PathBuf::from(&args.out);
    let frames_dir = out_dir.join("frames");
    {
        let _stage = ui.stage("prepare output directory");
        fs::create_dir_all(&frames_dir)
            .with_context(|| format!("failed to create {}", frames_dir.display()))?;
    }

    let mut source = SyntheticSource::new(SourceConfig {
        url: "stub://demo".to_string(),
        width: args.width,
        height: args.height,
        fps: args.fps,
    });
    let mut ctx = {
        let _stage = ui.stage("connect source + providers");
        source.connect()?;
        let mut providers = ProviderRegistry::new();
        providers.register(StubProvider::new(Modality::Hands).with_entities(args.hands));
        providers.register(StubProvider::new(Modality::Pose));
        providers.register(StubProvider::new(Modality::Face));
        providers.warm_up()?;
        TickContext::new(RenderConfig::default(), MotionConfig::default(), providers)
    };

    let total = args.seconds * args.fps as u64;
    let mut surface = RasterSurface::new(args.width, args.height);
    if let Some(path) = &args.font {
        let _stage = ui.stage("load label font");
        surface = surface.with_font(load_font(path)?);
    }
    let mut renderer = OverlayRenderer::new(surface, OverlayStyle::default());
    let mut summary = DemoSummary {
        labels_rendered: renderer.surface().has_font(),
        ..DemoSummary::default()
    };
    {
        let _stage = ui.stage("render synthetic frames");
        let progress = ui.frames(total);
        while summary.frames < total {
            match run_tick(&mut ctx, &mut source, &mut renderer)? {
                TickOutcome::Rendered { summary: tick, frame } => {
                    summary.frames += 1;
                    summary.motion_frames += tick.motion as u64;
                    summary.pose_frames += tick.pose as u64;
                    summary.max_hands = summary.max_hands.max(tick.hands);
                    summary.max_faces = summary.max_faces.max(tick.faces);
                    summary.final_fps = tick.fps;

                    let status = StatusLine::from(&tick);
                    summary.final_status = status.to_string();
                    progress.set_message(summary.final_status.clone());
                    progress.inc(1);

                    let path = frames_dir.join(format!("frame_{:05}.png", summary.frames));
                    renderer.surface().save_composite(&frame, &path)?;
                }
                TickOutcome::NotReady | TickOutcome::Halted => {
                    return Err(anyhow!(
                        "synthetic source stopped after {} frames",
                        summary.frames
                    ));
                }
            }
        }
        progress.finish_and_clear();
    }

    summary.labels_skipped = renderer.surface().labels_skipped();
    {
        let _stage = ui.stage("write summary");
        write_summary(&out_dir.join("summary.json"), &summary)?;
    }

    println!("frames rendered: {}", summary.frames);
    println!("frames with motion: {}", summary.motion_frames);
    println!("last status: {}", summary.final_status);
    if summary.labels_skipped > 0 {
        println!(
            "text labels not drawn: {} (pass --font to include them)",
            summary.labels_skipped
        );
    }
    println!("output: {}", out_dir.display());
    Ok(())
}

fn write_summary(path: &Path, summary: &DemoSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
