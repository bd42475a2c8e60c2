//! overlayd - live overlay loop
//!
//! This daemon:
//! 1. Loads configuration (file named by OVERLAY_CONFIG or --config, then env overrides)
//! 2. Opens and connects the configured frame source
//! 3. Instantiates one landmark provider per enabled modality
//! 4. Runs one overlay tick per frame until Ctrl-C or the source runs out
//! 5. Optionally writes composited PNG snapshots
//!
//! Overlays can be switched while running by typing commands on stdin, one per
//! line: `hands`, `pose`, `face` or `motion`, optionally followed by `on`/`off`.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use vision_overlay::ingest::capture_error_kind;
use vision_overlay::ui::StatusLine;
use vision_overlay::render::load_font;
use vision_overlay::{
    open_source, run_tick, CaptureError, OverlayConfig, OverlayRenderer, OverlayStyle,
    RasterSurface, TickContext, TickOutcome, ToggleCommand,
};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);
const NOT_READY_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (TOML or JSON). Overrides OVERLAY_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many rendered frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Process frames as fast as the source delivers them instead of pacing to the capture fps.
    #[arg(long)]
    unpaced: bool,
    /// Ignore overlay toggle commands on stdin.
    #[arg(long)]
    no_toggles: bool,
}

/// Forward parsed toggle commands from stdin until it closes.
fn spawn_toggle_reader() -> Receiver<ToggleCommand> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match ToggleCommand::parse(&line) {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("ignoring toggle: {}", e),
            }
        }
    });
    rx
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => OverlayConfig::load_from(Some(path.as_path()))?,
        None => OverlayConfig::load()?,
    };

    let mut source = open_source(&config.capture)?;
    if let Err(err) = source.connect() {
        let kind = capture_error_kind(&err);
        log::error!("{}", CaptureError::new(kind, "").user_message());
        return Err(err.context(format!("failed to open {}", config.capture.url)));
    }

    let mut providers = config.build_providers()?;
    providers.warm_up()?;
    for (modality, name) in providers.list() {
        log::info!("provider {}: {}", modality, name);
    }

    let mut ctx = TickContext::new(config.render, config.motion_config(), providers);
    let running = ctx.running_flag();
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;

    if let Some(dir) = &config.output.snapshot_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| anyhow!("failed to create snapshot dir {}: {}", dir.display(), e))?;
    }

    let mut surface = RasterSurface::new(config.capture.width, config.capture.height);
    if let Some(path) = &config.output.font {
        surface = surface.with_font(load_font(path)?);
        log::info!("labels rendered with {}", path.display());
    }
    let mut renderer = OverlayRenderer::new(surface, OverlayStyle::default());
    let toggles = if args.no_toggles {
        None
    } else {
        Some(spawn_toggle_reader())
    };
    let frame_interval = Duration::from_secs_f64(1.0 / config.capture.fps as f64);
    let mut rendered = 0u64;
    let mut last_status = StatusLine::default();
    let mut last_health_log = Instant::now();

    log::info!(
        "overlayd running. source={} ({}x{} @ {} fps)",
        config.capture.url,
        config.capture.width,
        config.capture.height,
        config.capture.fps
    );

    loop {
        if let Some(toggles) = &toggles {
            for command in toggles.try_iter() {
                ctx.apply(command);
            }
        }
        let tick_started = Instant::now();
        match run_tick(&mut ctx, &mut *source, &mut renderer)? {
            TickOutcome::Halted => {
                log::info!("shutdown signal received, stopping");
                break;
            }
            TickOutcome::NotReady => {
                if source.is_finished() {
                    log::info!("source exhausted after {} frames", rendered);
                    break;
                }
                std::thread::sleep(NOT_READY_BACKOFF);
                continue;
            }
            TickOutcome::Rendered { summary, frame } => {
                rendered += 1;
                let status = StatusLine::from(&summary);
                if status != last_status {
                    log::debug!("{}", status);
                    last_status = status;
                }
                if let Some(dir) = &config.output.snapshot_dir {
                    if rendered % config.output.snapshot_every == 0 {
                        let path = dir.join(format!("overlay_{:06}.png", rendered));
                        match renderer.surface().save_composite(&frame, &path) {
                            Ok(()) => log::debug!("snapshot written to {}", path.display()),
                            Err(e) => log::warn!("snapshot failed: {:#}", e),
                        }
                    }
                }
            }
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} source={} | {}",
                source.is_healthy(),
                stats.frames_captured,
                stats.source,
                last_status
            );
            last_health_log = Instant::now();
        }

        if args.max_frames.is_some_and(|max| rendered >= max) {
            log::info!("rendered {} frames, stopping", rendered);
            break;
        }
        if !args.unpaced {
            if let Some(remaining) = frame_interval.checked_sub(tick_started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    let skipped = renderer.surface().labels_skipped();
    if skipped > 0 {
        log::warn!(
            "{} text labels were left out of snapshots; set output.font or OVERLAY_FONT",
            skipped
        );
    }
    Ok(())
}
