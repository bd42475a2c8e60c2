//! Vision Overlay
//!
//! Draws annotations over a live camera feed: hand skeletons, face landmark
//! meshes, body pose skeletons, and highlights where pixels changed between
//! consecutive frames.
//!
//! # Architecture
//!
//! Landmark detection is delegated to external models behind the
//! `LandmarkProvider` seam. This crate owns everything around them:
//!
//! 1. **Frame sources** deliver RGBA frames with millisecond timestamps.
//! 2. **Motion detection** compares each frame with the previous one on a
//!    sampled grid and reports the changed fraction and regions.
//! 3. **Overlay rendering** turns landmarks and regions into draw commands
//!    painted onto a `Surface` (recorded, or rasterized to an image).
//! 4. **The frame loop** runs one tick per frame, in a fixed order, until the
//!    running flag is cleared.
//!
//! # Module Structure
//!
//! - `frame`: `Frame` snapshots and dimensions
//! - `ingest`: frame sources (synthetic, image sequence, V4L2)
//! - `landmarks`: normalized points, entities and per-modality results
//! - `motion`: frame-difference motion detector
//! - `detect`: landmark providers and their registry
//! - `render`: draw commands, surfaces and the overlay renderer
//! - `pipeline`: tick context and `run_tick`
//! - `config`: file + environment configuration

pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod landmarks;
pub mod motion;
pub mod pipeline;
pub mod render;
pub mod ui;

pub use config::OverlayConfig;
pub use detect::{LandmarkProvider, ProviderRegistry, ReplayProvider, StubProvider};
pub use frame::{Frame, FrameDimensions};
pub use ingest::{open_source, CaptureError, CaptureErrorKind, FrameSource, SourceConfig};
pub use landmarks::{DetectedEntity, DetectionResult, Modality, Point};
pub use motion::{MotionConfig, MotionDetector, MotionReport};
pub use pipeline::{
    run_tick, Overlay, RenderConfig, TickContext, TickOutcome, TickSummary, ToggleCommand,
};
pub use render::{DisplayList, OverlayRenderer, OverlayStyle, RasterSurface, Surface};
