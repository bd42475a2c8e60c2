//! Overlay rendering.
//!
//! - `primitives`: colors, rectangles, draw commands, the `Surface` trait, `DisplayList`
//! - `topology`: fixed hand / face / pose landmark topologies
//! - `overlay`: `OverlayRenderer` and the per-modality command builders
//! - `raster`: `RasterSurface`, an RGBA image target for snapshots

mod overlay;
mod primitives;
mod raster;
pub mod topology;

pub use overlay::{
    face_commands, hand_commands, motion_commands, pose_commands, OverlayRenderer, OverlayStyle,
    FACE_LABEL, POSE_LABEL,
};
pub use primitives::{Color, DisplayList, DrawCommand, Rect, Surface};
pub use raster::{load_font, RasterSurface};
