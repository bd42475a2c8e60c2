//! Raster surface backed by an RGBA image.
//!
//! Draw commands are alpha-blended into a transparent overlay layer, which can
//! then be composited over the source frame and written out as PNG. No font is
//! bundled: text labels are rasterized only once a font has been loaded with
//! [`RasterSurface::with_font`], and are counted as skipped otherwise.

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut,
    draw_text_mut, Blend,
};
use imageproc::rect::Rect as PixelRect;
use std::path::Path;

use super::primitives::{Color, DrawCommand, Rect, Surface};
use crate::frame::Frame;

pub struct RasterSurface {
    canvas: Blend<RgbaImage>,
    font: Option<FontVec>,
    labels_skipped: u64,
}

/// Read a TrueType/OpenType font for label rendering.
pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow!("invalid font {}: {}", path.display(), e))
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Blend(RgbaImage::new(width, height)),
            font: None,
            labels_skipped: 0,
        }
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// The overlay layer on its own (transparent where nothing was drawn).
    pub fn overlay(&self) -> &RgbaImage {
        &self.canvas.0
    }

    /// Text commands dropped for lack of a font.
    pub fn labels_skipped(&self) -> u64 {
        self.labels_skipped
    }

    /// The overlay layer composited over `frame`.
    pub fn composite(&self, frame: &Frame) -> Result<RgbaImage> {
        let mut base = RgbaImage::from_raw(frame.width, frame.height, frame.pixels().to_vec())
            .context("frame buffer does not match its dimensions")?;
        imageops::overlay(&mut base, &self.canvas.0, 0, 0);
        Ok(base)
    }

    pub fn save_composite(&self, frame: &Frame, path: &Path) -> Result<()> {
        self.composite(frame)?
            .save(path)
            .with_context(|| format!("writing snapshot to {}", path.display()))
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba<u8>, width: f32) {
        // Thick lines are approximated by parallel 1px segments.
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = (dx * dx + dy * dy).sqrt();
        let passes = width.round().max(1.0) as i32;
        let (nx, ny) = if len > f32::EPSILON {
            (-dy / len, dx / len)
        } else {
            (0.0, 0.0)
        };
        for pass in 0..passes {
            let shift = pass as f32 - (passes - 1) as f32 / 2.0;
            draw_line_segment_mut(
                &mut self.canvas,
                (from.0 + nx * shift, from.1 + ny * shift),
                (to.0 + nx * shift, to.1 + ny * shift),
                color,
            );
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, width: f32) {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.right(), rect.bottom()),
            (rect.x, rect.bottom()),
        ];
        for i in 0..corners.len() {
            self.line(corners[i], corners[(i + 1) % corners.len()], color, width);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let Some(rect) = clip(rect, self.width(), self.height()) else {
            return;
        };
        draw_filled_rect_mut(&mut self.canvas, rect, color);
    }
}

impl Surface for RasterSurface {
    fn width(&self) -> u32 {
        self.canvas.0.width()
    }

    fn height(&self) -> u32 {
        self.canvas.0.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas = Blend(RgbaImage::new(width, height));
    }

    fn clear(&mut self) {
        let clear = Rgba(Color::TRANSPARENT.to_array());
        for pixel in self.canvas.0.pixels_mut() {
            *pixel = clear;
        }
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Line {
                from,
                to,
                color,
                width,
            } => self.line(*from, *to, rgba(*color), *width),
            DrawCommand::Circle {
                center,
                radius,
                fill,
                outline,
            } => {
                let c = (center.0.round() as i32, center.1.round() as i32);
                let r = radius.round().max(1.0) as i32;
                draw_filled_circle_mut(&mut self.canvas, c, r, rgba(*fill));
                if let Some(outline) = outline {
                    draw_hollow_circle_mut(&mut self.canvas, c, r, rgba(*outline));
                }
            }
            DrawCommand::Polyline {
                points,
                color,
                width,
            } => {
                for pair in points.windows(2) {
                    self.line(pair[0], pair[1], rgba(*color), *width);
                }
            }
            DrawCommand::StrokeRect { rect, color, width } => {
                self.stroke_rect(*rect, rgba(*color), *width)
            }
            DrawCommand::FillRect { rect, color } => self.fill_rect(*rect, rgba(*color)),
            DrawCommand::Text {
                position,
                text,
                color,
                size,
            } => match &self.font {
                Some(font) => {
                    // Label positions are baselines; imageproc anchors at the top.
                    let x = position.0.round() as i32;
                    let y = (position.1 - size).round() as i32;
                    draw_text_mut(
                        &mut self.canvas,
                        rgba(*color),
                        x,
                        y,
                        PxScale::from(*size),
                        font,
                        text,
                    );
                }
                None => self.labels_skipped += 1,
            },
        }
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

/// Integer rectangle inside the canvas, or `None` when nothing remains.
fn clip(rect: Rect, width: u32, height: u32) -> Option<PixelRect> {
    let x0 = rect.x.floor().max(0.0);
    let y0 = rect.y.floor().max(0.0);
    let x1 = rect.right().ceil().min(width as f32);
    let y1 = rect.bottom().ceil().min(height as f32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect::at(x0 as i32, y0 as i32).of_size((x1 - x0) as u32, (y1 - y0) as u32))
}
