//! Drawing primitives and the `Surface` trait the renderer paints into.

use anyhow::{anyhow, Result};

/// RGBA color with straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| anyhow!("invalid color '{}'", value))
        };
        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(anyhow!("invalid color '{}'", value)),
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Bounding box of pixel-space points, `None` for an empty iterator.
    pub fn bounding(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::from_corners(min_x, min_y, max_x, max_y))
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        width: f32,
    },
    /// Filled circle with an optional outline.
    Circle {
        center: (f32, f32),
        radius: f32,
        fill: Color,
        outline: Option<Color>,
    },
    /// Open polyline; closed when the last point repeats the first.
    Polyline {
        points: Vec<(f32, f32)>,
        color: Color,
        width: f32,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    Text {
        position: (f32, f32),
        text: String,
        color: Color,
        size: f32,
    },
}

/// Destination for draw commands.
///
/// One surface is owned by one renderer for the duration of a tick.
pub trait Surface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resize to match the frame being annotated. Contents are discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// Erase everything drawn so far.
    fn clear(&mut self);

    fn draw(&mut self, command: &DrawCommand);
}

// ----------------------------------------------------------------------------
// DisplayList: records commands instead of rasterizing
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn lines(&self) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Line { from, to, .. } => Some((*from, *to)),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = ((f32, f32), f32)> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Circle { center, radius, .. } => Some((*center, *radius)),
            _ => None,
        })
    }

    pub fn stroke_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::StrokeRect { rect, .. } => Some(*rect),
            _ => None,
        })
    }

    pub fn fill_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::FillRect { rect, .. } => Some(*rect),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for DisplayList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() -> Result<()> {
        assert_eq!(Color::from_hex("#00ff00")?, Color::rgb(0, 255, 0));
        assert_eq!(Color::from_hex("ff000026")?, Color::rgba(255, 0, 0, 0x26));
        assert!(Color::from_hex("#0f0").is_err());
        assert!(Color::from_hex("#zz0000").is_err());
        Ok(())
    }

    #[test]
    fn bounding_box_with_margin() {
        let rect = Rect::bounding([(20.0, 60.0), (80.0, 10.0), (50.0, 30.0)])
            .unwrap()
            .expand(10.0);
        assert_eq!(rect, Rect::new(10.0, 0.0, 80.0, 70.0));
        assert_eq!(rect.right(), 90.0);
        assert_eq!(rect.bottom(), 70.0);
        assert!(Rect::bounding(std::iter::empty()).is_none());
    }

    #[test]
    fn display_list_clears() {
        let mut list = DisplayList::new(10, 10);
        list.draw(&DrawCommand::FillRect {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            color: Color::WHITE,
        });
        assert_eq!(list.commands().len(), 1);
        list.clear();
        assert!(list.commands().is_empty());
    }
}
