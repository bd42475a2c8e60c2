//! Overlay renderer.
//!
//! Converts per-modality landmark entities into draw commands in pixel space and
//! paints them onto a `Surface`. The command builders are plain functions so
//! the geometry can be checked without a surface.

use crate::frame::{Frame, FrameDimensions};
use crate::landmarks::DetectedEntity;
use crate::motion::MotionDetector;

use super::primitives::{Color, DrawCommand, Rect, Surface};
use super::topology::{
    FACE_FEATURES, FACE_OVAL, HAND_CONNECTIONS, HAND_FINGERTIPS, HAND_WRIST, POSE_CONNECTIONS,
    POSE_KEY_JOINTS,
};

pub const HAND_LABEL_LEFT: &str = "Left";
pub const FACE_LABEL: &str = "Face Detected";
pub const POSE_LABEL: &str = "Person Detected";

/// Colors, radii and line widths used by the overlay.
#[derive(Clone, Debug)]
pub struct OverlayStyle {
    pub left_hand: Color,
    pub right_hand: Color,
    pub fingertip: Color,
    pub joint_outline: Color,
    pub hand_line_width: f32,
    pub hand_joint_radius: f32,
    pub fingertip_radius: f32,
    /// Vertical distance between an anchor point and the label drawn above it.
    pub label_offset: f32,
    pub label_size: f32,

    pub face: Color,
    pub face_point_radius: f32,
    pub face_contour: bool,
    pub face_contour_width: f32,
    pub face_features: bool,

    pub pose_line: Color,
    pub pose_line_width: f32,
    pub pose_joint: Color,
    pub pose_key_radius: f32,
    pub pose_joint_radius: f32,
    pub pose_min_visibility: f32,

    pub box_margin: f32,
    pub box_line_width: f32,

    pub motion: Color,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            left_hand: Color::rgb(0x00, 0xff, 0x00),
            right_hand: Color::rgb(0x00, 0x88, 0xff),
            fingertip: Color::rgb(0xff, 0xff, 0x00),
            joint_outline: Color::WHITE,
            hand_line_width: 2.0,
            hand_joint_radius: 4.0,
            fingertip_radius: 6.0,
            label_offset: 15.0,
            label_size: 16.0,

            face: Color::rgb(0xff, 0xff, 0x00),
            face_point_radius: 1.5,
            face_contour: true,
            face_contour_width: 1.0,
            face_features: false,

            pose_line: Color::rgb(0x00, 0xff, 0x00),
            pose_line_width: 3.0,
            pose_joint: Color::rgb(0xff, 0x00, 0xff),
            pose_key_radius: 6.0,
            pose_joint_radius: 4.0,
            pose_min_visibility: 0.5,

            box_margin: 10.0,
            box_line_width: 2.0,

            // rgba(255, 0, 0, 0.15)
            motion: Color::rgba(0xff, 0x00, 0x00, 38),
        }
    }
}

// ----------------------------------------------------------------------------
// Command builders
// ----------------------------------------------------------------------------

/// Skeleton, joints and handedness label for one hand.
pub fn hand_commands(
    entity: &DetectedEntity,
    dims: FrameDimensions,
    style: &OverlayStyle,
) -> Vec<DrawCommand> {
    let px = |i: usize| entity.point(i).map(|p| p.to_pixel(dims.width, dims.height));
    let color = if entity.label.as_deref() == Some(HAND_LABEL_LEFT) {
        style.left_hand
    } else {
        style.right_hand
    };

    let mut commands = Vec::with_capacity(HAND_CONNECTIONS.len() + entity.points.len() + 1);
    for &(a, b) in &HAND_CONNECTIONS {
        if let (Some(from), Some(to)) = (px(a), px(b)) {
            commands.push(DrawCommand::Line {
                from,
                to,
                color,
                width: style.hand_line_width,
            });
        }
    }

    for (index, point) in entity.points.iter().enumerate() {
        let fingertip = HAND_FINGERTIPS.contains(&index);
        commands.push(DrawCommand::Circle {
            center: point.to_pixel(dims.width, dims.height),
            radius: if fingertip {
                style.fingertip_radius
            } else {
                style.hand_joint_radius
            },
            fill: if fingertip { style.fingertip } else { color },
            outline: Some(style.joint_outline),
        });
    }

    if let Some((x, y)) = px(HAND_WRIST) {
        let text = match entity.label.as_deref() {
            Some(label) => format!("{label} Hand"),
            None => "Hand".to_string(),
        };
        commands.push(DrawCommand::Text {
            position: (x, y - style.label_offset),
            text,
            color,
            size: style.label_size,
        });
    }
    commands
}

/// Key-point dots, optional oval contour, bounding box and label for one face.
pub fn face_commands(
    entity: &DetectedEntity,
    dims: FrameDimensions,
    style: &OverlayStyle,
) -> Vec<DrawCommand> {
    let px = |i: usize| entity.point(i).map(|p| p.to_pixel(dims.width, dims.height));
    let mut commands = Vec::new();

    let features: &[usize] = if style.face_features {
        &FACE_FEATURES
    } else {
        &[]
    };
    for center in FACE_OVAL.iter().chain(features).filter_map(|&i| px(i)) {
        commands.push(DrawCommand::Circle {
            center,
            radius: style.face_point_radius,
            fill: style.face,
            outline: None,
        });
    }

    if style.face_contour {
        let mut contour: Vec<(f32, f32)> = FACE_OVAL.iter().filter_map(|&i| px(i)).collect();
        if let Some(&first) = contour.first() {
            contour.push(first);
            commands.push(DrawCommand::Polyline {
                points: contour,
                color: style.face,
                width: style.face_contour_width,
            });
        }
    }

    // The box covers the whole mesh, not only the drawn subset.
    let bounds = Rect::bounding(
        entity
            .points
            .iter()
            .map(|p| p.to_pixel(dims.width, dims.height)),
    );
    if let Some(bounds) = bounds {
        commands.push(DrawCommand::StrokeRect {
            rect: bounds.expand(style.box_margin),
            color: style.face,
            width: style.box_line_width,
        });
        commands.push(DrawCommand::Text {
            position: (bounds.x, bounds.y - style.label_offset),
            text: FACE_LABEL.to_string(),
            color: style.face,
            size: style.label_size,
        });
    }
    commands
}

/// Visibility-filtered skeleton, joints, bounding box and label for one body.
pub fn pose_commands(
    entity: &DetectedEntity,
    dims: FrameDimensions,
    style: &OverlayStyle,
) -> Vec<DrawCommand> {
    let visible = |i: usize| {
        entity
            .point(i)
            .filter(|p| p.is_visible(style.pose_min_visibility))
            .map(|p| p.to_pixel(dims.width, dims.height))
    };
    let mut commands = Vec::new();

    for &(a, b) in &POSE_CONNECTIONS {
        if let (Some(from), Some(to)) = (visible(a), visible(b)) {
            commands.push(DrawCommand::Line {
                from,
                to,
                color: style.pose_line,
                width: style.pose_line_width,
            });
        }
    }

    let mut visible_points = Vec::new();
    for index in 0..entity.points.len() {
        let Some(center) = visible(index) else {
            continue;
        };
        visible_points.push(center);
        commands.push(DrawCommand::Circle {
            center,
            radius: if POSE_KEY_JOINTS.contains(&index) {
                style.pose_key_radius
            } else {
                style.pose_joint_radius
            },
            fill: style.pose_joint,
            outline: Some(style.joint_outline),
        });
    }

    if let Some(bounds) = Rect::bounding(visible_points) {
        commands.push(DrawCommand::StrokeRect {
            rect: bounds.expand(style.box_margin),
            color: style.pose_line,
            width: style.box_line_width,
        });
        commands.push(DrawCommand::Text {
            position: (bounds.x, bounds.y - style.label_offset),
            text: POSE_LABEL.to_string(),
            color: style.pose_line,
            size: style.label_size,
        });
    }
    commands
}

/// Translucent highlight for each changed motion sample.
pub fn motion_commands(regions: &[Rect], style: &OverlayStyle) -> Vec<DrawCommand> {
    regions
        .iter()
        .map(|&rect| DrawCommand::FillRect {
            rect,
            color: style.motion,
        })
        .collect()
}

// ----------------------------------------------------------------------------
// OverlayRenderer
// ----------------------------------------------------------------------------

pub struct OverlayRenderer<S: Surface> {
    surface: S,
    style: OverlayStyle,
}

impl<S: Surface> OverlayRenderer<S> {
    pub fn new(surface: S, style: OverlayStyle) -> Self {
        Self { surface, style }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut OverlayStyle {
        &mut self.style
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn dimensions(&self) -> FrameDimensions {
        FrameDimensions::new(self.surface.width(), self.surface.height())
    }

    /// Match the surface to the frame size, e.g. after the capture resolution changes.
    pub fn fit_to(&mut self, dims: FrameDimensions) {
        if self.dimensions() != dims {
            log::debug!("overlay: resizing surface to {}x{}", dims.width, dims.height);
            self.surface.resize(dims.width, dims.height);
        }
    }

    pub fn clear_surface(&mut self) {
        self.surface.clear();
    }

    /// Returns the number of hands drawn.
    pub fn render_hands(&mut self, entities: &[DetectedEntity]) -> usize {
        let dims = self.dimensions();
        for entity in entities {
            let commands = hand_commands(entity, dims, &self.style);
            self.paint(&commands);
        }
        entities.len()
    }

    /// Returns the number of faces drawn.
    pub fn render_face(&mut self, entities: &[DetectedEntity]) -> usize {
        let dims = self.dimensions();
        for entity in entities {
            let commands = face_commands(entity, dims, &self.style);
            self.paint(&commands);
        }
        entities.len()
    }

    /// Draws the first body only; multi-person pose is not supported.
    ///
    /// Returns true when a body was supplied, even if none of its joints passed
    /// the visibility filter.
    pub fn render_pose(&mut self, entities: &[DetectedEntity]) -> bool {
        let Some(entity) = entities.first() else {
            return false;
        };
        if entities.len() > 1 {
            log::debug!(
                "overlay: {} bodies supplied, drawing the first only",
                entities.len()
            );
        }
        let commands = pose_commands(entity, self.dimensions(), &self.style);
        self.paint(&commands);
        true
    }

    pub fn render_motion(&mut self, regions: &[Rect]) {
        let commands = motion_commands(regions, &self.style);
        self.paint(&commands);
    }

    /// Run the detector on `frame` and paint the changed regions in one step.
    pub fn detect_and_render_motion(
        &mut self,
        detector: &mut MotionDetector,
        frame: &Frame,
    ) -> bool {
        let report = detector.detect(frame, self.dimensions());
        self.render_motion(&report.regions);
        report.detected
    }

    fn paint(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            self.surface.draw(command);
        }
    }
}
