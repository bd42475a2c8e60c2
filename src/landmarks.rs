//! Landmark data model shared by providers and the renderer.
//!
//! Providers for every modality return the same shape: a list of
//! `DetectedEntity`, each an ordered list of normalized `Point`s. The modality
//! tag decides which topology the renderer applies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Landmark count of a MediaPipe hand.
pub const HAND_POINTS: usize = 21;
/// Landmark count of a MediaPipe face mesh (with irises).
pub const FACE_POINTS: usize = 478;
/// Landmark count of a MediaPipe body pose.
pub const POSE_POINTS: usize = 33;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Hands,
    Pose,
    Face,
}

impl Modality {
    /// Render order within a tick (motion always runs before any of these).
    pub const ALL: [Modality; 3] = [Modality::Hands, Modality::Pose, Modality::Face];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Hands => "hands",
            Modality::Pose => "pose",
            Modality::Face => "face",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hands" | "hand" => Some(Modality::Hands),
            "pose" | "body" => Some(Modality::Pose),
            "face" | "faces" => Some(Modality::Face),
            _ => None,
        }
    }

    /// Expected point count for an entity of this modality.
    pub fn expected_points(&self) -> usize {
        match self {
            Modality::Hands => HAND_POINTS,
            Modality::Pose => POSE_POINTS,
            Modality::Face => FACE_POINTS,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized landmark. `x`/`y` are fractions of the frame width/height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Pixel-space position on a surface of the given size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }

    /// Points without a visibility score never pass the filter.
    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility.is_some_and(|v| v > min_visibility)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedEntity {
    pub points: Vec<Point>,
    /// Classification label, e.g. "Left"/"Right" handedness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl DetectedEntity {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            label: None,
            score: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn point(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }
}

/// Entities per modality for one tick. Discarded after the render pass.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    entities: BTreeMap<Modality, Vec<DetectedEntity>>,
}

impl DetectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, modality: Modality, entities: Vec<DetectedEntity>) {
        self.entities.insert(modality, entities);
    }

    /// Entities for a modality; empty when the modality produced nothing this tick.
    pub fn get(&self, modality: Modality) -> &[DetectedEntity] {
        self.entities
            .get(&modality)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, modality: Modality) -> usize {
        self.get(modality).len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_scales_to_pixels() {
        let p = Point::new(0.25, 0.5);
        assert_eq!(p.to_pixel(200, 100), (50.0, 50.0));
    }

    #[test]
    fn missing_visibility_is_not_visible() {
        assert!(!Point::new(0.1, 0.1).is_visible(0.5));
        assert!(!Point::new(0.1, 0.1).is_visible(0.0));
        assert!(!Point::new(0.1, 0.1).with_visibility(0.5).is_visible(0.5));
        assert!(Point::new(0.1, 0.1).with_visibility(0.51).is_visible(0.5));
    }

    #[test]
    fn modality_parses_aliases() {
        assert_eq!(Modality::parse("Hand"), Some(Modality::Hands));
        assert_eq!(Modality::parse(" body "), Some(Modality::Pose));
        assert_eq!(Modality::parse("motion"), None);
    }

    #[test]
    fn entity_deserializes_from_recorded_json() {
        let json = r#"{"label":"Left","points":[{"x":0.1,"y":0.2,"visibility":0.9}]}"#;
        let entity: DetectedEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.label.as_deref(), Some("Left"));
        assert_eq!(entity.points[0].visibility, Some(0.9));
        assert_eq!(entity.points[0].z, None);
    }

    #[test]
    fn detection_result_defaults_to_empty() {
        let mut result = DetectionResult::new();
        assert!(result.is_empty());
        result.insert(Modality::Face, vec![DetectedEntity::default()]);
        assert_eq!(result.count(Modality::Face), 1);
        assert_eq!(result.count(Modality::Hands), 0);
    }
}
