use anyhow::{anyhow, Result};
use std::f32::consts::TAU;

use crate::detect::provider::LandmarkProvider;
use crate::frame::Frame;
use crate::landmarks::{DetectedEntity, Modality, Point, FACE_POINTS, HAND_POINTS};

/// Stub provider for demos and tests.
///
/// Produces deterministic synthetic geometry that drifts slowly with the
/// timestamp so rendered output visibly moves.
pub struct StubProvider {
    modality: Modality,
    entities: usize,
    visibility: f32,
    fail_every: Option<u64>,
    calls: u64,
}

impl StubProvider {
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            entities: 1,
            visibility: 0.9,
            fail_every: None,
            calls: 0,
        }
    }

    /// Number of entities returned per call.
    pub fn with_entities(mut self, entities: usize) -> Self {
        self.entities = entities;
        self
    }

    /// Visibility attached to pose landmarks.
    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = visibility;
        self
    }

    /// Fail on every `n`-th call (1 fails every call).
    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    fn entity(&self, index: usize, timestamp_ms: f64) -> DetectedEntity {
        let drift = ((timestamp_ms / 1000.0) as f32).sin() * 0.05;
        // spread entities horizontally
        let cx = (index as f32 + 1.0) / (self.entities as f32 + 1.0) + drift;
        match self.modality {
            Modality::Hands => {
                let label = if index % 2 == 0 { "Left" } else { "Right" };
                synthetic_hand(cx, 0.6).with_label(label)
            }
            Modality::Face => synthetic_face(cx, 0.35),
            Modality::Pose => synthetic_pose(cx, self.visibility),
        }
    }
}

impl LandmarkProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    fn detect(
        &mut self,
        _frame: &Frame,
        timestamp_ms: f64,
    ) -> Result<Option<Vec<DetectedEntity>>> {
        self.calls += 1;
        if let Some(n) = self.fail_every {
            if self.calls % n == 0 {
                return Err(anyhow!(
                    "stub {} provider failure on call {}",
                    self.modality,
                    self.calls
                ));
            }
        }
        let entities = (0..self.entities)
            .map(|index| self.entity(index, timestamp_ms))
            .collect();
        Ok(Some(entities))
    }
}

/// Wrist at (cx, cy), five fingers fanning upward.
fn synthetic_hand(cx: f32, cy: f32) -> DetectedEntity {
    let mut points = Vec::with_capacity(HAND_POINTS);
    points.push(Point::new(cx, cy));
    for finger in 0..5 {
        let angle = -TAU / 4.0 + (finger as f32 - 2.0) * 0.3;
        for joint in 1..=4 {
            let reach = 0.03 * joint as f32;
            points.push(Point::new(cx + angle.cos() * reach, cy + angle.sin() * reach));
        }
    }
    DetectedEntity::new(points)
}

/// Concentric rings approximating a face mesh.
fn synthetic_face(cx: f32, cy: f32) -> DetectedEntity {
    let points = (0..FACE_POINTS)
        .map(|i| {
            let angle = i as f32 / FACE_POINTS as f32 * TAU * 7.0;
            let ring = 1.0 - (i % 4) as f32 * 0.2;
            Point::new(cx + angle.cos() * 0.08 * ring, cy + angle.sin() * 0.11 * ring)
        })
        .collect();
    DetectedEntity::new(points)
}

/// Standing figure in MediaPipe pose order.
fn synthetic_pose(cx: f32, visibility: f32) -> DetectedEntity {
    const LAYOUT: [(f32, f32); 33] = [
        (0.0, 0.10),   // nose
        (-0.01, 0.09), // left eye inner
        (-0.02, 0.09),
        (-0.03, 0.09),
        (0.01, 0.09), // right eye inner
        (0.02, 0.09),
        (0.03, 0.09),
        (-0.04, 0.10), // ears
        (0.04, 0.10),
        (-0.01, 0.12), // mouth
        (0.01, 0.12),
        (-0.08, 0.22), // shoulders
        (0.08, 0.22),
        (-0.12, 0.35), // elbows
        (0.12, 0.35),
        (-0.14, 0.47), // wrists
        (0.14, 0.47),
        (-0.15, 0.50), // pinkies
        (0.15, 0.50),
        (-0.14, 0.51), // index
        (0.14, 0.51),
        (-0.13, 0.49), // thumbs
        (0.13, 0.49),
        (-0.05, 0.50), // hips
        (0.05, 0.50),
        (-0.06, 0.68), // knees
        (0.06, 0.68),
        (-0.06, 0.86), // ankles
        (0.06, 0.86),
        (-0.07, 0.88), // heels
        (0.07, 0.88),
        (-0.03, 0.90), // foot index
        (0.03, 0.90),
    ];
    let points = LAYOUT
        .iter()
        .map(|&(dx, y)| Point::new(cx + dx, y).with_visibility(visibility))
        .collect();
    DetectedEntity::new(points)
}
