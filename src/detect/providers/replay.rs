//! Replay provider.
//!
//! Plays back landmark results recorded from a real model run, keyed by
//! capture timestamp. Recording format (JSON):
//!
//! ```json
//! {
//!   "modality": "hands",
//!   "frames": [
//!     { "timestamp_ms": 0.0, "entities": [ { "label": "Left", "points": [ { "x": 0.5, "y": 0.5 } ] } ] }
//!   ]
//! }
//! ```
//!
//! Pose points carry a `"visibility"` score; pose points recorded without one
//! are not drawn.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detect::provider::LandmarkProvider;
use crate::frame::Frame;
use crate::landmarks::{DetectedEntity, Modality};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recording {
    pub modality: Modality,
    pub frames: Vec<RecordedFrame>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub timestamp_ms: f64,
    #[serde(default)]
    pub entities: Vec<DetectedEntity>,
}

pub struct ReplayProvider {
    name: String,
    recording: Recording,
    last_emitted: Option<usize>,
}

impl ReplayProvider {
    pub fn new(name: impl Into<String>, mut recording: Recording) -> Result<Self> {
        if recording
            .frames
            .iter()
            .any(|f| !f.timestamp_ms.is_finite())
        {
            return Err(anyhow!("recording contains a non-finite timestamp"));
        }
        recording
            .frames
            .sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
        Ok(Self {
            name: name.into(),
            recording,
            last_emitted: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recording {}", path.display()))?;
        let recording: Recording = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid recording {}: {}", path.display(), e))?;
        log::info!(
            "ReplayProvider: loaded {} {} frames from {}",
            recording.frames.len(),
            recording.modality,
            path.display()
        );
        Self::new(format!("replay:{}", path.display()), recording)
    }

    pub fn len(&self) -> usize {
        self.recording.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recording.frames.is_empty()
    }

    /// Index of the latest recorded frame at or before `timestamp_ms`.
    fn index_at(&self, timestamp_ms: f64) -> Option<usize> {
        let after = self
            .recording
            .frames
            .partition_point(|f| f.timestamp_ms <= timestamp_ms);
        after.checked_sub(1)
    }
}

impl LandmarkProvider for ReplayProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn modality(&self) -> Modality {
        self.recording.modality
    }

    fn detect(
        &mut self,
        _frame: &Frame,
        timestamp_ms: f64,
    ) -> Result<Option<Vec<DetectedEntity>>> {
        let Some(index) = self.index_at(timestamp_ms) else {
            return Ok(None);
        };
        if self.last_emitted == Some(index) {
            return Ok(None);
        }
        self.last_emitted = Some(index);
        Ok(Some(self.recording.frames[index].entities.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point;

    fn recording() -> Recording {
        let entity = |x: f32| DetectedEntity::new(vec![Point::new(x, 0.5)]);
        Recording {
            modality: Modality::Face,
            frames: vec![
                RecordedFrame {
                    timestamp_ms: 100.0,
                    entities: vec![entity(0.2)],
                },
                RecordedFrame {
                    timestamp_ms: 0.0,
                    entities: vec![entity(0.1)],
                },
                RecordedFrame {
                    timestamp_ms: 200.0,
                    entities: vec![],
                },
            ],
        }
    }

    fn frame() -> Frame {
        Frame::solid(2, 2, [0, 0, 0, 255], 0.0).unwrap()
    }

    #[test]
    fn replays_latest_frame_then_reports_stale() -> Result<()> {
        let mut provider = ReplayProvider::new("test", recording())?;
        let first = provider.detect(&frame(), 50.0)?.unwrap();
        assert_eq!(first[0].points[0].x, 0.1);
        assert!(provider.detect(&frame(), 60.0)?.is_none());

        let second = provider.detect(&frame(), 150.0)?.unwrap();
        assert_eq!(second[0].points[0].x, 0.2);

        let third = provider.detect(&frame(), 1_000.0)?.unwrap();
        assert!(third.is_empty());
        Ok(())
    }

    #[test]
    fn nothing_before_first_recorded_frame() -> Result<()> {
        let mut rec = recording();
        rec.frames.retain(|f| f.timestamp_ms > 0.0);
        let mut provider = ReplayProvider::new("test", rec)?;
        assert!(provider.detect(&frame(), 10.0)?.is_none());
        Ok(())
    }

    #[test]
    fn loads_recording_from_json_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        let json = r#"{
            "modality": "hands",
            "frames": [
                { "timestamp_ms": 0.0, "entities": [ { "label": "Right", "points": [ { "x": 0.5, "y": 0.4 } ] } ] }
            ]
        }"#;
        std::io::Write::write_all(&mut file, json.as_bytes())?;

        let mut provider = ReplayProvider::from_path(file.path())?;
        assert_eq!(provider.modality(), Modality::Hands);
        assert_eq!(provider.len(), 1);
        let entities = provider.detect(&frame(), 0.0)?.unwrap();
        assert_eq!(entities[0].label.as_deref(), Some("Right"));
        Ok(())
    }

    #[test]
    fn rejects_invalid_json() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        std::io::Write::write_all(&mut file, b"{ not json")?;
        assert!(ReplayProvider::from_path(file.path()).is_err());
        Ok(())
    }
}
