use anyhow::Result;

use crate::frame::Frame;
use crate::landmarks::{DetectedEntity, Modality};

/// Landmark provider trait.
///
/// A provider wraps an external landmark model for one modality. The overlay
/// never inspects how detection is done; it only consumes entities.
///
/// Return values of `detect`:
/// - `Ok(Some(entities))`: a fresh result for this tick (possibly empty)
/// - `Ok(None)`: nothing new since the previous call; the caller keeps the last result
/// - `Err(_)`: a recoverable failure for this tick only
pub trait LandmarkProvider {
    /// Provider identifier.
    fn name(&self) -> &str;

    /// The modality this provider detects.
    fn modality(&self) -> Modality;

    /// Run detection on a frame captured at `timestamp_ms`.
    fn detect(
        &mut self,
        frame: &Frame,
        timestamp_ms: f64,
    ) -> Result<Option<Vec<DetectedEntity>>>;

    /// Optional warm-up hook, called once before the first tick.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
