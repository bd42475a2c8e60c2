//! Landmark providers.
//!
//! Detection models are external collaborators. This module defines the seam
//! they plug into (`LandmarkProvider`), a per-modality registry, and two
//! in-tree providers: `ReplayProvider` (recorded results) and `StubProvider`
//! (synthetic geometry).

mod provider;
mod providers;
mod registry;

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::landmarks::Modality;

pub use provider::LandmarkProvider;
pub use providers::{RecordedFrame, Recording, ReplayProvider, StubProvider};
pub use registry::{ProviderPoll, ProviderRegistry};

/// Build a provider from a config spec: `"stub"`, `"replay:<path>"` or `"none"`.
pub fn provider_from_spec(
    modality: Modality,
    spec: &str,
) -> Result<Option<Box<dyn LandmarkProvider>>> {
    let spec = spec.trim();
    if spec.is_empty() || spec == "none" {
        return Ok(None);
    }
    if spec == "stub" {
        return Ok(Some(Box::new(StubProvider::new(modality))));
    }
    if let Some(path) = spec.strip_prefix("replay:") {
        let provider = ReplayProvider::from_path(Path::new(path))?;
        if provider.modality() != modality {
            return Err(anyhow!(
                "recording {} holds {} landmarks, configured for {}",
                path,
                provider.modality(),
                modality
            ));
        }
        return Ok(Some(Box::new(provider)));
    }
    Err(anyhow!(
        "unknown provider '{}' for {} (expected stub, replay:<path> or none)",
        spec,
        modality
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_specs() -> Result<()> {
        assert!(provider_from_spec(Modality::Hands, "none")?.is_none());
        assert!(provider_from_spec(Modality::Hands, "")?.is_none());
        let stub = provider_from_spec(Modality::Face, "stub")?.unwrap();
        assert_eq!(stub.modality(), Modality::Face);
        assert!(provider_from_spec(Modality::Face, "mediapipe").is_err());
        assert!(provider_from_spec(Modality::Face, "replay:/nonexistent/rec.json").is_err());
        Ok(())
    }

    #[test]
    fn replay_spec_checks_modality() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        std::io::Write::write_all(&mut file, br#"{"modality":"pose","frames":[]}"#)?;
        let spec = format!("replay:{}", file.path().display());
        assert!(provider_from_spec(Modality::Hands, &spec).is_err());
        assert!(provider_from_spec(Modality::Pose, &spec)?.is_some());
        Ok(())
    }
}
