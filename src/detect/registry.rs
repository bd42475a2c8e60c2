use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::landmarks::{DetectedEntity, Modality};

use super::provider::LandmarkProvider;

/// Outcome of polling one modality's provider for a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderPoll {
    /// Fresh entities from the provider.
    Fresh(Vec<DetectedEntity>),
    /// No new result; the previous result still applies.
    Stale,
    /// No provider registered for the modality.
    Missing,
}

/// One provider per modality.
///
/// Providers run on the tick thread only, so they are stored by value with no locking.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<Modality, Box<dyn LandmarkProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous provider for the same modality.
    pub fn register<P: LandmarkProvider + 'static>(&mut self, provider: P) {
        self.register_boxed(Box::new(provider));
    }

    pub fn register_boxed(&mut self, provider: Box<dyn LandmarkProvider>) {
        let modality = provider.modality();
        if let Some(previous) = self.providers.insert(modality, provider) {
            log::info!(
                "provider '{}' replaced for modality {}",
                previous.name(),
                modality
            );
        }
    }

    pub fn remove(&mut self, modality: Modality) -> Option<Box<dyn LandmarkProvider>> {
        self.providers.remove(&modality)
    }

    pub fn contains(&self, modality: Modality) -> bool {
        self.providers.contains_key(&modality)
    }

    /// `(modality, provider name)` pairs in render order.
    pub fn list(&self) -> Vec<(Modality, String)> {
        self.providers
            .iter()
            .map(|(modality, provider)| (*modality, provider.name().to_string()))
            .collect()
    }

    /// Run every provider's warm-up hook.
    pub fn warm_up(&mut self) -> Result<()> {
        for (modality, provider) in self.providers.iter_mut() {
            provider.warm_up().map_err(|e| {
                anyhow!(
                    "warm-up failed for {} provider '{}': {}",
                    modality,
                    provider.name(),
                    e
                )
            })?;
        }
        Ok(())
    }

    /// Poll the provider registered for `modality`.
    pub fn detect(
        &mut self,
        modality: Modality,
        frame: &Frame,
        timestamp_ms: f64,
    ) -> Result<ProviderPoll> {
        let Some(provider) = self.providers.get_mut(&modality) else {
            return Ok(ProviderPoll::Missing);
        };
        let poll = match provider.detect(frame, timestamp_ms)? {
            Some(entities) => ProviderPoll::Fresh(entities),
            None => ProviderPoll::Stale,
        };
        Ok(poll)
    }
}
