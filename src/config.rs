use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::{provider_from_spec, ProviderRegistry};
use crate::ingest::{
    SourceConfig, DEFAULT_CAPTURE_FPS, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH,
    DEFAULT_SOURCE_URL,
};
use crate::landmarks::Modality;
use crate::motion::{
    MotionConfig, DEFAULT_MOTION_SENSITIVITY, DEFAULT_MOTION_STEP, DEFAULT_MOTION_THRESHOLD,
};
use crate::pipeline::{Overlay, RenderConfig};

const DEFAULT_PROVIDER: &str = "stub";
const DEFAULT_SNAPSHOT_EVERY: u64 = 30;

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    capture: Option<CaptureConfigFile>,
    modalities: Option<ModalitiesConfigFile>,
    motion: Option<MotionConfigFile>,
    providers: Option<ProvidersConfigFile>,
    output: Option<OutputConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    source: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModalitiesConfigFile {
    hands: Option<bool>,
    pose: Option<bool>,
    face: Option<bool>,
    motion: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct MotionConfigFile {
    threshold: Option<u32>,
    sensitivity: Option<f32>,
    step: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ProvidersConfigFile {
    hands: Option<String>,
    pose: Option<String>,
    face: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    snapshot_dir: Option<PathBuf>,
    snapshot_every: Option<u64>,
    font: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub capture: SourceConfig,
    pub render: RenderConfig,
    pub motion: MotionSettings,
    pub providers: ProviderSettings,
    pub output: OutputSettings,
}

/// Motion tuning as configured. `threshold` is kept wide until validated.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSettings {
    pub threshold: u32,
    pub sensitivity: f32,
    pub step: usize,
}

/// Provider spec per modality: `stub`, `replay:<path>` or `none`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub hands: String,
    pub pose: String,
    pub face: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub snapshot_dir: Option<PathBuf>,
    /// Save a composite every N rendered frames.
    pub snapshot_every: u64,
    /// TrueType/OpenType font for snapshot labels; labels are skipped without one.
    pub font: Option<PathBuf>,
}

impl ProviderSettings {
    pub fn spec(&self, modality: Modality) -> &str {
        match modality {
            Modality::Hands => &self.hands,
            Modality::Pose => &self.pose,
            Modality::Face => &self.face,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::from_file(OverlayConfigFile::default())
    }
}

impl OverlayConfig {
    /// Load from the file named by `OVERLAY_CONFIG`, if set.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OVERLAY_CONFIG")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load from `path` (or defaults), then apply env overrides and validate.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OverlayConfigFile) -> Self {
        let capture = file.capture.unwrap_or_default();
        let modalities = file.modalities.unwrap_or_default();
        let motion = file.motion.unwrap_or_default();
        let providers = file.providers.unwrap_or_default();
        let output = file.output.unwrap_or_default();

        Self {
            capture: SourceConfig {
                url: capture
                    .source
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                width: capture.width.unwrap_or(DEFAULT_CAPTURE_WIDTH),
                height: capture.height.unwrap_or(DEFAULT_CAPTURE_HEIGHT),
                fps: capture.fps.unwrap_or(DEFAULT_CAPTURE_FPS),
            },
            render: RenderConfig {
                hands: modalities.hands.unwrap_or(true),
                pose: modalities.pose.unwrap_or(true),
                face: modalities.face.unwrap_or(true),
                motion: modalities.motion.unwrap_or(true),
            },
            motion: MotionSettings {
                threshold: motion.threshold.unwrap_or(DEFAULT_MOTION_THRESHOLD as u32),
                sensitivity: motion.sensitivity.unwrap_or(DEFAULT_MOTION_SENSITIVITY),
                step: motion.step.unwrap_or(DEFAULT_MOTION_STEP),
            },
            providers: ProviderSettings {
                hands: providers
                    .hands
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                pose: providers
                    .pose
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                face: providers
                    .face
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            },
            output: OutputSettings {
                snapshot_dir: output.snapshot_dir,
                snapshot_every: output.snapshot_every.unwrap_or(DEFAULT_SNAPSHOT_EVERY),
                font: output.font,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("OVERLAY_SOURCE") {
            if !source.trim().is_empty() {
                self.capture.url = source;
            }
        }
        if let Ok(threshold) = std::env::var("OVERLAY_MOTION_THRESHOLD") {
            self.motion.threshold = threshold.trim().parse().map_err(|_| {
                anyhow!("OVERLAY_MOTION_THRESHOLD must be an integer between 0 and 255")
            })?;
        }
        if let Ok(sensitivity) = std::env::var("OVERLAY_MOTION_SENSITIVITY") {
            self.motion.sensitivity = sensitivity.trim().parse().map_err(|_| {
                anyhow!("OVERLAY_MOTION_SENSITIVITY must be a number between 0 and 1")
            })?;
        }
        if let Ok(disabled) = std::env::var("OVERLAY_DISABLE") {
            for name in split_csv(&disabled) {
                match Overlay::parse(&name) {
                    Some(Overlay::Motion) => self.render.motion = false,
                    Some(Overlay::Landmarks(modality)) => self.render.set(modality, false),
                    None => {
                        return Err(anyhow!(
                            "OVERLAY_DISABLE entry '{}' is not one of hands, pose, face, motion",
                            name
                        ))
                    }
                }
            }
        }
        if let Ok(dir) = std::env::var("OVERLAY_SNAPSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.output.snapshot_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(font) = std::env::var("OVERLAY_FONT") {
            if !font.trim().is_empty() {
                self.output.font = Some(PathBuf::from(font));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.capture.url.trim().is_empty() {
            return Err(anyhow!("capture source must not be empty"));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow!(
                "capture dimensions must be non-zero, got {}x{}",
                self.capture.width,
                self.capture.height
            ));
        }
        if self.capture.fps == 0 {
            return Err(anyhow!("capture fps must be at least 1"));
        }
        if self.motion.threshold > u8::MAX as u32 {
            return Err(anyhow!(
                "motion threshold must be between 0 and 255, got {}",
                self.motion.threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.motion.sensitivity) {
            return Err(anyhow!(
                "motion sensitivity must be between 0 and 1, got {}",
                self.motion.sensitivity
            ));
        }
        if self.motion.step == 0 {
            return Err(anyhow!("motion step must be at least 1"));
        }
        if self.output.snapshot_every == 0 {
            return Err(anyhow!("output snapshot_every must be at least 1"));
        }
        Ok(())
    }

    /// Motion detector settings; only valid after `validate`.
    pub fn motion_config(&self) -> MotionConfig {
        MotionConfig {
            threshold: self.motion.threshold.min(u8::MAX as u32) as u8,
            sensitivity: self.motion.sensitivity,
            step: self.motion.step,
            collect_regions: true,
        }
    }

    /// Instantiate the configured provider for every modality.
    pub fn build_providers(&self) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for modality in Modality::ALL {
            if let Some(provider) = provider_from_spec(modality, self.providers.spec(modality))? {
                registry.register_boxed(provider);
            }
        }
        Ok(registry)
    }
}

fn read_config_file(path: &Path) -> Result<OverlayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_capture_and_motion_constants() {
        let cfg = OverlayConfig::default();
        assert_eq!(cfg.capture.url, "stub://camera");
        assert_eq!((cfg.capture.width, cfg.capture.height), (1280, 720));
        assert_eq!(cfg.render, RenderConfig::default());
        assert_eq!(cfg.motion_config(), MotionConfig::default());
        assert_eq!(cfg.providers.spec(Modality::Face), "stub");
    }

    #[test]
    fn validation_rejects_out_of_range_motion() {
        let mut cfg = OverlayConfig::default();
        cfg.motion.threshold = 256;
        assert!(cfg.validate().is_err());

        let mut cfg = OverlayConfig::default();
        cfg.motion.sensitivity = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = OverlayConfig::default();
        cfg.motion.step = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn builds_registry_skipping_none() -> Result<()> {
        let mut cfg = OverlayConfig::default();
        cfg.providers.pose = "none".to_string();
        let registry = cfg.build_providers()?;
        assert!(registry.contains(Modality::Hands));
        assert!(!registry.contains(Modality::Pose));
        assert!(registry.contains(Modality::Face));
        Ok(())
    }
}
