use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::assets::fonts::FontOptions;
use crate::compose::document::{DocumentParams, PortraitPolicy};
use crate::compose::scene::SceneParams;
use crate::encode::OutputFormat;
use crate::foundation::core::Size;
use crate::foundation::error::{ForgeError, ForgeResult};

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 8_000;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CardSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CardSize {
    fn default() -> Self {
        Self {
            width: 600,
            height: 380,
        }
    }
}

/// Everything a render request can be tuned with. Every field has a default, so `{}` is a
/// complete config.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    pub card: CardSize,
    pub document: DocumentParams,
    pub scene: SceneParams,
    pub output: OutputFormat,
    pub fetch: FetchOptions,
    pub fonts: FontOptions,
    pub portrait_policy: PortraitPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub timeout_ms: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

impl FetchOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ForgeConfig {
    pub fn from_json_str(json: &str) -> ForgeResult<Self> {
        let cfg: Self = serde_json::from_str(json).context("parse config json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> ForgeResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn card_size(&self) -> ForgeResult<Size> {
        Size::new(self.card.width, self.card.height)
    }

    pub fn validate(&self) -> ForgeResult<()> {
        let card = self.card_size()?;
        let scene = card.scaled_ceil(self.scene.scale);
        if scene.width > u32::from(u16::MAX) || scene.height > u32::from(u16::MAX) {
            return Err(ForgeError::validation(format!(
                "scene size {}x{} exceeds {}",
                scene.width,
                scene.height,
                u16::MAX
            )));
        }
        self.scene.validate()?;
        self.output.validate()?;
        if self.fetch.timeout_ms == 0 {
            return Err(ForgeError::validation("fetch.timeout_ms must be > 0"));
        }
        let doc = &self.document;
        if !doc.hologram.radius.is_finite() || doc.hologram.radius <= 0.0 {
            return Err(ForgeError::validation(
                "document.hologram.radius must be finite and > 0",
            ));
        }
        if !doc.scratches.max_offset.is_finite() || !doc.scratches.width.is_finite() {
            return Err(ForgeError::validation(
                "document.scratches values must be finite",
            ));
        }
        if let Some(amount) = doc.print_grain
            && (!amount.is_finite() || amount < 0.0)
        {
            return Err(ForgeError::validation(
                "document.print_grain must be finite and >= 0",
            ));
        }
        Ok(())
    }
}
