//! Build and load configuration
//!
//! Plain serde structs with defaults so callers can embed them in a TOML
//! config file. Validation of the values themselves happens at the top of
//! the build pipeline, before any pixel work.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Atlas build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Requested page width in pixels (pre-supersample).
    pub page_width: u32,
    /// Requested page height in pixels (pre-supersample).
    pub page_height: u32,
    /// Margin around each packed glyph, in pixels (pre-supersample).
    pub glyph_margin: u32,
    /// Supersample level in [1,8]: the strip is rasterized at this multiple
    /// and the packed pages are scaled back down. Must be a power of two
    /// when `force_power_of_two` is set.
    pub super_sample_levels: u32,
    /// Round the final page dimensions up to powers of two.
    pub force_power_of_two: bool,
    /// Alpha values at or below this count as empty during retargeting.
    /// Nonzero so outward regrow is not fooled by resampler ringing.
    pub alpha_tolerance: u8,
    /// Derive a drop-shadow atlas after the main build.
    pub shadow: Option<ShadowConfig>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            page_width: 512,
            page_height: 512,
            glyph_margin: 2,
            super_sample_levels: 1,
            force_power_of_two: false,
            alpha_tolerance: 10,
            shadow: None,
        }
    }
}

/// Drop-shadow derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Requested shadow page width in pixels.
    pub page_width: u32,
    /// Requested shadow page height in pixels.
    pub page_height: u32,
    /// Base glyph margin; the blur spread allowance is added on top.
    pub glyph_margin: u32,
    /// Box blur radius in pixels.
    pub blur_radius: u32,
    /// Number of blur passes (more passes approach a Gaussian).
    pub blur_passes: u32,
    /// Extra scale applied to the shadow set before blurring, for
    /// bigger or smaller shadows than the glyphs themselves.
    pub scale: f32,
    /// Round shadow page dimensions up to powers of two.
    pub force_power_of_two: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            page_width: 512,
            page_height: 512,
            glyph_margin: 2,
            blur_radius: 3,
            blur_passes: 2,
            scale: 1.0,
            force_power_of_two: false,
        }
    }
}

/// Atlas load settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Rescale factor applied after load. `1.0` loads the atlas as stored;
    /// factors below one use the isolated per-glyph shrink path.
    pub downsample_factor: f32,
    /// Alpha values at or below this count as empty during retargeting.
    pub alpha_tolerance: u8,
    /// Derive a drop-shadow atlas after the load.
    pub shadow: Option<ShadowConfig>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            downsample_factor: 1.0,
            alpha_tolerance: 10,
            shadow: None,
        }
    }
}

impl BuilderConfig {
    /// Load builder settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        info!("Config loaded: {}", path.display());
        Ok(config)
    }
}
