// SPDX-License-Identifier: MPL-2.0-only

use cosmic_config::{Config as CosmicConfig, ConfigGet, ConfigSet};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

pub const NAME: &str = "com.github.VideoLayer";
pub const CONFIG_KEY: &str = "video-layer";

/// Edge length of the square poster and spinner icons, in layer pixels.
pub const DEFAULT_ICON_SIZE: u32 = 64;

/// Largest accepted icon edge. Larger values fall back to the default.
pub const MAX_ICON_SIZE: u32 = 1024;

/// Degrees the spinner rings turn every time they are drawn.
pub const DEFAULT_ROTATE_STEP: f64 = 12.0;

/// Rendering settings shared by every video layer in the process.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Setters)]
#[serde(deny_unknown_fields, default)]
#[must_use]
pub struct Config {
    /// size of the poster and spinner icons
    pub icon_size: u32,
    /// rotation applied to the spinner on each drawn frame, in degrees
    pub rotate_step: f64,
    /// flat colour of the plate drawn behind the poster icon
    pub background_color: [u8; 3],
    /// linear RGB colour of the icon glyphs
    pub icon_color: [f32; 3],
    /// linear RGB colour of the icon glyphs when highlighted
    pub highlight_color: [f32; 3],
    /// whether icons are rasterised in their highlighted variant
    pub highlighted_icons: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icon_size: DEFAULT_ICON_SIZE,
            rotate_step: DEFAULT_ROTATE_STEP,
            background_color: [128, 128, 128],
            icon_color: [0.8, 0.8, 0.8],
            highlight_color: [1.0, 1.0, 1.0],
            highlighted_icons: true,
        }
    }
}

impl Config {
    /// Convenience function for cosmic-config
    ///
    /// # Errors
    ///
    /// Fails if cosmic-config paths are missing or cannot be created.
    pub fn helper() -> Result<CosmicConfig, cosmic_config::Error> {
        CosmicConfig::new(NAME, 1)
    }

    /// Load the config stored in cosmic-config.
    ///
    /// # Errors
    ///
    /// Fails if the entry is missing or fails to parse.
    pub fn load(context: &CosmicConfig) -> Result<Self, cosmic_config::Error> {
        context.get::<Self>(CONFIG_KEY).map(Self::validated)
    }

    /// Load the config from cosmic-config, falling back to defaults.
    pub fn load_or_default(context: &CosmicConfig) -> Self {
        match Self::load(context) {
            Ok(config) => config,
            Err(why) => {
                tracing::error!(?why, "video layer config error, falling back to defaults");
                Self::default()
            }
        }
    }

    /// Applies this config to cosmic-config.
    ///
    /// # Errors
    ///
    /// Fails if the config could not be set in cosmic-config.
    pub fn write(&self, context: &CosmicConfig) -> Result<(), cosmic_config::Error> {
        context.set(CONFIG_KEY, self.clone())
    }

    /// Parse a config from RON text. Missing fields take their default.
    ///
    /// # Errors
    ///
    /// Fails on malformed RON or unknown fields.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text).map(Self::validated)
    }

    /// Replaces out-of-range values with their defaults.
    pub fn validated(mut self) -> Self {
        if !(1..=MAX_ICON_SIZE).contains(&self.icon_size) {
            tracing::error!(
                icon_size = self.icon_size,
                max = MAX_ICON_SIZE,
                "icon size out of range, using default"
            );
            self.icon_size = DEFAULT_ICON_SIZE;
        }
        if !self.rotate_step.is_finite() {
            tracing::error!(rotate_step = self.rotate_step, "invalid spinner step, using default");
            self.rotate_step = DEFAULT_ROTATE_STEP;
        }
        self
    }

    /// Icon size as a float, for layer-space geometry.
    #[must_use]
    pub fn icon_extent(&self) -> f32 {
        self.icon_size as f32
    }

    /// Colour the glyphs are drawn with, depending on the highlight flag.
    #[must_use]
    pub fn glyph_color(&self, highlighted: bool) -> [f32; 3] {
        if highlighted {
            self.highlight_color
        } else {
            self.icon_color
        }
    }
}
