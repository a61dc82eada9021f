//! Chart Configuration Module
//! Style, bucketing policy and histogram options, loadable from JSON.

use crate::charts::Rgb;
use crate::stats::{BucketPolicy, MAX_POLY_ORDER};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Visual settings shared by every chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font_family: String,
    pub default_title: String,
    pub count_label: String,
    pub proportion_label: String,
    pub density_label: String,
    pub trend_label: String,
    /// Bar colors, cycled across categories.
    pub palette: Vec<Rgb>,
    /// Pie wedge colors, cycled across categories.
    pub wedge_palette: Vec<Rgb>,
    pub histogram_color: Rgb,
    pub curve_color: Rgb,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            font_family: "sans-serif".to_string(),
            default_title: "Número de bolsistas".to_string(),
            count_label: "número de bolsistas".to_string(),
            proportion_label: "proporção de bolsistas".to_string(),
            density_label: "densidade".to_string(),
            trend_label: "tendência".to_string(),
            palette: vec![Rgb::TAB_RED, Rgb::TAB_GREEN],
            wedge_palette: Rgb::TAB10.to_vec(),
            histogram_color: Rgb::TAB_BLUE,
            curve_color: Rgb::TAB_ORANGE,
        }
    }
}

/// Histogram binning and density smoothing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramOptions {
    pub bins: usize,
    /// Savitzky-Golay window length (odd).
    pub smoothing_window: usize,
    /// Savitzky-Golay polynomial order, 0 to 3.
    pub poly_order: usize,
    /// Annotate the chart with n, mean, std and quartiles.
    pub annotate: bool,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            bins: 10,
            smoothing_window: 5,
            poly_order: 2,
            annotate: true,
        }
    }
}

/// Complete chart configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub style: ChartStyle,
    pub bucket: BucketPolicy,
    pub histogram: HistogramOptions,
    /// Overlay a smoothed trend curve on proportion bar charts.
    pub trend: bool,
}

impl ChartConfig {
    /// Parse a configuration from JSON text. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.style.width == 0 || self.style.height == 0 {
            return Err(ConfigError::Invalid("chart size must be non-zero".into()));
        }
        if self.style.palette.is_empty() || self.style.wedge_palette.is_empty() {
            return Err(ConfigError::Invalid("palettes must not be empty".into()));
        }
        if self.histogram.bins == 0 {
            return Err(ConfigError::Invalid("histogram needs at least one bin".into()));
        }
        if self.histogram.smoothing_window % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "smoothing window {} must be odd",
                self.histogram.smoothing_window
            )));
        }
        if self.histogram.poly_order > MAX_POLY_ORDER {
            return Err(ConfigError::Invalid(format!(
                "polynomial order {} not supported (max {})",
                self.histogram.poly_order, MAX_POLY_ORDER
            )));
        }
        self.bucket.validate()
    }
}
