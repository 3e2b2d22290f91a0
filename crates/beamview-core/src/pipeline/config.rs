use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ACCUMULATION_TARGET, DEFAULT_DISPLAY_MAX, DEFAULT_DISPLAY_MIN, DEFAULT_SERIES_CAPACITY,
    SEQUENCE_BIT_WIDTH,
};
use crate::error::{BeamviewError, Result};
use crate::io::image_io::SaveFormat;
use crate::process::annotation::CommentStyle;
use crate::process::roi::RoiParams;

/// Settings for a live pipeline session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Region of interest; `None` processes the full frame.
    #[serde(default)]
    pub roi: Option<RoiParams>,
    #[serde(default)]
    pub accumulation: AccumulationConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BeamviewError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BeamviewError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulationConfig {
    /// Frames summed per displayed average.
    pub target: usize,
    /// Points kept in the summed-signal series.
    pub series_capacity: usize,
}

impl Default for AccumulationConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_ACCUMULATION_TARGET,
            series_capacity: DEFAULT_SERIES_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub min: f64,
    pub max: f64,
    pub subtract_background: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            min: DEFAULT_DISPLAY_MIN,
            max: DEFAULT_DISPLAY_MAX,
            subtract_background: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Overlay script file, read when the session starts.
    pub script: Option<PathBuf>,
    pub comment_style: CommentStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Width of the camera's embedded frame counter.
    pub bit_width: u32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            bit_width: SEQUENCE_BIT_WIDTH,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where averages, display images and logs go. Nothing is written
    /// when unset.
    pub directory: Option<PathBuf>,
    pub save_averages: bool,
    pub format: SaveFormat,
    pub save_display: bool,
    pub timestamp_logs: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Registered frame processor applied before the ROI.
    pub name: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            name: "passthrough".into(),
        }
    }
}
