// Conversion options
// Defaults match the command line with no flags; a JSON file may override any subset

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::groove::{InferenceSettings, TimingMode};

pub const DEFAULT_PRESET_FILE: &str = "preset.xml";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for one conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Copy referenced samples next to the preset
    pub copy_samples: bool,

    /// Per-layer grid inference, or raw ticks everywhere
    pub timing: TimingMode,

    pub inference: InferenceSettings,

    /// File name of the written preset inside the output directory
    pub preset_file_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            copy_samples: true,
            timing: TimingMode::Inferred,
            inference: InferenceSettings::default(),
            preset_file_name: DEFAULT_PRESET_FILE.to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn from_json_str(text: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = ConvertOptions::default();
        assert!(options.copy_samples);
        assert_eq!(options.timing, TimingMode::Inferred);
        assert_eq!(options.inference.alignment_threshold, 0.95);
        assert_eq!(options.preset_file_name, "preset.xml");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = ConvertOptions::from_json_str(
            r#"{ "timing": "unquantised", "inference": { "mixed_fraction": 0.3 } }"#,
        )
        .unwrap();

        assert_eq!(options.timing, TimingMode::Unquantised);
        assert_eq!(options.inference.mixed_fraction, 0.3);
        assert_eq!(options.inference.alignment_threshold, 0.95);
        assert!(options.copy_samples);
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{ "copy_samples": false, "preset_file_name": "kit.xml" }"#).unwrap();

        let options = ConvertOptions::from_json_file(&path).unwrap();
        assert!(!options.copy_samples);
        assert_eq!(options.preset_file_name, "kit.xml");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ConvertOptions::from_json_str("{ copy_samples: yes }"),
            Err(OptionsError::Parse(_))
        ));
        assert!(matches!(
            ConvertOptions::from_json_file(Path::new("/no/such/options.json")),
            Err(OptionsError::Io(_))
        ));
    }
}
