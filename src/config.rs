//! JSON configuration for a recognition pipeline.
//!
//! Every section and field has a default, so `{}` is a valid file.
//!
//! ```json
//! {
//!   "vocabulary": "data/labels.json",
//!   "detection": { "model": "models/detection/best.rten", "threshold": 0.5 },
//!   "classification": { "checkpoints": "models/classification", "selection": "recency" },
//!   "ocr": { "engine": "tesseract", "enabled": true, "languages": ["tur", "eng"] },
//!   "inference": { "padding": 10 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checkpoint::SelectionPolicy;
use crate::error::ConfigError;
use crate::ocr::OcrEngineKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub vocabulary: PathBuf,
    pub detection: DetectionConfig,
    pub classification: ClassificationConfig,
    pub ocr: OcrConfig,
    pub inference: InferenceConfig,
}

/// Training-run directory searched when the configured detector is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLocation {
    pub runs_dir: PathBuf,
    pub project: String,
    pub name: String,
}

impl RunLocation {
    pub fn weights(&self) -> PathBuf {
        self.runs_dir
            .join(&self.project)
            .join(&self.name)
            .join("weights")
            .join("best.rten")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub model: PathBuf,
    pub fallback_run: Option<RunLocation>,
    pub input_size: u32,
    pub threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("models/detection/best.rten"),
            fallback_run: None,
            input_size: 640,
            threshold: 0.5,
        }
    }
}

impl DetectionConfig {
    /// The configured model, or the training run's weights when it is missing.
    pub fn resolve_model(&self) -> Option<PathBuf> {
        if self.model.exists() {
            return Some(self.model.clone());
        }
        self.fallback_run
            .as_ref()
            .map(RunLocation::weights)
            .filter(|p| p.exists())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// A model file, or a directory of `checkpoint-*` directories.
    pub checkpoints: PathBuf,
    pub selection: SelectionPolicy,
    pub model_file: PathBuf,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            checkpoints: PathBuf::from("models/classification"),
            selection: SelectionPolicy::Recency,
            model_file: PathBuf::from("model.rten"),
            input_size: 224,
            mean: [0.5; 3],
            std: [0.5; 3],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: OcrEngineKind,
    /// Default for verification when the caller does not say.
    pub enabled: bool,
    pub languages: Vec<String>,
    pub model_dir: Option<PathBuf>,
    pub tesseract_binary: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Ocrs,
            enabled: false,
            languages: vec!["tur".to_string(), "eng".to_string()],
            model_dir: None,
            tesseract_binary: PathBuf::from("tesseract"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub padding: u32,
    pub return_image: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            padding: 10,
            return_image: false,
        }
    }
}

impl PipelineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if !(0.0..=1.0).contains(&self.detection.threshold) {
            return invalid(format!(
                "detection.threshold must be in [0, 1], got {}",
                self.detection.threshold
            ));
        }
        if self.detection.input_size == 0 {
            return invalid("detection.input_size must be positive".to_string());
        }
        if self.classification.input_size == 0 {
            return invalid("classification.input_size must be positive".to_string());
        }
        if self.classification.std.contains(&0.0) {
            return invalid("classification.std entries must be non-zero".to_string());
        }
        Ok(())
    }
}
