use std::path::{Path, PathBuf};

use anyhow::anyhow;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;

use super::OcrBackend;

pub const DETECTION_MODEL: &str = "text-detection.rten";
pub const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Standard ocrs model cache (`~/.cache/ocrs`).
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// OCR through the `ocrs` engine.
pub struct OcrsBackend {
    engine: OcrEngine,
}

impl OcrsBackend {
    /// Load the detection and recognition models from `model_dir`, or from
    /// the standard cache location when `None`.
    pub fn new(model_dir: Option<&Path>) -> anyhow::Result<Self> {
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_model_dir()?,
        };
        let detection_model_path = model_dir.join(DETECTION_MODEL);
        let recognition_model_path = model_dir.join(RECOGNITION_MODEL);

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl OcrBackend for OcrsBackend {
    fn extract_text(&self, image: &DynamicImage) -> anyhow::Result<Option<String>> {
        let img = image.to_rgb8();
        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| anyhow!("invalid OCR input image: {:?}", e))?;
        let ocr_input = self.engine.prepare_input(img_source)?;

        let text = self.engine.get_text(&ocr_input)?;
        // get_text separates lines with newlines; keep them as word breaks
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() { Ok(None) } else { Ok(Some(text)) }
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}
