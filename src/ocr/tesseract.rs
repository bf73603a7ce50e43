use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use image::DynamicImage;
use tempdir::TempDir;

use super::OcrBackend;

/// OCR through the `tesseract` command-line program.
///
/// Runs with the LSTM engine (`--oem 3`) and assumes a single uniform block
/// of text (`--psm 6`), which suits the front face of a package.
#[derive(Debug, Clone)]
pub struct TesseractBackend {
    binary: PathBuf,
    languages: String,
}

impl TesseractBackend {
    /// Fails when the executable cannot be run.
    pub fn new(binary: &Path, languages: &[String]) -> anyhow::Result<Self> {
        let output = Command::new(binary)
            .arg("--version")
            .output()
            .with_context(|| format!("Tesseract not found at {}", binary.display()))?;
        if !output.status.success() {
            anyhow::bail!("Tesseract at {} is not usable", binary.display());
        }

        let languages = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };

        Ok(Self {
            binary: binary.to_path_buf(),
            languages,
        })
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }
}

impl OcrBackend for TesseractBackend {
    fn extract_text(&self, image: &DynamicImage) -> anyhow::Result<Option<String>> {
        let dir = TempDir::new("pharmalens-ocr")?;
        let input_path = dir.path().join("input.png");
        image
            .save(&input_path)
            .map_err(|e| anyhow::anyhow!("Failed to write OCR input: {}", e))?;

        let output = Command::new(&self.binary)
            .arg(&input_path)
            .arg("stdout")
            .args(["-l", &self.languages, "--oem", "3", "--psm", "6"])
            .output()
            .context("Failed to run tesseract")?;

        if !output.status.success() {
            anyhow::bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() { Ok(None) } else { Ok(Some(text)) }
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
