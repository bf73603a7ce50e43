//! Classifier backed by a ViT-style image classification model in `.rten` form.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use image::DynamicImage;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use tracing::info;

use super::Classifier;
use crate::checkpoint::{self, DEFAULT_PREFIX};
use crate::config::ClassificationConfig;
use crate::tensor::{image_to_nchw, softmax};

pub struct RtenClassifier {
    model: Model,
    input_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl std::fmt::Debug for RtenClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtenClassifier")
            .field("input_size", &self.input_size)
            .field("mean", &self.mean)
            .field("std", &self.std)
            .finish()
    }
}

/// Locate the model file a classification config points at.
///
/// A direct file path is used as is. A directory is treated as a pool of
/// `checkpoint-*` directories, resolved with the configured policy.
pub fn resolve_model_path(config: &ClassificationConfig) -> anyhow::Result<PathBuf> {
    if config.checkpoints.is_file() {
        return Ok(config.checkpoints.clone());
    }
    let chosen = checkpoint::resolve_in(&config.checkpoints, DEFAULT_PREFIX, config.selection)?;
    let model_path = chosen.path.join(&config.model_file);
    if !model_path.exists() {
        anyhow::bail!(
            "Checkpoint {} has no model file {}",
            chosen.name,
            config.model_file.display()
        );
    }
    Ok(model_path)
}

impl RtenClassifier {
    pub fn load(path: &Path, input_size: u32, mean: [f32; 3], std: [f32; 3]) -> anyhow::Result<Self> {
        info!(model = %path.display(), "loading classification model");
        let model = Model::load_file(path)?;
        Ok(Self {
            model,
            input_size,
            mean,
            std,
        })
    }

    pub fn from_config(config: &ClassificationConfig) -> anyhow::Result<Self> {
        let path = resolve_model_path(config)?;
        Self::load(&path, config.input_size, config.mean, config.std)
    }
}

impl Classifier for RtenClassifier {
    fn classify(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        let size = self.input_size;
        let input = image_to_nchw(image, size, size, self.mean, self.std);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| anyhow!("classification inference failed: {}", e))?;
        let logits: NdTensor<f32, 2> = output
            .try_into()
            .map_err(|e| anyhow!("unexpected classification output: {:?}", e))?;

        let logits: Vec<f32> = logits.iter().copied().collect();
        Ok(softmax(&logits))
    }

    fn name(&self) -> &str {
        "rten-vit"
    }
}
