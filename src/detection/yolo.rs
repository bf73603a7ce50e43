//! Detector backed by a YOLOv8-style model exported to `.rten`.

use std::path::Path;

use anyhow::anyhow;
use image::DynamicImage;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use tracing::{debug, info};

use super::Detector;
use crate::models::{BoundingBox, Detection};
use crate::tensor::image_to_nchw;

pub struct RtenDetector {
    model: Model,
    input_size: u32,
}

impl std::fmt::Debug for RtenDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtenDetector")
            .field("input_size", &self.input_size)
            .finish()
    }
}

impl RtenDetector {
    pub fn load(path: &Path, input_size: u32) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!("Detection model not found: {}", path.display());
        }
        info!(model = %path.display(), "loading detection model");
        let model = Model::load_file(path)?;
        Ok(Self { model, input_size })
    }
}

/// Decode raw head output into boxes in original-image pixels.
///
/// `data` holds one prediction per anchor with `channels = 4 + classes`
/// values `(cx, cy, w, h, class scores...)`. With `channels_first` the
/// layout is `[channels, anchors]`, otherwise `[anchors, channels]`.
/// Coordinates are in model-input pixels and scaled by `scale_x`/`scale_y`.
pub fn decode_predictions(
    data: &[f32],
    channels: usize,
    anchors: usize,
    channels_first: bool,
    scale_x: f32,
    scale_y: f32,
    threshold: f32,
) -> Vec<Detection> {
    if channels < 5 || data.len() < channels * anchors {
        return Vec::new();
    }

    let at = |c: usize, a: usize| {
        if channels_first {
            data[c * anchors + a]
        } else {
            data[a * channels + c]
        }
    };

    let mut detections = Vec::new();
    for a in 0..anchors {
        let score = (4..channels)
            .map(|c| at(c, a))
            .fold(f32::NEG_INFINITY, f32::max);
        if !(score >= threshold) {
            continue;
        }

        let (cx, cy, w, h) = (at(0, a), at(1, a), at(2, a), at(3, a));
        let bbox = BoundingBox::new(
            (cx - w / 2.0) * scale_x,
            (cy - h / 2.0) * scale_y,
            (cx + w / 2.0) * scale_x,
            (cy + h / 2.0) * scale_y,
        );
        detections.push(Detection::new(bbox, score.min(1.0)));
    }
    detections
}

impl Detector for RtenDetector {
    fn detect(&self, image: &DynamicImage, threshold: f32) -> anyhow::Result<Vec<Detection>> {
        let size = self.input_size;
        let input = image_to_nchw(image, size, size, [0.0; 3], [1.0; 3]);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| anyhow!("detection inference failed: {}", e))?;
        let output: NdTensor<f32, 3> = output
            .try_into()
            .map_err(|e| anyhow!("unexpected detection output: {:?}", e))?;

        let [_, d1, d2] = output.shape();
        // Heads are usually [1, 4 + classes, anchors]; some exports transpose.
        let channels_first = d1 <= d2;
        let (channels, anchors) = if channels_first { (d1, d2) } else { (d2, d1) };
        let data: Vec<f32> = output.iter().copied().collect();

        let scale_x = image.width() as f32 / size as f32;
        let scale_y = image.height() as f32 / size as f32;
        let detections = decode_predictions(
            &data,
            channels,
            anchors,
            channels_first,
            scale_x,
            scale_y,
            threshold,
        );
        debug!(count = detections.len(), "model detections above threshold");
        Ok(detections)
    }

    fn name(&self) -> &str {
        "rten-yolo"
    }
}
