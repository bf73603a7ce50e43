//! The structured result of one pipeline invocation.

use image::DynamicImage;
use serde::Serialize;

use crate::geometry::CropRegion;
use crate::models::{self, BoundingBox, Classification, Detection, LabelProbability, Verification};

/// Why a run stopped before producing a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeError {
    NoDetection,
    InvalidRegion,
}

impl std::fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeError::NoDetection => write!(f, "no package detected"),
            OutcomeError::InvalidRegion => write!(f, "detected box has no usable area"),
        }
    }
}

/// Final, immutable result handed back to the caller.
///
/// Stages that did not run leave their fields as explicit `None`s (or an
/// empty probability list).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub label: Option<String>,
    pub confidence: Option<f32>,
    pub detection_confidence: Option<f32>,
    pub bbox: Option<BoundingBox>,
    pub crop: Option<CropRegion>,
    pub probabilities: Vec<LabelProbability>,
    pub verification: Option<Verification>,
    pub error: Option<OutcomeError>,
    /// Cropped package, or the untouched input when nothing was detected.
    /// Only present when the caller asked for it.
    #[serde(skip)]
    pub image: Option<DynamicImage>,
}

impl PipelineOutcome {
    pub fn is_recognized(&self) -> bool {
        self.label.is_some()
    }

    pub fn top_k(&self, k: usize) -> Vec<LabelProbability> {
        models::top_k(&self.probabilities, k)
    }

    /// Whether text verification confirmed the classified label.
    pub fn verified(&self) -> bool {
        match (&self.label, &self.verification) {
            (Some(label), Some(v)) => v.matched_label() == Some(label.as_str()),
            _ => false,
        }
    }
}

/// Collects whatever the stages produced and builds a [`PipelineOutcome`].
#[derive(Debug, Default)]
pub struct ResultAggregator {
    detection: Option<Detection>,
    crop: Option<CropRegion>,
    classification: Option<Classification>,
    verification: Option<Verification>,
    error: Option<OutcomeError>,
    image: Option<DynamicImage>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detection = Some(detection);
        self
    }

    pub fn with_crop(mut self, crop: CropRegion) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_verification(mut self, verification: Option<Verification>) -> Self {
        self.verification = verification;
        self
    }

    pub fn with_error(mut self, error: OutcomeError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_image(mut self, image: Option<DynamicImage>) -> Self {
        self.image = image;
        self
    }

    pub fn build(self) -> PipelineOutcome {
        let (label, confidence, probabilities) = match self.classification {
            Some(c) => (Some(c.label), Some(c.confidence), c.probabilities),
            None => (None, None, Vec::new()),
        };

        PipelineOutcome {
            label,
            confidence,
            detection_confidence: self.detection.map(|d| d.confidence),
            bbox: self.detection.map(|d| d.bbox),
            crop: self.crop,
            probabilities,
            verification: self.verification,
            error: self.error,
            image: self.image,
        }
    }
}
