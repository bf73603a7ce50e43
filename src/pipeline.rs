use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::classification::{self, Classifier, RtenClassifier};
use crate::config::PipelineConfig;
use crate::detection::{self, ContourDetector, Detector, DetectorKind, RtenDetector};
use crate::error::{PipelineError, Stage};
use crate::geometry;
use crate::matcher::VocabularyMatcher;
use crate::models::Verification;
use crate::ocr::{self, BackendFactory, LazyOcr};
use crate::outcome::{OutcomeError, PipelineOutcome, ResultAggregator};
use crate::vocabulary::Vocabulary;

/// Per-invocation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Run OCR on the crop and match it against the vocabulary.
    pub use_verification: bool,
    /// Minimum detector confidence, in [0, 1].
    pub detection_threshold: f32,
    /// Pixels added on each side of the detected box before cropping.
    pub padding: u32,
    /// Echo the crop (or the input, when nothing was found) in the outcome.
    pub return_image: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_verification: false,
            detection_threshold: 0.5,
            padding: 10,
            return_image: false,
        }
    }
}

impl RunOptions {
    pub fn with_verification(mut self, use_verification: bool) -> Self {
        self.use_verification = use_verification;
        self
    }

    pub fn with_threshold(mut self, detection_threshold: f32) -> Self {
        self.detection_threshold = detection_threshold;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_image(mut self, return_image: bool) -> Self {
        self.return_image = return_image;
        self
    }
}

/// Detection → crop → classification → optional OCR verification.
///
/// A pipeline is shared freely between threads; the only mutable state is the
/// lazily constructed OCR backend, which is guarded internally.
pub struct Pipeline {
    vocabulary: Vocabulary,
    matcher: VocabularyMatcher,
    detector: Box<dyn Detector>,
    classifier: Box<dyn Classifier>,
    ocr: Option<LazyOcr>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("labels", &self.vocabulary.len())
            .field("detector", &self.detector.name())
            .field("classifier", &self.classifier.name())
            .field("ocr", &self.ocr)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline without text verification.
    pub fn new(
        vocabulary: Vocabulary,
        detector: Box<dyn Detector>,
        classifier: Box<dyn Classifier>,
    ) -> anyhow::Result<Self> {
        let matcher = VocabularyMatcher::new(&vocabulary)?;
        Ok(Self {
            vocabulary,
            matcher,
            detector,
            classifier,
            ocr: None,
        })
    }

    /// Enable verification with a backend built on first use.
    pub fn with_ocr(mut self, factory: BackendFactory) -> Self {
        self.ocr = Some(LazyOcr::new(factory));
        self
    }

    /// Build every stage from configuration.
    ///
    /// Models are loaded eagerly; the OCR backend is only prepared and gets
    /// constructed the first time a run asks for verification.
    pub fn from_config(config: &PipelineConfig, detector_kind: DetectorKind) -> anyhow::Result<Self> {
        let vocabulary = Vocabulary::load(&config.vocabulary)?;
        info!(labels = vocabulary.len(), "vocabulary loaded");

        let detector: Box<dyn Detector> = match detector_kind {
            DetectorKind::Model => {
                let path = config.detection.resolve_model().ok_or_else(|| {
                    anyhow::anyhow!(
                        "Detection model not found: {}",
                        config.detection.model.display()
                    )
                })?;
                Box::new(RtenDetector::load(&path, config.detection.input_size)?)
            }
            DetectorKind::Contour => Box::new(ContourDetector::new()),
        };
        let classifier = Box::new(RtenClassifier::from_config(&config.classification)?);

        Ok(Self::new(vocabulary, detector, classifier)?.with_ocr(ocr::backend_factory(&config.ocr)))
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The OCR holder, if verification was configured.
    pub fn ocr(&self) -> Option<&LazyOcr> {
        self.ocr.as_ref()
    }

    /// Recognize the package in `image`.
    ///
    /// Only a failing detection or classification adapter (or a bad
    /// threshold) is returned as an error. Missing detections and degenerate
    /// crops come back as an outcome with its `error` field set.
    pub fn run(
        &self,
        image: &DynamicImage,
        options: &RunOptions,
    ) -> Result<PipelineOutcome, PipelineError> {
        let threshold = options.detection_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidThreshold(threshold));
        }

        let detections = self
            .detector
            .detect(image, threshold)
            .map_err(|e| PipelineError::adapter(Stage::Detection, e))?;
        let accepted: Vec<_> = detections
            .into_iter()
            .filter(|d| d.confidence >= threshold)
            .collect();

        let Some(best) = detection::select_best(&accepted) else {
            info!(threshold, "no package detected");
            let echo = options.return_image.then(|| image.clone());
            return Ok(ResultAggregator::new()
                .with_error(OutcomeError::NoDetection)
                .with_image(echo)
                .build());
        };
        debug!(
            candidates = accepted.len(),
            confidence = best.confidence,
            bbox = ?best.bbox,
            "selected detection"
        );
        let aggregator = ResultAggregator::new().with_detection(best);

        let (cropped, region) = match geometry::crop(image, &best.bbox, options.padding) {
            Ok(crop) => crop,
            Err(e) => {
                warn!(error = %e, "discarding detection");
                return Ok(aggregator.with_error(OutcomeError::InvalidRegion).build());
            }
        };
        debug!(?region, "cropped package");

        let probabilities = self
            .classifier
            .classify(&cropped)
            .map_err(|e| PipelineError::adapter(Stage::Classification, e))?;
        let classification = classification::from_probabilities(&self.vocabulary, &probabilities)
            .map_err(|e| PipelineError::adapter(Stage::Classification, e))?;
        info!(
            label = %classification.label,
            confidence = classification.confidence,
            "classified package"
        );

        let verification = options.use_verification.then(|| self.verify(&cropped));

        Ok(aggregator
            .with_crop(region)
            .with_classification(classification)
            .with_verification(verification)
            .with_image(options.return_image.then_some(cropped))
            .build())
    }

    /// OCR the crop and reduce the text to a vocabulary label.
    fn verify(&self, cropped: &DynamicImage) -> Verification {
        let Some(backend) = self.ocr.as_ref().and_then(LazyOcr::get) else {
            return Verification::Unavailable;
        };

        match backend.extract_text(cropped) {
            Ok(Some(text)) => {
                debug!(backend = backend.name(), %text, "OCR text");
                match self.matcher.match_label(&text) {
                    Some(label) => Verification::Matched(label.to_string()),
                    None => Verification::NoMatch,
                }
            }
            Ok(None) => Verification::NoText,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "OCR extraction failed");
                Verification::NoText
            }
        }
    }
}
