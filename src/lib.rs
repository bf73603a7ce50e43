pub mod checkpoint;
pub mod classification;
pub mod config;
pub mod debug;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod matcher;
pub mod models;
pub mod ocr;
pub mod outcome;
pub mod pipeline;
pub mod tensor;
pub mod vocabulary;

pub use checkpoint::{CheckpointCandidate, SelectionPolicy};
pub use classification::Classifier;
pub use config::PipelineConfig;
pub use detection::{Detector, DetectorKind};
pub use error::{GeometryError, PipelineError, Stage};
pub use matcher::{MatchStrategy, VocabularyMatcher};
pub use models::{BoundingBox, Classification, Detection, LabelProbability, Verification};
pub use ocr::{LazyOcr, OcrBackend, OcrEngineKind};
pub use outcome::{OutcomeError, PipelineOutcome, ResultAggregator};
pub use pipeline::{Pipeline, RunOptions};
pub use vocabulary::Vocabulary;
