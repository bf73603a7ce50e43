#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from pharmalens for tests
pub use pharmalens::{
    BoundingBox, Detection, OutcomeError, Pipeline, PipelineError, PipelineOutcome, RunOptions,
    Stage, Verification, Vocabulary,
};
