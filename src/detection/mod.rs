pub mod contours;
pub mod preprocessing;
pub mod yolo;

use clap::ValueEnum;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::models::Detection;

pub use contours::ContourDetector;
pub use yolo::RtenDetector;

/// Locates packages in an image.
///
/// Implementations return every box they consider at or above `threshold`,
/// in their own order. An empty result is a normal outcome.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &DynamicImage, threshold: f32) -> anyhow::Result<Vec<Detection>>;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Which built-in detector to construct from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Trained `.rten` detection model
    #[default]
    Model,
    /// Model-free edge/contour localizer
    Contour,
}

/// Pick the single most confident detection.
///
/// On equal confidence the earlier detection wins. Boxes are never merged.
pub fn select_best(detections: &[Detection]) -> Option<Detection> {
    let mut best: Option<Detection> = None;
    for detection in detections {
        match best {
            Some(current) if detection.confidence <= current.confidence => {}
            _ => best = Some(*detection),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn det(confidence: f32, x: f32) -> Detection {
        Detection::new(BoundingBox::new(x, 0.0, x + 10.0, 10.0), confidence)
    }

    #[test]
    fn best_keeps_first_on_ties() {
        let picked = select_best(&[det(0.4, 0.0), det(0.9, 1.0), det(0.9, 2.0)]);
        assert_eq!(picked, Some(det(0.9, 1.0)));
    }

    #[test]
    fn best_of_nothing() {
        assert_eq!(select_best(&[]), None);
    }
}
