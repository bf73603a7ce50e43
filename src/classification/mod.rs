pub mod vit;

use image::DynamicImage;

use crate::models::{Classification, LabelProbability};
use crate::vocabulary::Vocabulary;

pub use vit::{RtenClassifier, resolve_model_path};

/// Assigns a probability distribution over the vocabulary to a cropped package.
pub trait Classifier: Send + Sync {
    /// Probability vector aligned with vocabulary order.
    fn classify(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>>;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Turn a probability vector into a [`Classification`].
///
/// Fails when the vector does not have one entry per vocabulary label or
/// holds a NaN or infinite entry.
pub fn from_probabilities(
    vocabulary: &Vocabulary,
    probabilities: &[f32],
) -> anyhow::Result<Classification> {
    if probabilities.len() != vocabulary.len() {
        anyhow::bail!(
            "classifier returned {} probabilities for a vocabulary of {} labels",
            probabilities.len(),
            vocabulary.len()
        );
    }

    if let Some(i) = probabilities.iter().position(|p| !p.is_finite()) {
        anyhow::bail!(
            "classifier returned non-finite probability {} for label '{}'",
            probabilities[i],
            vocabulary.get(i).unwrap_or_default()
        );
    }

    let mut index = 0;
    for (i, &p) in probabilities.iter().enumerate() {
        if p > probabilities[index] {
            index = i;
        }
    }

    let probabilities: Vec<LabelProbability> = vocabulary
        .iter()
        .zip(probabilities)
        .map(|(label, &probability)| LabelProbability {
            label: label.to_string(),
            probability,
        })
        .collect();

    Ok(Classification {
        label: probabilities[index].label.clone(),
        index,
        confidence: probabilities[index].probability,
        probabilities,
    })
}
