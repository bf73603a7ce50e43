use serde::Serialize;

/// Axis-aligned box in pixel space of the original image.
///
/// Boxes coming from an adapter may be unordered (`x1 > x2`); use
/// [`BoundingBox::normalized`] before relying on the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Reorder the corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }
}

/// One box reported by a detection adapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// Probability assigned to one vocabulary label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelProbability {
    pub label: String,
    pub probability: f32,
}

/// Result of classifying a cropped package.
///
/// `probabilities` is aligned with vocabulary order and `label` is always the
/// entry with the highest probability (first one on ties).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: String,
    pub index: usize,
    pub confidence: f32,
    pub probabilities: Vec<LabelProbability>,
}

impl Classification {
    pub fn top_k(&self, k: usize) -> Vec<LabelProbability> {
        top_k(&self.probabilities, k)
    }
}

/// The `k` most probable labels, highest first. Ties keep vocabulary order.
pub fn top_k(probabilities: &[LabelProbability], k: usize) -> Vec<LabelProbability> {
    let mut ranked = probabilities.to_vec();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked.truncate(k);
    ranked
}

/// What text verification concluded for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "label", rename_all = "snake_case")]
pub enum Verification {
    /// The OCR text contained this vocabulary label.
    Matched(String),
    /// OCR produced text but no vocabulary label was found in it.
    NoMatch,
    /// The backend ran but returned no text.
    NoText,
    /// The OCR backend could not be constructed for this pipeline.
    Unavailable,
}

impl Verification {
    pub fn matched_label(&self) -> Option<&str> {
        match self {
            Verification::Matched(label) => Some(label.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verification::Matched(label) => write!(f, "{}", label),
            Verification::NoMatch => write!(f, "no known package name found in text"),
            Verification::NoText => write!(f, "no text recognized"),
            Verification::Unavailable => write!(f, "verification unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_orders_corners() {
        let b = BoundingBox::new(50.0, 80.0, 10.0, 20.0).normalized();
        assert_eq!(b, BoundingBox::new(10.0, 20.0, 50.0, 80.0));
        assert_eq!(b.area(), 40.0 * 60.0);
    }

    #[test]
    fn top_k_is_stable_for_ties() {
        let c = Classification {
            label: "b".into(),
            index: 1,
            confidence: 0.4,
            probabilities: vec![
                LabelProbability { label: "a".into(), probability: 0.3 },
                LabelProbability { label: "b".into(), probability: 0.4 },
                LabelProbability { label: "c".into(), probability: 0.3 },
            ],
        };
        let top: Vec<_> = c.top_k(2).into_iter().map(|p| p.label).collect();
        assert_eq!(top, vec!["b", "a"]);
    }
}
