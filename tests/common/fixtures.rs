use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, ImageBuffer, Rgb};
use pharmalens::classification::Classifier;
use pharmalens::detection::Detector;
use pharmalens::ocr::{BackendFactory, OcrBackend};
use pharmalens::{BoundingBox, Detection, Pipeline, Vocabulary};

pub const LABELS: [&str; 3] = ["parol", "ibuprol", "aspirin"];

pub fn vocabulary() -> Vocabulary {
    Vocabulary::new(LABELS).expect("valid test vocabulary")
}

/// Creates a solid grey test image.
pub fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| Rgb([128u8, 128, 128])))
}

pub fn detection(confidence: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
    Detection::new(BoundingBox::new(x1, y1, x2, y2), confidence)
}

/// Detector returning a fixed list of boxes, whatever the threshold.
pub struct ScriptedDetector {
    pub detections: Vec<Detection>,
}

impl Detector for ScriptedDetector {
    fn detect(&self, _image: &DynamicImage, _threshold: f32) -> anyhow::Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&self, _image: &DynamicImage, _threshold: f32) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("detector exploded")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Classifier returning a fixed distribution and recording the size of
/// every crop it was given.
pub struct FixedClassifier {
    pub probabilities: Vec<f32>,
    pub seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl FixedClassifier {
    pub fn new(probabilities: Vec<f32>) -> (Self, Arc<Mutex<Vec<(u32, u32)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                probabilities,
                seen: seen.clone(),
            },
            seen,
        )
    }
}

impl Classifier for FixedClassifier {
    fn classify(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        self.seen.lock().unwrap().push((image.width(), image.height()));
        Ok(self.probabilities.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

pub struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("classifier exploded")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// OCR backend returning a canned reading.
pub struct CannedOcr {
    pub text: Option<String>,
    pub fail: bool,
}

impl OcrBackend for CannedOcr {
    fn extract_text(&self, _image: &DynamicImage) -> anyhow::Result<Option<String>> {
        if self.fail {
            anyhow::bail!("ocr exploded");
        }
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

/// Factory building a [`CannedOcr`] and counting how often it ran.
pub fn counting_factory(text: Option<&str>, counter: Arc<AtomicUsize>) -> BackendFactory {
    let text = text.map(str::to_string);
    Box::new(move || -> anyhow::Result<Arc<dyn OcrBackend>> {
        counter.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which concurrent first uses could race
        std::thread::sleep(Duration::from_millis(20));
        Ok(Arc::new(CannedOcr {
            text: text.clone(),
            fail: false,
        }) as Arc<dyn OcrBackend>)
    })
}

/// Factory that always fails and counts its attempts.
pub fn failing_factory(counter: Arc<AtomicUsize>) -> BackendFactory {
    Box::new(move || -> anyhow::Result<Arc<dyn OcrBackend>> {
        counter.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("ocr models missing")
    })
}

/// Pipeline with a scripted detector and a fixed classifier favouring `parol`.
pub fn make_pipeline(detections: Vec<Detection>) -> (Pipeline, Arc<Mutex<Vec<(u32, u32)>>>) {
    let (classifier, seen) = FixedClassifier::new(vec![0.7, 0.2, 0.1]);
    let pipeline = Pipeline::new(
        vocabulary(),
        Box::new(ScriptedDetector { detections }),
        Box::new(classifier),
    )
    .expect("pipeline builds");
    (pipeline, seen)
}

/// Factory that panics and counts its attempts.
pub fn panicking_factory(counter: Arc<AtomicUsize>) -> BackendFactory {
    Box::new(move || -> anyhow::Result<Arc<dyn OcrBackend>> {
        counter.fetch_add(1, Ordering::SeqCst);
        panic!("ocr constructor crashed")
    })
}
