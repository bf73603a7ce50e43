use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

/// Parameters of the grayscale → blur → Canny chain.
#[derive(Debug, Clone, Copy)]
pub struct EdgeParams {
    pub blur_sigma: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            low_threshold: 50.0,
            high_threshold: 100.0,
        }
    }
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Binary edge map of `img` (edges are white).
pub fn edge_map(img: &DynamicImage, params: &EdgeParams) -> GrayImage {
    let gray = to_grayscale(img);
    let blurred = apply_blur(&gray, params.blur_sigma);
    detect_edges(&blurred, params.low_threshold, params.high_threshold)
}
