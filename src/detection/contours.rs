//! Model-free package localizer built on edge contours.
//!
//! Packages photographed against a plain background produce one large closed
//! edge outline. Each connected edge component becomes a candidate box whose
//! confidence is the share of the image its bounding box covers.

use std::collections::HashMap;

use image::{DynamicImage, GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use super::Detector;
use super::preprocessing::{self, EdgeParams};
use crate::models::{BoundingBox, Detection};

/// Connected edge region, in inclusive pixel coordinates.
#[derive(Debug, Clone)]
pub struct Contour {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Contour {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn box_area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Bounding box with an exclusive right/bottom edge.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_x as f32,
            self.min_y as f32,
            (self.max_x + 1) as f32,
            (self.max_y + 1) as f32,
        )
    }
}

/// Find contours in binary edge image using connected components.
///
/// Contours come back ordered by component label, i.e. in raster order of
/// their first pixel.
pub fn find_contours(edges: &GrayImage, min_area: u32) -> Vec<Contour> {
    // Label connected components (white pixels = edges)
    let labeled = connected_components(edges, Connectivity::Eight, Luma([0]));

    let mut regions: HashMap<u32, (u32, u32, u32, u32, u32)> = HashMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        regions
            .entry(label_val)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    let mut contours: Vec<Contour> = regions
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| Contour {
            label,
            min_x,
            min_y,
            max_x,
            max_y,
            pixel_count: count,
        })
        .filter(|c| c.pixel_count >= min_area)
        .collect();
    contours.sort_by_key(|c| c.label);
    contours
}

/// Edge-contour detector.
#[derive(Debug, Clone)]
pub struct ContourDetector {
    pub edges: EdgeParams,
    /// Minimum number of edge pixels for a component to count.
    pub min_area: u32,
}

impl ContourDetector {
    pub fn new() -> Self {
        Self {
            edges: EdgeParams::default(),
            min_area: 10,
        }
    }
}

impl Default for ContourDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ContourDetector {
    fn detect(&self, image: &DynamicImage, threshold: f32) -> anyhow::Result<Vec<Detection>> {
        let image_area = image.width() as f32 * image.height() as f32;
        if image_area == 0.0 {
            return Ok(Vec::new());
        }

        let edges = preprocessing::edge_map(image, &self.edges);
        let contours = find_contours(&edges, self.min_area);
        debug!(count = contours.len(), "edge contours found");

        Ok(contours
            .iter()
            .map(|c| {
                let confidence = (c.box_area() as f32 / image_area).min(1.0);
                Detection::new(c.bounding_box(), confidence)
            })
            .filter(|d| d.confidence >= threshold)
            .collect())
    }

    fn name(&self) -> &str {
        "contour"
    }
}
