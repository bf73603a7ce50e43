//! Per-stage debug images.
//!
//! For every processed image a sub-directory named by the caller is written
//! under the debug root. The CLI uses `<NN>_<image-stem>`, numbered from 01 in
//! argument order:
//!
//! ```text
//! <root>/<NN>_<image-stem>/00_input.png
//! <root>/<NN>_<image-stem>/01_detection.png   (crop region drawn in red)
//! <root>/<NN>_<image-stem>/02_crop.png
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use image::{DynamicImage, Rgba};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::outcome::PipelineOutcome;

const BOX_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BOX_THICKNESS: u32 = 3;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Write the stage images for one run.
    ///
    /// The crop is only written when the outcome carries an echoed image and
    /// a crop region, i.e. when the run was asked to return images and got
    /// past cropping.
    pub fn save(&self, name: &str, input: &DynamicImage, outcome: &PipelineOutcome) -> Result<()> {
        let dir = self.output_dir.join(name);
        std::fs::create_dir_all(&dir)?;

        save_png(input, &dir.join("00_input.png"))?;

        if let Some(region) = outcome.crop {
            let mut annotated = input.to_rgba8();
            for inset in 0..BOX_THICKNESS {
                if region.width <= 2 * inset || region.height <= 2 * inset {
                    break;
                }
                let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32)
                    .of_size(region.width - 2 * inset, region.height - 2 * inset);
                draw_hollow_rect_mut(&mut annotated, rect, BOX_COLOR);
            }
            save_png(
                &DynamicImage::ImageRgba8(annotated),
                &dir.join("01_detection.png"),
            )?;

            if let Some(crop) = &outcome.image {
                save_png(crop, &dir.join("02_crop.png"))?;
            }
        }

        debug!(dir = %dir.display(), "saved debug images");
        Ok(())
    }
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| anyhow::anyhow!("Failed to save debug image {}: {}", path.display(), e))
}
