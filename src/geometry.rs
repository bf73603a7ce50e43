//! Turning a detector box into a classifier input.

use image::DynamicImage;
use serde::Serialize;

use crate::error::GeometryError;
use crate::models::BoundingBox;

/// Integer crop rectangle, guaranteed to lie inside the image it was
/// computed for and to have a non-zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the crop rectangle for `bbox` inside an image of
/// `image_width` x `image_height` pixels.
///
/// The box is first reordered, then grown by `padding` on every side, then
/// clamped to the image. Only after clamping is the size checked, so a box
/// lying entirely outside the image is rejected even if it is well formed.
pub fn crop_region(
    image_width: u32,
    image_height: u32,
    bbox: &BoundingBox,
    padding: u32,
) -> Result<CropRegion, GeometryError> {
    let b = bbox.normalized();
    let pad = i64::from(padding);

    // Coordinates are truncated toward zero before padding. The cast
    // saturates for infinite or huge values, so padding must too.
    let x1 = (b.x1 as i64).saturating_sub(pad).clamp(0, i64::from(image_width));
    let y1 = (b.y1 as i64).saturating_sub(pad).clamp(0, i64::from(image_height));
    let x2 = (b.x2 as i64).saturating_add(pad).clamp(0, i64::from(image_width));
    let y2 = (b.y2 as i64).saturating_add(pad).clamp(0, i64::from(image_height));

    let width = x2 - x1;
    let height = y2 - y1;
    if width <= 0 || height <= 0 {
        return Err(GeometryError::InvalidRegion {
            x: x1,
            y: y1,
            width,
            height,
        });
    }

    Ok(CropRegion {
        x: x1 as u32,
        y: y1 as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Crop `image` to the padded box. The source image is left untouched.
pub fn crop(
    image: &DynamicImage,
    bbox: &BoundingBox,
    padding: u32,
) -> Result<(DynamicImage, CropRegion), GeometryError> {
    let region = crop_region(image.width(), image.height(), bbox, padding)?;
    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
    Ok((cropped, region))
}
