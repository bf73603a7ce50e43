use image::DynamicImage;
use image::imageops::FilterType;
use rten_tensor::NdTensor;

/// Resize `img` to `width` x `height` and lay it out as a `[1, 3, H, W]`
/// tensor, each channel scaled to [0, 1] and then normalized with `mean`/`std`.
pub fn image_to_nchw(
    img: &DynamicImage,
    width: u32,
    height: u32,
    mean: [f32; 3],
    std: [f32; 3],
) -> NdTensor<f32, 4> {
    let rgb = img
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();
    let (w, h) = (width as usize, height as usize);
    let plane = w * h;

    let mut data = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let offset = y as usize * w + x as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - mean[c]) / std[c];
        }
    }

    NdTensor::from_data([1, 3, h, w], data)
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}
