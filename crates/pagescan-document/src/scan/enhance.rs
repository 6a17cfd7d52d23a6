// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — grayscale, contrast, brightness normalisation,
// adaptive binarization and sharpening for captured document pages.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::sharpen3x3;
use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::{CropArea, EnhancementSettings};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;

/// Fixed quality used when encoding enhanced previews.
pub const PREVIEW_QUALITY: f32 = 0.95;

/// Enhances a captured page for legibility.
///
/// Wraps a single-channel working image. Every step consumes `self` and
/// returns the transformed enhancer, so the pipeline reads top to bottom:
///
/// ```ignore
/// let out = ScanEnhancer::from_dynamic(&page)
///     .enhance_contrast(1.4)
///     .adaptive_threshold(31, 10)
///     .sharpen()
///     .into_gray();
/// ```
pub struct ScanEnhancer {
    image: GrayImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Start from any decoded raster. Reduces it to luma immediately, since
    /// every later step works on one channel.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            image: to_grayscale(image),
        }
    }

    /// Start from an image that is already grayscale.
    pub fn from_gray(image: GrayImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    // -- Steps ----------------------------------------------------------------

    /// Stretch samples away from mid-gray: `128 + (v - 128) * factor`.
    pub fn enhance_contrast(self, factor: f32) -> Self {
        debug!(factor, "Enhancing contrast");
        let mut image = self.image;
        for pixel in image.pixels_mut() {
            let val = factor * (pixel.0[0] as f32 - 128.0) + 128.0;
            pixel.0[0] = val.clamp(0.0, 255.0) as u8;
        }
        Self { image }
    }

    /// Shift every sample by `target - mean` so the page's mean brightness
    /// lands on `target`. Clamped to `[0, 255]`.
    pub fn adjust_brightness(self, target: u8) -> Self {
        let mut image = self.image;
        let count = image.width() as u64 * image.height() as u64;
        if count == 0 {
            return Self { image };
        }
        let sum: u64 = image.pixels().map(|p| p.0[0] as u64).sum();
        let mean = sum as f64 / count as f64;
        let shift = target as f64 - mean;
        debug!(target, mean, shift, "Adjusting brightness");

        for pixel in image.pixels_mut() {
            let val = pixel.0[0] as f64 + shift;
            pixel.0[0] = val.round().clamp(0.0, 255.0) as u8;
        }
        Self { image }
    }

    /// Binarize against the local mean of a `block_size` x `block_size`
    /// neighbourhood: pixels below `mean - constant` turn black, the rest
    /// white. The neighbourhood is clipped at image borders.
    pub fn adaptive_threshold(self, block_size: u32, constant: i32) -> Self {
        let radius = block_size / 2;
        debug!(block_size, radius, constant, "Applying adaptive threshold");

        let gray = self.image;
        let (width, height) = gray.dimensions();
        let integral = compute_integral_image(&gray);
        let mut output = GrayImage::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let local_mean = region_mean(&integral, width, height, x, y, radius);
                let pixel_val = gray.get_pixel(x, y).0[0] as f64;
                let binary = if pixel_val < local_mean - constant as f64 {
                    0u8
                } else {
                    255u8
                };
                output.put_pixel(x, y, Luma([binary]));
            }
        }

        Self { image: output }
    }

    /// One pass of the 3x3 identity-minus-Laplacian kernel.
    pub fn sharpen(self) -> Self {
        Self {
            image: sharpen3x3(&self.image),
        }
    }

    /// Run the configured steps in fixed order.
    pub fn apply(self, settings: &EnhancementSettings) -> Self {
        let settings = settings.normalized();
        let mut enhancer = self;

        if settings.contrast > 0 {
            enhancer = enhancer.enhance_contrast(contrast_factor(settings.contrast));
        }
        if settings.brightness > 0 {
            enhancer = enhancer.adjust_brightness(brightness_target(settings.brightness));
        }
        if settings.adaptive_threshold {
            enhancer = enhancer.adaptive_threshold(
                settings.adaptive_block_size as u32,
                settings.adaptive_constant as i32,
            );
        }
        for _ in 0..sharpen_passes(settings.sharpness) {
            enhancer = enhancer.sharpen();
        }
        enhancer
    }
}

// -- Pipeline entry points ----------------------------------------------------

/// Luminance-weighted reduction to one channel.
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    image.to_luma8()
}

/// `1 + contrast / 100`.
pub fn contrast_factor(contrast: u8) -> f32 {
    1.0 + contrast as f32 / 100.0
}

/// `128 + brightness`, saturating at 255.
pub fn brightness_target(brightness: u8) -> u8 {
    128u8.saturating_add(brightness)
}

/// Number of sharpen passes for a sharpness value: `ceil(sharpness / 33)`.
pub fn sharpen_passes(sharpness: u8) -> u32 {
    (sharpness as u32).div_ceil(33)
}

/// Full pipeline: grayscale, then contrast, brightness, adaptive threshold and
/// sharpening as enabled by `settings`. Deterministic for identical inputs.
#[instrument(skip(image, settings), fields(width = image.width(), height = image.height()))]
pub fn enhance(image: &DynamicImage, settings: &EnhancementSettings) -> Result<GrayImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::TransformFailure(format!(
            "cannot enhance an empty {}x{} raster",
            image.width(),
            image.height()
        )));
    }
    let output = ScanEnhancer::from_dynamic(image).apply(settings).into_gray();
    debug!("Enhancement pipeline complete");
    Ok(output)
}

/// Crop to `area` and enhance the result.
pub fn enhance_region(
    image: &DynamicImage,
    area: &CropArea,
    settings: &EnhancementSettings,
) -> Result<GrayImage> {
    let cropped = ImageProcessor::from_dynamic(image.clone()).crop(area).into_dynamic();
    enhance(&cropped, settings)
}

/// Decode captured bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    ImageProcessor::from_bytes(bytes).map(ImageProcessor::into_dynamic)
}

/// Encode an enhanced raster as JPEG (`quality` in `0.0..=1.0`).
pub fn encode(image: &GrayImage, quality: f32) -> Result<Vec<u8>> {
    ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(image.clone())).to_jpeg_bytes(quality)
}

/// Decode, crop, enhance and re-encode in one call. Used whenever a page's
/// displayed preview must be regenerated.
#[instrument(skip(original, settings), fields(original_len = original.len()))]
pub fn render_preview(
    original: &[u8],
    area: &CropArea,
    settings: &EnhancementSettings,
    quality: f32,
) -> Result<Vec<u8>> {
    let decoded = decode(original)?;
    let enhanced = enhance_region(&decoded, area, settings)?;
    let bytes = encode(&enhanced, quality)?;
    info!(
        width = enhanced.width(),
        height = enhanced.height(),
        bytes = bytes.len(),
        "Preview rendered"
    );
    Ok(bytes)
}

// -- Integral image helpers ---------------------------------------------------

/// Compute the integral (summed-area table) of a grayscale image.
///
/// `integral[y * (width+1) + x]` holds the sum of all pixels in `[0, x) x [0, y)`.
/// The table is `(width+1) x (height+1)` with a zero border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean pixel value of the square centred on (cx, cy) with the given radius,
/// clipped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    if area == 0.0 {
        return 128.0;
    }

    let sum = integral[y2 * stride + x2] as f64
        - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Horizontal ramp with a dark "text" bar, enough structure for every step
    /// to change something.
    fn sample_page() -> DynamicImage {
        let mut img = RgbImage::from_fn(64, 48, |x, y| {
            let v = (60 + x * 2 + y) as u8;
            Rgb([v, v.saturating_add(10), v.saturating_sub(10)])
        });
        for y in 20..26 {
            for x in 8..56 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn sharpen_pass_counts() {
        assert_eq!(sharpen_passes(0), 0);
        assert_eq!(sharpen_passes(1), 1);
        assert_eq!(sharpen_passes(33), 1);
        assert_eq!(sharpen_passes(34), 2);
        assert_eq!(sharpen_passes(66), 2);
        assert_eq!(sharpen_passes(67), 3);
        assert_eq!(sharpen_passes(100), 4);
    }

    #[test]
    fn contrast_remaps_around_mid_gray() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[28u8, 128, 228][x as usize]]));
        let out = ScanEnhancer::from_gray(img).enhance_contrast(contrast_factor(50)).into_gray();
        // 128 + (28-128)*1.5 = -22 -> 0; 128 stays; 128 + 100*1.5 = 278 -> 255
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 128);
        assert_eq!(out.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn brightness_moves_mean_to_target() {
        let img = GrayImage::from_pixel(10, 10, Luma([100u8]));
        let out = ScanEnhancer::from_gray(img)
            .adjust_brightness(brightness_target(40))
            .into_gray();
        assert!(out.pixels().all(|p| p.0[0] == 168));
    }

    #[test]
    fn brightness_clamps_at_white() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 250u8 } else { 10 }]));
        // mean 130, target 255 -> shift +125
        let out = ScanEnhancer::from_gray(img).adjust_brightness(255).into_gray();
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(1, 0).0[0], 135);
    }

    #[test]
    fn adaptive_threshold_is_binary() {
        let gray = to_grayscale(&sample_page());
        let out = ScanEnhancer::from_gray(gray).adaptive_threshold(11, 5).into_gray();
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        // The dark bar sits well below its neighbourhood mean.
        assert_eq!(out.get_pixel(32, 20).0[0], 0);
    }

    #[test]
    fn adaptive_threshold_on_flat_image_is_white() {
        let flat = GrayImage::from_pixel(20, 20, Luma([90u8]));
        let out = ScanEnhancer::from_gray(flat).adaptive_threshold(7, 0).into_gray();
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn sharpen_leaves_flat_regions_alone() {
        let flat = GrayImage::from_pixel(8, 8, Luma([77u8]));
        let out = ScanEnhancer::from_gray(flat).sharpen().into_gray();
        assert!(out.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn pipeline_is_deterministic() {
        let page = sample_page();
        let settings = EnhancementSettings {
            brightness: 20,
            contrast: 35,
            adaptive_threshold: true,
            adaptive_block_size: 15,
            adaptive_constant: 4,
            sharpness: 50,
        };
        let a = enhance(&page, &settings).unwrap();
        let b = enhance(&page, &settings).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn zeroed_settings_are_plain_grayscale() {
        let page = sample_page();
        let settings = EnhancementSettings {
            brightness: 0,
            contrast: 0,
            adaptive_threshold: false,
            adaptive_block_size: 3,
            adaptive_constant: 0,
            sharpness: 0,
        };
        let out = enhance(&page, &settings).unwrap();
        assert_eq!(out.as_raw(), to_grayscale(&page).as_raw());
    }

    #[test]
    fn empty_raster_is_a_transform_failure() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = enhance(&empty, &EnhancementSettings::default()).err();
        assert!(matches!(err, Some(ScanError::TransformFailure(_))));
    }

    #[test]
    fn render_preview_crops_before_enhancing() {
        let png = ImageProcessor::from_dynamic(sample_page()).to_png_bytes().unwrap();
        let area = CropArea::new(4.0, 4.0, 50.0, 30.0);
        let jpeg = render_preview(&png, &area, &EnhancementSettings::document(), PREVIEW_QUALITY)
            .unwrap();
        let decoded = decode(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 30));
    }

    #[test]
    fn render_preview_rejects_malformed_bytes() {
        let err = render_preview(
            &[0xde, 0xad, 0xbe, 0xef],
            &CropArea::new(0.0, 0.0, 10.0, 10.0),
            &EnhancementSettings::default(),
            PREVIEW_QUALITY,
        )
        .err();
        assert!(matches!(err, Some(ScanError::TransformFailure(_))));
    }

    #[test]
    fn region_mean_clips_at_corner() {
        let img = GrayImage::from_fn(4, 4, |x, y| Luma([(x + y * 4) as u8]));
        let integral = compute_integral_image(&img);
        // Radius 1 around (0,0) covers (0,0),(1,0),(0,1),(1,1) = 0,1,4,5
        assert!((region_mean(&integral, 4, 4, 0, 0, 1) - 2.5).abs() < 1e-9);
    }
}
