// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image processor — decode, crop to a `CropArea`, quarter-turn rotation,
// grayscale, and JPEG/PNG encoding. Operates on in-memory images using the
// `image` crate.

use image::{DynamicImage, ImageFormat};
use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::{CropArea, Rotation};
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single decoded page.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&captured)?
///     .crop(&page.crop_area)
///     .rotate(page.rotation)
///     .to_jpeg_bytes(0.95)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanError::TransformFailure(format!("failed to decode page image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Page image decoded"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate clockwise by a quarter-turn multiple. Lossless.
    #[instrument(skip(self), fields(degrees = rotation.degrees()))]
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::Deg0 => self.image,
            Rotation::Deg90 => self.image.rotate90(),
            Rotation::Deg180 => self.image.rotate180(),
            Rotation::Deg270 => self.image.rotate270(),
        };
        Self { image }
    }

    /// Crop to `area`, rounded to whole pixels and clamped to image bounds.
    #[instrument(skip(self), fields(x = area.x, y = area.y, width = area.width, height = area.height))]
    pub fn crop(self, area: &CropArea) -> Self {
        let (x, y, width, height) = area.to_pixel_rect();
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w.saturating_sub(safe_x));
        let safe_h = height.min(img_h.saturating_sub(safe_y));

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping page");

        Self {
            image: self.image.crop_imm(safe_x, safe_y, safe_w, safe_h),
        }
    }

    /// Convert the image to grayscale (luma).
    pub fn grayscale(self) -> Self {
        Self {
            image: self.image.grayscale(),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode the current image as JPEG. `quality` is a fraction in `0.0..=1.0`.
    pub fn to_jpeg_bytes(&self, quality: f32) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
        let result = match self.image {
            DynamicImage::ImageLuma8(ref gray) => gray.write_with_encoder(encoder),
            ref other => other.to_rgb8().write_with_encoder(encoder),
        };
        result.map_err(|err| ScanError::TransformFailure(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Map a `0.0..=1.0` quality fraction onto the encoder's 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    ((quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1)
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanError::TransformFailure(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
