// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagescan capture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest crop rectangle edge, in source pixels.
pub const MIN_CROP_SIZE: f32 = 50.0;

/// Unique identifier for a captured page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 2D point. Units depend on context (source pixels or logical view pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Four-corner polygon approximating a document's physical boundary, in
/// source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Quad {
    /// The four corners in `[top_left, top_right, bottom_left, bottom_right]` order.
    pub fn points(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_left, self.bottom_right]
    }
}

/// Axis-aligned crop rectangle in source-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropArea {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole image.
    pub fn full(image_width: u32, image_height: u32) -> Self {
        Self::new(0.0, 0.0, image_width as f32, image_height as f32)
    }

    /// Axis-aligned bounding box of the quad's four points.
    pub fn bounding_box(quad: &Quad) -> Self {
        let points = quad.points();
        let min_x = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the rectangle lies inside `[0, w] x [0, h]` and respects the
    /// minimum edge length (capped at the image's own size).
    pub fn is_valid_for(&self, image_width: u32, image_height: u32, min_size: f32) -> bool {
        let (w, h) = (image_width as f32, image_height as f32);
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= w
            && self.bottom() <= h
            && self.width >= min_size.min(w)
            && self.height >= min_size.min(h)
    }

    /// Force the rectangle inside the image, moving the origin if needed.
    ///
    /// Used for rectangles that come from outside the editor (detected quads,
    /// host-supplied crops). The editor itself only trims.
    pub fn fit_within(&self, image_width: u32, image_height: u32, min_size: f32) -> Self {
        let (w, h) = (image_width as f32, image_height as f32);
        let min_w = min_size.min(w);
        let min_h = min_size.min(h);

        let x = self.x.clamp(0.0, (w - min_w).max(0.0));
        let y = self.y.clamp(0.0, (h - min_h).max(0.0));
        let width = self.width.max(min_w).min(w - x);
        let height = self.height.max(min_h).min(h - y);
        Self::new(x, y, width, height)
    }

    /// Integer pixel rectangle `(x, y, width, height)` suitable for cropping.
    pub fn to_pixel_rect(&self) -> (u32, u32, u32, u32) {
        let x = self.x.max(0.0).round() as u32;
        let y = self.y.max(0.0).round() as u32;
        let width = self.width.max(0.0).round() as u32;
        let height = self.height.max(0.0).round() as u32;
        (x, y, width, height)
    }
}

/// Processing outcome of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStatus {
    Ready,
    /// Edge detection failed or the buffer could not be decoded.
    Error,
}

/// Clockwise page rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalise any whole-degree angle onto the nearest lower quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Rotate a further 90 degrees clockwise, wrapping at 360.
    pub fn turned(&self) -> Self {
        Self::from_degrees(self.degrees() as i32 + 90)
    }
}

/// Parameters for one enhancement tuning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementSettings {
    /// 0..=127, added to 128 to form the brightness target.
    pub brightness: u8,
    /// 0..=100, contrast factor is `1 + contrast / 100`.
    pub contrast: u8,
    pub adaptive_threshold: bool,
    /// Odd, 3..=31.
    pub adaptive_block_size: u8,
    /// 0..=30, subtracted from the local mean.
    pub adaptive_constant: u8,
    /// 0..=100; sharpen passes are `ceil(sharpness / 33)`.
    pub sharpness: u8,
}

impl EnhancementSettings {
    /// Preset for text documents: contrast boost plus adaptive binarisation.
    pub fn document() -> Self {
        Self {
            brightness: 0,
            contrast: 40,
            adaptive_threshold: true,
            adaptive_block_size: 31,
            adaptive_constant: 10,
            sharpness: 0,
        }
    }

    /// Preset for photos and receipts with shading: no binarisation.
    pub fn photo() -> Self {
        Self {
            brightness: 0,
            contrast: 20,
            adaptive_threshold: false,
            adaptive_block_size: 11,
            adaptive_constant: 2,
            sharpness: 33,
        }
    }

    /// Clamp every field into its valid range. Even block sizes round up.
    pub fn normalized(&self) -> Self {
        let mut block = self.adaptive_block_size.clamp(3, 31);
        if block % 2 == 0 {
            block += 1;
        }
        Self {
            brightness: self.brightness.min(127),
            contrast: self.contrast.min(100),
            adaptive_threshold: self.adaptive_threshold,
            adaptive_block_size: block.min(31),
            adaptive_constant: self.adaptive_constant.min(30),
            sharpness: self.sharpness.min(100),
        }
    }
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self::document()
    }
}

/// One captured page and everything derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub id: PageId,
    pub page_number: u32,
    /// Raw captured bytes. Never modified after capture.
    pub original: Vec<u8>,
    /// Cropped, enhanced raster encoded for display.
    pub preview: Option<Vec<u8>>,
    /// Decoded width of `original`; 0 when it could not be decoded.
    pub width: u32,
    pub height: u32,
    pub crop_area: CropArea,
    pub detected_edges: Option<Quad>,
    pub marked_for_retake: bool,
    pub marked_for_crop: bool,
    pub status: PageStatus,
    pub rotation: Rotation,
    pub captured_at: DateTime<Utc>,
}

impl ProcessedImage {
    /// A fresh page covering the full image, ready for review.
    pub fn new(page_number: u32, original: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            id: PageId::new(),
            page_number,
            original,
            preview: None,
            width,
            height,
            crop_area: CropArea::full(width, height),
            detected_edges: None,
            marked_for_retake: false,
            marked_for_crop: false,
            status: PageStatus::Ready,
            rotation: Rotation::Deg0,
            captured_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == PageStatus::Error
    }

    /// The crop the page would get from auto-detection alone: the detected
    /// quad's bounding box, or the full frame.
    pub fn auto_crop(&self, min_size: f32) -> CropArea {
        match self.detected_edges {
            Some(ref quad) => {
                CropArea::bounding_box(quad).fit_within(self.width, self.height, min_size)
            }
            None => CropArea::full(self.width, self.height),
        }
    }
}
