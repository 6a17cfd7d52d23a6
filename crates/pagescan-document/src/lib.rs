// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-document — Page image processing for the Pagescan capture pipeline.
//
// Provides page-level image operations (decode, crop, quarter-turn rotation,
// encoding) and the enhancement pipeline (grayscale, contrast, brightness,
// adaptive threshold, sharpening) with a debounced tuning session.

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `pagescan_document::ScanEnhancer` etc.
pub use image::processor::ImageProcessor;
pub use scan::enhance::ScanEnhancer;
pub use scan::tuning::{Preview, TuningSession};
