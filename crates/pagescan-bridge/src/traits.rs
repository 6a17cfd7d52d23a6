// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for everything the capture pipeline
// consumes but does not implement: the camera, haptics, the automatic edge
// detector, and the document assembler.

use image::DynamicImage;
use pagescan_core::error::Result;
use pagescan_core::types::{Quad, Rotation};

/// Native capabilities grouped per platform.
///
/// Platforms that lack a capability return
/// `ScanError::PlatformUnavailable` from the stub implementation.
pub trait PlatformBridge: NativeCamera + NativeHaptics {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;
}

/// Capture page images, one at a time, in capture order.
pub trait NativeCamera {
    /// Capture one page and return its encoded bytes.
    /// Returns Ok(None) when the user has finished capturing.
    fn capture_page(&self) -> Result<Option<Vec<u8>>>;
}

/// Tactile feedback for gestures that act without confirmation.
pub trait NativeHaptics {
    /// Short impact pulse.
    fn impact(&self) -> Result<()>;
}

/// Automatic document boundary detection.
pub trait EdgeDetector {
    /// Find the page quadrilateral in source-pixel coordinates, or `None` if
    /// no boundary could be found.
    fn detect(&self, image: &DynamicImage) -> Option<Quad>;
}

/// One page handed to the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyPage {
    pub page_number: u32,
    /// Encoded page image (enhanced when available, otherwise as captured).
    pub buffer: Vec<u8>,
    pub rotation: Rotation,
}

/// Turns the final ordered page set into a document.
pub trait DocumentAssembler {
    /// File extension (without the dot) appended to the user's document name.
    fn extension(&self) -> &str {
        "pdf"
    }

    /// Build the document. `pages` are in final order.
    fn assemble(&self, pages: &[AssemblyPage], file_name: &str) -> Result<()>;
}
