// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan — collaborator interfaces for the capture pipeline.
//
// The pipeline never talks to a camera, a haptic engine, an edge detector, or
// a document encoder directly. It goes through the traits defined here, so the
// same controller runs on a phone, a desktop, or in tests.

pub mod stub;
pub mod traits;

pub use traits::{
    AssemblyPage, DocumentAssembler, EdgeDetector, NativeCamera, NativeHaptics, PlatformBridge,
};

/// Retrieve the bridge implementation for the current platform.
///
/// Only the stub ships in this workspace; mobile hosts construct their own
/// `PlatformBridge` and hand it to the controller.
pub fn platform_bridge() -> Box<dyn traits::PlatformBridge> {
    Box::new(stub::StubBridge)
}
