// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Every capability returns `PlatformUnavailable`; desktop hosts supply their
// own camera (e.g. reading files) instead.

use pagescan_core::error::{Result, ScanError};

use crate::traits::*;

/// No-op bridge returned on non-mobile platforms.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCamera for StubBridge {
    fn capture_page(&self) -> Result<Option<Vec<u8>>> {
        tracing::warn!("NativeCamera::capture_page called on stub bridge");
        Err(ScanError::PlatformUnavailable)
    }
}

impl NativeHaptics for StubBridge {
    fn impact(&self) -> Result<()> {
        tracing::debug!("NativeHaptics::impact called on stub bridge");
        Err(ScanError::PlatformUnavailable)
    }
}
