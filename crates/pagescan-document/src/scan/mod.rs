// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — per-pixel enhancement of captured pages and the
// debounced tuning session that previews it.

pub mod enhance;
pub mod tuning;

pub use enhance::ScanEnhancer;
pub use tuning::TuningSession;
