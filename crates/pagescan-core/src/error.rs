// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagescan.

use thiserror::Error;

/// Top-level error type for all Pagescan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Pipeline errors --
    #[error("edge detection failed: {0}")]
    DetectionFailure(String),

    #[error("image transform failed: {0}")]
    TransformFailure(String),

    #[error("invalid input: {0}")]
    ValidationFailure(String),

    #[error("nothing to process: {0}")]
    NothingToProcess(String),

    #[error("capture session cancelled")]
    CancellationConfirmed,

    // -- Session state --
    #[error("{action} is not allowed while {phase}")]
    InvalidPhase { action: &'static str, phase: String },

    #[error("page not found: {0}")]
    PageNotFound(String),

    // -- Collaborators --
    #[error("document assembly failed: {0}")]
    Assembly(String),

    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Storage / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
