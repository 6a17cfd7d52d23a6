// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages for the capture screens.
//
// Nothing in the pipeline retries on its own, so every message tells the user
// which action gets them unstuck (retake, crop, rename, try again).

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it right here (retake, crop, type a name).
    ActionRequired,
    /// Repeating the same action may work.
    Recoverable,
    /// The session or feature cannot continue.
    Permanent,
}

/// A human-readable error with a message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the user's last action makes sense.
    pub retriable: bool,
    /// Drives icon/colour.
    pub severity: Severity,
}

/// Convert a `ScanError` into something a person holding a phone can act on.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        // -- Pipeline --
        ScanError::DetectionFailure(_) => HumanError {
            message: "We couldn't find the edges of this page.".into(),
            suggestion: "Adjust the crop by hand, or retake the photo on a darker, plain background.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::TransformFailure(_) => HumanError {
            message: "This page couldn't be enhanced.".into(),
            suggestion: "Change one of the enhancement settings to try again, or retake the page.".into(),
            retriable: true,
            severity: Severity::Recoverable,
        },

        ScanError::ValidationFailure(detail) => HumanError {
            message: detail.clone(),
            suggestion: "Type a name for the document, then press Enter.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::NothingToProcess(_) => HumanError {
            message: "There are no pages to work with.".into(),
            suggestion: "Capture a page first, or mark a page for retake.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::CancellationConfirmed => HumanError {
            message: "Scanning was cancelled.".into(),
            suggestion: "Start a new scan when you're ready. Nothing from this session was kept.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Session --
        ScanError::InvalidPhase { .. } => HumanError {
            message: "That isn't possible right now.".into(),
            suggestion: "Finish the current step first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::PageNotFound(_) => HumanError {
            message: "That page is no longer in this scan.".into(),
            suggestion: "It may have been deleted. Pick another page.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Collaborators --
        ScanError::Assembly(_) => HumanError {
            message: "The document couldn't be created.".into(),
            suggestion: "Your pages are still here. Press Enter on the name to try again.".into(),
            retriable: true,
            severity: Severity::Recoverable,
        },

        ScanError::Bridge(_) => HumanError {
            message: "The camera or a device feature didn't respond.".into(),
            suggestion: "Close other apps using the camera and try again.".into(),
            retriable: true,
            severity: Severity::Recoverable,
        },

        ScanError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Load page images from files instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Storage --
        ScanError::Config(_) => HumanError {
            message: "The scanner settings file has invalid values.".into(),
            suggestion: "Default settings will be used. Re-save your settings to fix the file.".into(),
            retriable: false,
            severity: Severity::Recoverable,
        },

        ScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Choose the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or pick a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Recoverable,
                }
            }
        }

        ScanError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Recoverable,
        },
    }
}
