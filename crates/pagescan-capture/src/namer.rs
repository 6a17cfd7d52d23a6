// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document naming prompt.

use pagescan_core::error::{Result, ScanError};

use crate::input::Key;

const EMPTY_NAME: &str = "Please enter a document name";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamerOutcome {
    Submitted(String),
    Cancelled,
}

/// Name field pre-filled with the subject, e.g. `"Acme Corp - "`.
#[derive(Debug, Clone)]
pub struct DocumentNamer {
    value: String,
    error: Option<String>,
}

impl DocumentNamer {
    pub fn new(subject_name: &str) -> Self {
        Self {
            value: format!("{subject_name} - "),
            error: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the field contents. Editing clears any validation error.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.error = None;
    }

    /// Validate and return the trimmed name.
    pub fn submit(&mut self) -> Result<String> {
        let trimmed = self.value.trim();
        if trimmed.is_empty() {
            self.error = Some(EMPTY_NAME.to_string());
            return Err(ScanError::ValidationFailure(EMPTY_NAME.to_string()));
        }
        Ok(trimmed.to_string())
    }

    /// Enter submits, Escape cancels. A rejected submit stays in the dialog
    /// and reports `None`.
    pub fn handle_key(&mut self, key: Key) -> Option<NamerOutcome> {
        match key {
            Key::Enter => self.submit().ok().map(NamerOutcome::Submitted),
            Key::Escape => Some(NamerOutcome::Cancelled),
            _ => None,
        }
    }
}
