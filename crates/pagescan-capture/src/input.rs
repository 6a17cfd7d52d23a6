// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keyboard input shared by the review grid, crop editor, and namer.

/// A key press, already decoded by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Delete,
    Backspace,
    Char(char),
}

impl Key {
    /// Case-insensitive character match.
    pub fn is_char(&self, wanted: char) -> bool {
        matches!(self, Key::Char(c) if c.eq_ignore_ascii_case(&wanted))
    }
}
