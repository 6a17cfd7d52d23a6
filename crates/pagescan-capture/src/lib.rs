// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-capture — the interactive side of a capture session.
//
// The controller owns the session's pages and moves it through capture,
// processing, review, manual cropping, naming and assembly. The crop editor,
// review grid, progress tracker and namer are usable on their own by hosts
// that render their own UI.

pub mod controller;
pub mod crop;
pub mod input;
pub mod namer;
pub mod pages;
pub mod progress;
pub mod review;

pub use controller::{CaptureController, Collaborators, Phase, Processed};
pub use crop::{CropEditor, CropOutcome, Interaction};
pub use input::Key;
pub use namer::{DocumentNamer, NamerOutcome};
pub use pages::PageArena;
pub use progress::{ProgressTracker, format_clock, progress_percentage};
pub use review::{Badge, ReviewEvent, ReviewGrid};
