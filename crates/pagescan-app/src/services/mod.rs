// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop host services — the collaborators a capture session needs when
// there is no native camera: image files stand in for photos, every frame is
// treated as the page, and the result is written to a directory.

pub mod data_dir;
pub mod host;
