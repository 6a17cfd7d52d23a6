// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the headless capture driver.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pagescan_core::types::EnhancementSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Document,
    Photo,
}

impl Preset {
    pub fn settings(self) -> EnhancementSettings {
        match self {
            Preset::Document => EnhancementSettings::document(),
            Preset::Photo => EnhancementSettings::photo(),
        }
    }
}

/// Run image files through a full capture session: auto-crop, enhancement,
/// review, naming and assembly.
#[derive(Debug, Parser)]
#[command(name = "pagescan", version, about)]
pub struct Args {
    /// Page images, in page order.
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Subject used to pre-fill the document name ("<subject> - ").
    #[arg(long, default_value = "Scan")]
    pub subject: String,

    /// Document name. Defaults to the pre-filled name.
    #[arg(long)]
    pub name: Option<String>,

    /// Directory the document is written into.
    #[arg(long, short, default_value = ".")]
    pub out: PathBuf,

    /// Enhancement preset. Overrides the configured settings.
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Rotate these pages 90 degrees clockwise (repeatable).
    #[arg(long, value_name = "PAGE")]
    pub rotate: Vec<u32>,

    /// Drop these pages before assembly (repeatable).
    #[arg(long, value_name = "PAGE")]
    pub delete: Vec<u32>,

    /// Directory holding scan-config.json. Defaults to the data directory.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Write the effective configuration back to the config file.
    #[arg(long)]
    pub save_config: bool,
}
