// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan — headless capture driver.
//
// Entry point. Initialises logging, loads the configuration, and runs the
// given image files through one capture session using desktop stand-ins for
// the camera, edge detector and document assembler.

mod cli;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pagescan_bridge::stub::StubBridge;
use pagescan_capture::{Badge, CaptureController, Collaborators, Phase, format_clock};
use pagescan_core::config::ScanConfig;
use pagescan_core::error::{Result, ScanError};
use pagescan_core::human_errors::humanize_error;
use pagescan_core::types::PageId;

use cli::Args;
use services::data_dir;
use services::host::{DirectoryAssembler, FileCamera, FullFrameDetector, document_dir};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Pagescan starting");
    let bridge = pagescan_bridge::platform_bridge();
    tracing::info!(platform = bridge.platform_name(), "files stand in for the native camera");

    let args = Args::parse();
    match run(args) {
        Ok(path) => {
            println!("Saved {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            let human = humanize_error(&e);
            tracing::error!(error = %e, "session failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<ScanConfig> {
    let dir = args.config_dir.clone().unwrap_or_else(data_dir::data_dir);
    let mut config = ScanConfig::load_or_default(&dir);
    if let Some(preset) = args.preset {
        config.enhancement = preset.settings();
    }
    config.validate()?;
    if args.save_config {
        config.save(&dir)?;
        tracing::info!(path = %data_dir::config_path(&dir).display(), "configuration saved");
    }
    Ok(config)
}

fn run(args: Args) -> Result<PathBuf> {
    let config = load_config(&args)?;
    let assembler =
        DirectoryAssembler::new(&args.out, config.document_extension.clone(), config.preview_quality);

    let mut session = CaptureController::new(
        config,
        Collaborators {
            detector: Box::new(FullFrameDetector),
            assembler: Box::new(assembler),
            haptics: Box::new(StubBridge),
        },
        &args.subject,
    );

    // Capture
    let camera = FileCamera::new(args.images.iter().cloned());
    let captured = session.capture_from(&camera)?;
    tracing::info!(captured, "capture finished");
    session.finish_capture()?;

    // Processing
    while *session.phase() == Phase::Processing {
        let processed = session.process_next()?;
        let progress = session.progress();
        let eta = progress
            .estimated_remaining()
            .map(format_clock)
            .unwrap_or_else(|| "--:--".into());
        eprintln!(
            "{} ({}%) page {} {:?}, about {} left",
            progress.status_line(),
            progress.percentage(),
            processed.page_number,
            processed.status,
            eta
        );
    }

    // Review
    for &page_number in &args.rotate {
        let id = page_id(&session, page_number)?;
        session.on_rotate(id)?;
    }
    for &page_number in &args.delete {
        let id = page_id(&session, page_number)?;
        session.on_delete(id)?;
        session.confirm_delete()?;
    }
    for page in session.pages() {
        let badge = Badge::for_page(page);
        eprintln!(
            "  page {:>3}  {:>4}x{:<4}  {:>3}°  {:?}",
            page.page_number,
            page.width,
            page.height,
            page.rotation.degrees(),
            badge
        );
    }

    // Naming and assembly
    session.on_continue()?;
    let name = match args.name {
        Some(name) => name,
        None => session
            .namer()
            .map(|n| n.value().to_string())
            .unwrap_or_default(),
    };
    let file_name = session.on_submit(&name)?;

    match session.phase() {
        Phase::Done { .. } => Ok(document_dir(&args.out, &file_name)),
        other => Err(ScanError::InvalidPhase {
            action: "finish",
            phase: other.to_string(),
        }),
    }
}

fn page_id(session: &CaptureController, page_number: u32) -> Result<PageId> {
    session
        .page(page_number)
        .map(|p| p.id)
        .ok_or_else(|| ScanError::PageNotFound(format!("page {page_number}")))
}
