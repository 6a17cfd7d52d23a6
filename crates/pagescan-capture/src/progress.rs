// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing progress — percentage, elapsed clock, ETA, and the two-step
// cancel confirmation shown while pages are being processed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pagescan_core::error::{Result, ScanError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info};

/// `round(current / total * 100)`, or 0 for an empty batch.
pub fn progress_percentage(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (current as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Render seconds as `m:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Default)]
pub struct ProgressTracker {
    current: usize,
    total: usize,
    estimated_remaining: Option<u64>,
    elapsed: Arc<AtomicU64>,
    ticker: Option<JoinHandle<()>>,
    confirming: bool,
    cancelled: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the elapsed clock. Without a tokio runtime the host is expected
    /// to call `tick()` itself once a second.
    pub fn activate(&mut self) {
        self.deactivate();
        self.elapsed.store(0, Ordering::Relaxed);
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime, elapsed clock is host-driven");
            return;
        };
        let elapsed = Arc::clone(&self.elapsed);
        self.ticker = Some(handle.spawn(async move {
            let period = Duration::from_secs(1);
            let mut clock = interval_at(Instant::now() + period, period);
            loop {
                clock.tick().await;
                elapsed.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    /// Stop the elapsed clock.
    pub fn deactivate(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    pub fn tick(&self) {
        self.elapsed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    pub fn set_progress(&mut self, current: usize, total: usize, estimated_remaining: Option<u64>) {
        self.current = current;
        self.total = total;
        self.estimated_remaining = estimated_remaining;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn estimated_remaining(&self) -> Option<u64> {
        self.estimated_remaining
    }

    pub fn percentage(&self) -> u8 {
        progress_percentage(self.current, self.total)
    }

    /// "Processing page 3 of 10".
    pub fn status_line(&self) -> String {
        format!("Processing page {} of {}", self.current.min(self.total), self.total)
    }

    // -- Cancellation ---------------------------------------------------------

    /// Open the confirmation dialog.
    pub fn request_cancel(&mut self) {
        self.confirming = true;
    }

    pub fn dismiss_cancel(&mut self) {
        self.confirming = false;
    }

    pub fn is_confirming(&self) -> bool {
        self.confirming
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Confirm a previously requested cancel. Ignored when the dialog is not
    /// open.
    pub fn confirm_cancel(&mut self) -> Result<()> {
        if !self.confirming {
            return Ok(());
        }
        self.confirming = false;
        self.cancelled = true;
        self.deactivate();
        info!(current = self.current, total = self.total, "processing cancelled");
        Err(ScanError::CancellationConfirmed)
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.deactivate();
    }
}
