// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Enhancement tuning session — debounced preview recomputation.
//
// Every settings change bumps a generation counter and replaces the scheduled
// computation. A scheduled computation only starts if its generation is still
// current when the quiet period ends, and only publishes if it is still current
// when it finishes. A computation that has started always runs to completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use image::{DynamicImage, GrayImage};
use pagescan_core::types::EnhancementSettings;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::enhance::enhance;

/// Quiet period applied when the caller does not supply one.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// A committed preview and the settings generation that produced it.
#[derive(Debug, Clone)]
pub struct Preview {
    pub generation: u64,
    pub settings: EnhancementSettings,
    pub image: Arc<GrayImage>,
}

/// One scheduled recomputation.
struct Job {
    generation: u64,
    settings: EnhancementSettings,
    source: Arc<DynamicImage>,
    current: Arc<AtomicU64>,
    output: Arc<watch::Sender<Option<Preview>>>,
}

impl Job {
    /// Run the pipeline if this job is still current, then publish if it is
    /// still current afterwards. Returns whether a preview was published.
    fn run(&self) -> bool {
        if self.current.load(Ordering::Acquire) != self.generation {
            debug!(generation = self.generation, "superseded before start, skipping");
            return false;
        }

        match enhance(&self.source, &self.settings) {
            Ok(image) => {
                if self.current.load(Ordering::Acquire) != self.generation {
                    debug!(generation = self.generation, "finished stale, discarding");
                    return false;
                }
                self.output.send_replace(Some(Preview {
                    generation: self.generation,
                    settings: self.settings,
                    image: Arc::new(image),
                }));
                debug!(generation = self.generation, "preview committed");
                true
            }
            Err(e) => {
                warn!(
                    generation = self.generation,
                    error = %e,
                    "preview recompute failed, keeping previous preview"
                );
                false
            }
        }
    }
}

/// Live tuning of `EnhancementSettings` against one source raster.
///
/// Outside a Tokio runtime there is nothing to debounce on, so `update`
/// recomputes synchronously.
pub struct TuningSession {
    source: Arc<DynamicImage>,
    settings: EnhancementSettings,
    quiet_period: Duration,
    current: Arc<AtomicU64>,
    output: Arc<watch::Sender<Option<Preview>>>,
    pending: Option<JoinHandle<()>>,
}

impl TuningSession {
    /// Open a session and compute the initial preview synchronously.
    pub fn start(
        source: DynamicImage,
        settings: EnhancementSettings,
        quiet_period: Duration,
    ) -> Self {
        let settings = settings.normalized();
        info!(
            width = source.width(),
            height = source.height(),
            quiet_ms = quiet_period.as_millis() as u64,
            "Tuning session started"
        );
        let (tx, _rx) = watch::channel(None);
        let session = Self {
            source: Arc::new(source),
            settings,
            quiet_period,
            current: Arc::new(AtomicU64::new(0)),
            output: Arc::new(tx),
            pending: None,
        };
        session.job(0, settings).run();
        session
    }

    fn job(&self, generation: u64, settings: EnhancementSettings) -> Job {
        Job {
            generation,
            settings,
            source: Arc::clone(&self.source),
            current: Arc::clone(&self.current),
            output: Arc::clone(&self.output),
        }
    }

    /// Settings most recently requested (not necessarily rendered yet).
    pub fn settings(&self) -> EnhancementSettings {
        self.settings
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Latest committed preview, if any computation has succeeded.
    pub fn preview(&self) -> Option<Preview> {
        self.output.borrow().clone()
    }

    /// Receive every committed preview.
    pub fn subscribe(&self) -> watch::Receiver<Option<Preview>> {
        self.output.subscribe()
    }

    /// Whether a scheduled computation has not yet finished.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Request new settings. Replaces any not-yet-started computation.
    pub fn update(&mut self, settings: EnhancementSettings) {
        let settings = settings.normalized();
        self.settings = settings;
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;

        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        let job = self.job(generation, settings);
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(generation, "no runtime, recomputing immediately");
            job.run();
            return;
        };
        let quiet = self.quiet_period;
        debug!(generation, "recompute scheduled");
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(quiet).await;
            job.run();
        }));
    }

    /// Wait for the last scheduled computation, if any.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "tuning task ended abnormally");
                }
            }
        }
    }
}

impl Drop for TuningSession {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
