// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session controller — owns the pages and drives a session through
// capture, processing, review, manual cropping, naming and assembly.
//
// Every method checks the current phase first and returns
// `ScanError::InvalidPhase` when called out of turn, so hosts can wire UI
// events straight through without guarding them.

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use image::DynamicImage;
use pagescan_bridge::{AssemblyPage, DocumentAssembler, EdgeDetector, NativeCamera, NativeHaptics};
use pagescan_core::config::ScanConfig;
use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::{
    CropArea, EnhancementSettings, PageId, PageStatus, Point, ProcessedImage,
};
use pagescan_document::TuningSession;
use pagescan_document::image::processor::ImageProcessor;
use pagescan_document::scan::enhance;
use tracing::{debug, info, instrument, warn};

use crate::crop::{CropEditor, CropOutcome};
use crate::input::Key;
use crate::namer::{DocumentNamer, NamerOutcome};
use crate::progress::ProgressTracker;
use crate::review::{ReviewEvent, ReviewGrid};

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Taking photos. `retake` scopes captures to pages marked for retake.
    Capturing { retake: bool },
    Processing,
    Reviewing,
    CropAdjustment { page_number: u32 },
    Naming,
    Generating,
    Done { file_name: String },
    Cancelled,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Capturing { retake: false } => "capturing",
            Phase::Capturing { retake: true } => "retaking",
            Phase::Processing => "processing",
            Phase::Reviewing => "reviewing",
            Phase::CropAdjustment { .. } => "crop adjustment",
            Phase::Naming => "naming",
            Phase::Generating => "generating",
            Phase::Done { .. } => "done",
            Phase::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The external services a session depends on.
pub struct Collaborators {
    pub detector: Box<dyn EdgeDetector>,
    pub assembler: Box<dyn DocumentAssembler>,
    pub haptics: Box<dyn NativeHaptics>,
}

/// Result of one `process_next` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Processed {
    pub page_number: u32,
    pub status: PageStatus,
    /// Captures still waiting. Zero means the session has moved to review.
    pub remaining: usize,
}

/// A captured buffer waiting for processing.
#[derive(Debug)]
struct PendingCapture {
    page_number: u32,
    buffer: Vec<u8>,
    /// Retake: overwrite the existing page in place.
    replaces: bool,
}

/// Timing for the current processing batch.
#[derive(Debug)]
struct Batch {
    total: usize,
    done: usize,
    started: Instant,
}

impl Batch {
    /// Seconds left, extrapolated from the average time per page so far.
    fn estimated_remaining(&self) -> Option<u64> {
        if self.done == 0 {
            return None;
        }
        let per_page = self.started.elapsed().as_secs_f64() / self.done as f64;
        let left = self.total.saturating_sub(self.done) as f64;
        Some((per_page * left).round() as u64)
    }
}

pub struct CaptureController {
    config: ScanConfig,
    settings: EnhancementSettings,
    collaborators: Collaborators,
    subject_name: String,
    phase: Phase,
    grid: ReviewGrid,
    pending: VecDeque<PendingCapture>,
    retake_queue: VecDeque<u32>,
    crop_queue: VecDeque<u32>,
    crop_editor: Option<CropEditor>,
    namer: Option<DocumentNamer>,
    progress: ProgressTracker,
    batch: Option<Batch>,
    display_scale: f32,
}

impl CaptureController {
    pub fn new(config: ScanConfig, collaborators: Collaborators, subject_name: &str) -> Self {
        info!(subject = subject_name, "capture session started");
        Self {
            settings: config.enhancement.normalized(),
            grid: ReviewGrid::new(config.swipe_threshold),
            config,
            collaborators,
            subject_name: subject_name.to_string(),
            phase: Phase::Capturing { retake: false },
            pending: VecDeque::new(),
            retake_queue: VecDeque::new(),
            crop_queue: VecDeque::new(),
            crop_editor: None,
            namer: None,
            progress: ProgressTracker::new(),
            batch: None,
            display_scale: 1.0,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn grid(&self) -> &ReviewGrid {
        &self.grid
    }

    pub fn pages(&self) -> impl Iterator<Item = &ProcessedImage> {
        self.grid.pages().iter()
    }

    pub fn page(&self, page_number: u32) -> Option<&ProcessedImage> {
        self.grid.pages().get(page_number)
    }

    pub fn page_count(&self) -> usize {
        self.grid.pages().len()
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn settings(&self) -> EnhancementSettings {
        self.settings
    }

    pub fn crop_editor(&self) -> Option<&CropEditor> {
        self.crop_editor.as_ref()
    }

    /// The open editor, for forwarding pointer and touch events.
    pub fn crop_editor_mut(&mut self) -> Option<&mut CropEditor> {
        self.crop_editor.as_mut()
    }

    pub fn namer(&self) -> Option<&DocumentNamer> {
        self.namer.as_ref()
    }

    /// Page numbers still expecting a retake photo.
    pub fn retake_queue(&self) -> Vec<u32> {
        self.retake_queue.iter().copied().collect()
    }

    /// Scale that fits a source image into the crop view at zoom 1.
    pub fn set_display_scale(&mut self, scale: f32) {
        if scale > 0.0 {
            self.display_scale = scale;
        }
    }

    fn invalid(&self, action: &'static str) -> ScanError {
        ScanError::InvalidPhase {
            action,
            phase: self.phase.to_string(),
        }
    }

    fn ensure(&self, action: &'static str, allowed: bool) -> Result<()> {
        if allowed { Ok(()) } else { Err(self.invalid(action)) }
    }

    fn transition(&mut self, next: Phase) {
        info!(from = %self.phase, to = %next, "phase transition");
        // Dialogs and gestures opened during review never outlive it.
        if self.phase == Phase::Reviewing && next != Phase::Reviewing {
            self.grid.cancel_delete();
            self.grid.swipe_cancel();
        }
        self.phase = next;
    }

    // -- Capturing ------------------------------------------------------------

    /// Queue one captured buffer. Returns the page number it will occupy.
    pub fn capture_page(&mut self, buffer: Vec<u8>) -> Result<u32> {
        let Phase::Capturing { retake } = self.phase else {
            return Err(self.invalid("capture_page"));
        };

        let (page_number, replaces) = if retake {
            let target = self.retake_queue.pop_front().ok_or_else(|| {
                ScanError::NothingToProcess("every marked page has been retaken".into())
            })?;
            (target, true)
        } else {
            (self.grid.pages_mut().allocate_number(), false)
        };

        debug!(page_number, bytes = buffer.len(), replaces, "page captured");
        self.pending.push_back(PendingCapture {
            page_number,
            buffer,
            replaces,
        });
        Ok(page_number)
    }

    /// Pull pages from `camera` until it reports the user is done (or, when
    /// retaking, until every marked page has a replacement).
    pub fn capture_from(&mut self, camera: &dyn NativeCamera) -> Result<usize> {
        let mut captured = 0;
        loop {
            if matches!(self.phase, Phase::Capturing { retake: true }) && self.retake_queue.is_empty()
            {
                break;
            }
            match camera.capture_page()? {
                Some(buffer) => {
                    self.capture_page(buffer)?;
                    captured += 1;
                }
                None => break,
            }
        }
        Ok(captured)
    }

    /// Stop capturing and start processing the queued buffers.
    pub fn finish_capture(&mut self) -> Result<()> {
        self.ensure("finish_capture", matches!(self.phase, Phase::Capturing { .. }))?;
        // Marked pages the user did not re-photograph keep their mark.
        self.retake_queue.clear();

        let total = self.pending.len();
        if total == 0 {
            self.transition(Phase::Reviewing);
            return Ok(());
        }

        self.batch = Some(Batch {
            total,
            done: 0,
            started: Instant::now(),
        });
        self.progress.set_progress(0, total, None);
        self.progress.activate();
        self.transition(Phase::Processing);
        Ok(())
    }

    // -- Processing -----------------------------------------------------------

    /// Process exactly one queued capture. Moves to review after the last one.
    pub fn process_next(&mut self) -> Result<Processed> {
        self.ensure("process_next", self.phase == Phase::Processing)?;
        let Some(capture) = self.pending.pop_front() else {
            self.finish_processing();
            return Err(self.invalid("process_next"));
        };

        let page_number = capture.page_number;
        let page = self.process_capture(capture.page_number, capture.buffer);
        let status = page.status;
        if capture.replaces {
            self.grid.pages_mut().replace(page_number, page)?;
        } else {
            self.grid.pages_mut().insert(page)?;
        }

        let remaining = self.pending.len();
        if let Some(batch) = self.batch.as_mut() {
            batch.done += 1;
            self.progress
                .set_progress(batch.done, batch.total, batch.estimated_remaining());
        }
        info!(page_number, ?status, remaining, "page processed");

        if remaining == 0 {
            self.finish_processing();
        }
        Ok(Processed {
            page_number,
            status,
            remaining,
        })
    }

    /// Process everything queued. Stops early if the session is cancelled.
    pub fn process_all(&mut self) -> Result<Vec<Processed>> {
        let mut results = Vec::new();
        while self.phase == Phase::Processing && !self.pending.is_empty() {
            results.push(self.process_next()?);
        }
        Ok(results)
    }

    fn finish_processing(&mut self) {
        self.progress.deactivate();
        self.progress.dismiss_cancel();
        self.batch = None;
        self.transition(Phase::Reviewing);
    }

    /// Decode, detect edges, auto-crop and enhance one capture.
    #[instrument(skip(self, buffer), fields(bytes = buffer.len()))]
    fn process_capture(&self, page_number: u32, buffer: Vec<u8>) -> ProcessedImage {
        let decoded = match enhance::decode(&buffer) {
            Ok(image) => image,
            Err(e) => {
                warn!(page_number, error = %e, "captured buffer could not be decoded");
                let mut page = ProcessedImage::new(page_number, buffer, 0, 0);
                page.status = PageStatus::Error;
                return page;
            }
        };

        let mut page = ProcessedImage::new(page_number, buffer, decoded.width(), decoded.height());
        match self.collaborators.detector.detect(&decoded) {
            Some(quad) => {
                page.detected_edges = Some(quad);
                page.crop_area = page.auto_crop(self.config.min_crop_size);
            }
            None => {
                let err = ScanError::DetectionFailure(format!("no page boundary on page {page_number}"));
                warn!(page_number, error = %err, "edge detection failed, using full frame");
                page.status = PageStatus::Error;
            }
        }

        match self.render(&decoded, &page.crop_area) {
            Ok(preview) => page.preview = Some(preview),
            Err(e) => warn!(page_number, error = %e, "enhancement failed, page has no preview"),
        }
        page
    }

    fn render(&self, decoded: &DynamicImage, area: &CropArea) -> Result<Vec<u8>> {
        let enhanced = enhance::enhance_region(decoded, area, &self.settings)?;
        enhance::encode(&enhanced, self.config.preview_quality)
    }

    /// Regenerate a page's preview from its original. On failure the previous
    /// preview is kept.
    fn rerender(&mut self, page_number: u32) {
        let settings = self.settings;
        let quality = self.config.preview_quality;
        let Some(page) = self.grid.pages_mut().get_mut(page_number) else {
            return;
        };
        match enhance::render_preview(&page.original, &page.crop_area, &settings, quality) {
            Ok(preview) => page.preview = Some(preview),
            Err(e) => warn!(page_number, error = %e, "preview not refreshed"),
        }
    }

    // -- Cancellation ---------------------------------------------------------

    /// Ask to cancel processing. Opens the confirmation dialog.
    pub fn on_cancel(&mut self) -> Result<()> {
        self.ensure("cancel", self.phase == Phase::Processing)?;
        self.progress.request_cancel();
        Ok(())
    }

    pub fn dismiss_cancel(&mut self) {
        self.progress.dismiss_cancel();
    }

    /// Confirm the cancel. Returns `CancellationConfirmed` once the session
    /// has been torn down; does nothing if no cancel was requested.
    pub fn confirm_cancel(&mut self) -> Result<()> {
        self.ensure("confirm_cancel", self.phase == Phase::Processing)?;
        match self.progress.confirm_cancel() {
            Err(ScanError::CancellationConfirmed) => {
                self.pending.clear();
                self.grid.clear();
                self.batch = None;
                self.transition(Phase::Cancelled);
                Err(ScanError::CancellationConfirmed)
            }
            other => other,
        }
    }

    // -- Reviewing ------------------------------------------------------------

    fn reviewing(&self, action: &'static str) -> Result<()> {
        self.ensure(action, self.phase == Phase::Reviewing)
    }

    pub fn on_mark_retake(&mut self, id: PageId) -> Result<bool> {
        self.reviewing("mark_retake")?;
        let page_number = self.grid.resolve(id)?;
        self.grid.toggle_retake(page_number)
    }

    pub fn on_mark_crop(&mut self, id: PageId) -> Result<bool> {
        self.reviewing("mark_crop")?;
        let page_number = self.grid.resolve(id)?;
        self.grid.toggle_crop(page_number)
    }

    pub fn on_rotate(&mut self, id: PageId) -> Result<()> {
        self.reviewing("rotate")?;
        let page_number = self.grid.resolve(id)?;
        self.grid.rotate(page_number)
    }

    /// Request deletion. The page stays until `confirm_delete`.
    pub fn on_delete(&mut self, id: PageId) -> Result<()> {
        self.reviewing("delete")?;
        let page_number = self.grid.resolve(id)?;
        self.grid.request_delete(page_number)
    }

    pub fn confirm_delete(&mut self) -> Result<Option<u32>> {
        self.reviewing("confirm_delete")?;
        Ok(self.grid.confirm_delete().map(|p| p.page_number))
    }

    pub fn cancel_delete(&mut self) -> Result<()> {
        self.reviewing("cancel_delete")?;
        self.grid.cancel_delete();
        Ok(())
    }

    pub fn swipe_start(&mut self, id: PageId, touches: &[Point]) -> Result<()> {
        self.reviewing("swipe")?;
        let page_number = self.grid.resolve(id)?;
        self.grid.swipe_start(page_number, touches);
        Ok(())
    }

    pub fn swipe_move(&mut self, touches: &[Point]) -> Result<()> {
        self.reviewing("swipe")?;
        self.grid.swipe_move(touches);
        Ok(())
    }

    pub fn swipe_end(&mut self, at: Point) -> Result<Option<ReviewEvent>> {
        self.reviewing("swipe")?;
        let event = self.grid.swipe_end(at)?;
        if let Some(ReviewEvent::SwipedToRetake(_)) = event {
            self.pulse();
        }
        Ok(event)
    }

    fn pulse(&self) {
        if let Err(e) = self.collaborators.haptics.impact() {
            debug!(error = %e, "haptic feedback unavailable");
        }
    }

    /// Keyboard input while reviewing. Enter on a non-empty set continues.
    pub fn review_key(&mut self, key: Key) -> Result<Option<ReviewEvent>> {
        self.reviewing("review_key")?;
        let event = self.grid.handle_key(key)?;
        if event == Some(ReviewEvent::Continue) {
            self.on_continue()?;
        }
        Ok(event)
    }

    /// Leave review: into the crop queue if any page is marked for cropping,
    /// otherwise straight to naming. Retake marks do not block.
    pub fn on_continue(&mut self) -> Result<()> {
        self.reviewing("continue")?;
        if !self.grid.can_continue() {
            return Err(ScanError::NothingToProcess("there are no pages to continue with".into()));
        }
        self.crop_queue = self.grid.crop_queue().into();
        if self.crop_queue.is_empty() {
            self.namer = Some(DocumentNamer::new(&self.subject_name));
            self.transition(Phase::Naming);
        } else {
            info!(pages = self.crop_queue.len(), "starting manual crop");
            self.advance_crop();
        }
        Ok(())
    }

    /// Start re-photographing every page marked for retake.
    pub fn on_retake(&mut self) -> Result<()> {
        self.reviewing("retake")?;
        let targets = self.grid.retake_targets();
        if targets.is_empty() {
            return Err(ScanError::NothingToProcess("no pages are marked for retake".into()));
        }
        info!(?targets, "retaking pages");
        self.retake_queue = targets.into();
        self.transition(Phase::Capturing { retake: true });
        Ok(())
    }

    // -- Crop adjustment ------------------------------------------------------

    fn cropping(&self, action: &'static str) -> Result<u32> {
        match self.phase {
            Phase::CropAdjustment { page_number } => Ok(page_number),
            _ => Err(self.invalid(action)),
        }
    }

    /// Open the editor on the next queued page, or return to review.
    fn advance_crop(&mut self) {
        while let Some(page_number) = self.crop_queue.pop_front() {
            if let Some(page) = self.grid.pages().get(page_number) {
                self.crop_editor = Some(CropEditor::for_page(page, self.display_scale, &self.config));
                self.transition(Phase::CropAdjustment { page_number });
                return;
            }
        }
        self.crop_editor = None;
        self.transition(Phase::Reviewing);
    }

    fn finish_crop(
        &mut self,
        page_number: u32,
        crop: Option<CropArea>,
        manual: bool,
    ) -> Result<()> {
        let min = self.config.min_crop_size;
        let page = self
            .grid
            .pages_mut()
            .get_mut(page_number)
            .ok_or_else(|| ScanError::PageNotFound(format!("page {page_number}")))?;
        page.marked_for_crop = false;
        if let Some(crop) = crop {
            page.crop_area = crop.fit_within(page.width, page.height, min);
            // A hand-placed crop stands in for failed edge detection.
            if manual && page.width > 0 && page.height > 0 {
                page.status = PageStatus::Ready;
            }
            self.rerender(page_number);
        }
        self.advance_crop();
        Ok(())
    }

    /// Store `crop` on the page being edited and re-render its preview.
    pub fn on_apply(&mut self, crop: CropArea) -> Result<()> {
        let page_number = self.cropping("apply")?;
        info!(page_number, ?crop, "manual crop applied");
        self.finish_crop(page_number, Some(crop), true)
    }

    /// Restore the automatically detected crop.
    pub fn on_reset(&mut self) -> Result<()> {
        let page_number = self.cropping("reset")?;
        let auto = self
            .grid
            .pages()
            .get(page_number)
            .map(|page| page.auto_crop(self.config.min_crop_size))
            .ok_or_else(|| ScanError::PageNotFound(format!("page {page_number}")))?;
        self.finish_crop(page_number, Some(auto), false)
    }

    /// Leave the crop unchanged.
    pub fn on_skip(&mut self) -> Result<()> {
        let page_number = self.cropping("skip")?;
        self.finish_crop(page_number, None, false)
    }

    /// Keyboard input while cropping.
    pub fn crop_key(&mut self, key: Key) -> Result<Option<CropOutcome>> {
        self.cropping("crop_key")?;
        let outcome = self.crop_editor.as_mut().and_then(|editor| editor.handle_key(key));
        match outcome {
            Some(CropOutcome::Apply(crop)) => self.on_apply(crop)?,
            Some(CropOutcome::Reset) => self.on_reset()?,
            Some(CropOutcome::Skip) => self.on_skip()?,
            None => {}
        }
        Ok(outcome)
    }

    /// Finish editing with whatever the editor currently shows.
    pub fn apply_editor(&mut self) -> Result<()> {
        self.cropping("apply")?;
        let crop = self
            .crop_editor
            .as_ref()
            .map(CropEditor::crop_area)
            .ok_or_else(|| self.invalid("apply"))?;
        self.on_apply(crop)
    }

    // -- Naming and assembly --------------------------------------------------

    pub fn set_name(&mut self, value: &str) -> Result<()> {
        self.ensure("set_name", self.phase == Phase::Naming)?;
        if let Some(namer) = self.namer.as_mut() {
            namer.set_value(value);
        }
        Ok(())
    }

    /// Keyboard input in the naming dialog. Escape returns to review.
    pub fn naming_key(&mut self, key: Key) -> Result<Option<NamerOutcome>> {
        self.ensure("naming_key", self.phase == Phase::Naming)?;
        let outcome = match key {
            Key::Escape => Some(NamerOutcome::Cancelled),
            Key::Enter => {
                let value = self.namer.as_ref().map(|n| n.value().to_string()).unwrap_or_default();
                self.on_submit(&value)?;
                return Ok(Some(NamerOutcome::Submitted(value.trim().to_string())));
            }
            _ => None,
        };
        if outcome == Some(NamerOutcome::Cancelled) {
            self.namer = None;
            self.transition(Phase::Reviewing);
        }
        Ok(outcome)
    }

    /// The pages as handed to the assembler, in page order.
    pub fn assembly_pages(&self) -> Vec<AssemblyPage> {
        self.grid
            .pages()
            .iter()
            .map(|page| AssemblyPage {
                page_number: page.page_number,
                buffer: page.preview.clone().unwrap_or_else(|| page.original.clone()),
                rotation: page.rotation,
            })
            .collect()
    }

    /// Validate the name, assemble the document, and finish the session.
    /// Assembly failures return to naming so the user can try again.
    #[instrument(skip(self))]
    pub fn on_submit(&mut self, name: &str) -> Result<String> {
        self.ensure("submit", self.phase == Phase::Naming)?;
        let namer = self
            .namer
            .get_or_insert_with(|| DocumentNamer::new(&self.subject_name));
        namer.set_value(name);
        let name = namer.submit()?;

        let file_name = format!("{name}.{}", self.collaborators.assembler.extension());
        self.transition(Phase::Generating);

        let pages = self.assembly_pages();
        match self.collaborators.assembler.assemble(&pages, &file_name) {
            Ok(()) => {
                info!(file_name = %file_name, pages = pages.len(), "document assembled");
                self.namer = None;
                self.transition(Phase::Done {
                    file_name: file_name.clone(),
                });
                Ok(file_name)
            }
            Err(e) => {
                warn!(error = %e, "document assembly failed");
                self.transition(Phase::Naming);
                Err(match e {
                    ScanError::Assembly(_) => e,
                    other => ScanError::Assembly(other.to_string()),
                })
            }
        }
    }

    // -- Enhancement tuning ---------------------------------------------------

    /// Open a debounced tuning session on the first page's cropped image.
    pub fn start_tuning(&self) -> Result<TuningSession> {
        self.reviewing("start_tuning")?;
        let page = self
            .grid
            .pages()
            .iter()
            .find(|p| p.width > 0 && p.height > 0)
            .ok_or_else(|| ScanError::PageNotFound("no decodable page to tune on".into()))?;
        let source = ImageProcessor::from_bytes(&page.original)?
            .crop(&page.crop_area)
            .into_dynamic();
        Ok(TuningSession::start(source, self.settings, self.config.debounce()))
    }

    /// Adopt new enhancement settings for the whole batch and re-render every
    /// preview.
    pub fn apply_settings(&mut self, settings: EnhancementSettings) -> Result<()> {
        self.reviewing("apply_settings")?;
        self.settings = settings.normalized();
        info!(settings = ?self.settings, "enhancement settings applied to batch");
        for page_number in self.grid.pages().numbers() {
            self.rerender(page_number);
        }
        Ok(())
    }
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("phase", &self.phase)
            .field("pages", &self.grid.pages().len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
