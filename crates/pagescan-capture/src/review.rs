// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Review grid — per-page marks, rotation, deletion, swipe gestures and
// keyboard navigation over the session's pages.

use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::{PageId, Point, ProcessedImage};
use tracing::{debug, info};

use crate::input::Key;
use crate::pages::PageArena;

/// The single badge shown on a page thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Error,
    Retake,
    Crop,
    Ready,
}

impl Badge {
    /// Error beats Retake beats Crop beats Ready.
    pub fn for_page(page: &ProcessedImage) -> Self {
        if page.is_error() {
            Badge::Error
        } else if page.marked_for_retake {
            Badge::Retake
        } else if page.marked_for_crop {
            Badge::Crop
        } else {
            Badge::Ready
        }
    }
}

/// What a keyboard or swipe event did to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    FocusMoved(usize),
    RetakeToggled { page_number: u32, marked: bool },
    CropToggled { page_number: u32, marked: bool },
    /// Swipe right: marked immediately, haptic pulse expected.
    SwipedToRetake(u32),
    DeleteRequested(u32),
    Deleted(u32),
    DeleteCancelled,
    Continue,
}

/// Pages under review plus the grid's transient UI state.
#[derive(Debug)]
pub struct ReviewGrid {
    pages: PageArena,
    focus: usize,
    pending_delete: Option<u32>,
    swipe_origin: Option<(u32, Point)>,
    swipe_threshold: f32,
}

impl ReviewGrid {
    pub fn new(swipe_threshold: f32) -> Self {
        Self {
            pages: PageArena::new(),
            focus: 0,
            pending_delete: None,
            swipe_origin: None,
            swipe_threshold,
        }
    }

    pub fn pages(&self) -> &PageArena {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut PageArena {
        &mut self.pages
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused_page(&self) -> Option<&ProcessedImage> {
        self.pages.nth(self.focus)
    }

    pub fn pending_delete(&self) -> Option<u32> {
        self.pending_delete
    }

    pub fn badge(&self, page_number: u32) -> Option<Badge> {
        self.pages.get(page_number).map(Badge::for_page)
    }

    fn page_mut(&mut self, page_number: u32) -> Result<&mut ProcessedImage> {
        self.pages
            .get_mut(page_number)
            .ok_or_else(|| ScanError::PageNotFound(format!("page {page_number}")))
    }

    /// Resolve a page id to its number.
    pub fn resolve(&self, id: PageId) -> Result<u32> {
        self.pages
            .number_of(id)
            .ok_or_else(|| ScanError::PageNotFound(id.to_string()))
    }

    // -- Per-page actions -----------------------------------------------------

    /// Turn the page a further 90 degrees clockwise.
    pub fn rotate(&mut self, page_number: u32) -> Result<()> {
        let page = self.page_mut(page_number)?;
        page.rotation = page.rotation.turned();
        debug!(page_number, degrees = page.rotation.degrees(), "page rotated");
        Ok(())
    }

    pub fn toggle_retake(&mut self, page_number: u32) -> Result<bool> {
        let page = self.page_mut(page_number)?;
        page.marked_for_retake = !page.marked_for_retake;
        debug!(page_number, marked = page.marked_for_retake, "retake mark toggled");
        Ok(page.marked_for_retake)
    }

    pub fn toggle_crop(&mut self, page_number: u32) -> Result<bool> {
        let page = self.page_mut(page_number)?;
        page.marked_for_crop = !page.marked_for_crop;
        debug!(page_number, marked = page.marked_for_crop, "crop mark toggled");
        Ok(page.marked_for_crop)
    }

    /// Open the delete confirmation for a page. Nothing is removed yet.
    pub fn request_delete(&mut self, page_number: u32) -> Result<()> {
        if self.pages.get(page_number).is_none() {
            return Err(ScanError::PageNotFound(format!("page {page_number}")));
        }
        self.pending_delete = Some(page_number);
        Ok(())
    }

    /// Remove the page awaiting confirmation. Other pages keep their numbers.
    pub fn confirm_delete(&mut self) -> Option<ProcessedImage> {
        let page_number = self.pending_delete.take()?;
        let removed = self.pages.remove(page_number)?;
        self.focus = self.focus.min(self.pages.len().saturating_sub(1));
        info!(page_number, remaining = self.pages.len(), "page deleted");
        Some(removed)
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // -- Derived state --------------------------------------------------------

    pub fn can_continue(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn retake_targets(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|p| p.marked_for_retake)
            .map(|p| p.page_number)
            .collect()
    }

    pub fn retake_count(&self) -> usize {
        self.pages.iter().filter(|p| p.marked_for_retake).count()
    }

    /// Label for the retake button, absent when nothing is marked.
    pub fn retake_label(&self) -> Option<String> {
        match self.retake_count() {
            0 => None,
            1 => Some("Retake 1 Page".to_string()),
            n => Some(format!("Retake {n} Pages")),
        }
    }

    /// Pages marked for manual cropping, in page order.
    pub fn crop_queue(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|p| p.marked_for_crop)
            .map(|p| p.page_number)
            .collect()
    }

    // -- Swipe ----------------------------------------------------------------

    /// Touches went down on a thumbnail. Only a single finger starts a swipe;
    /// any other count clears a swipe in progress.
    pub fn swipe_start(&mut self, page_number: u32, touches: &[Point]) {
        self.swipe_origin = match touches {
            [at] => Some((page_number, *at)),
            _ => None,
        };
    }

    /// Touches moved. A second finger joining aborts the swipe.
    pub fn swipe_move(&mut self, touches: &[Point]) {
        if touches.len() > 1 && self.swipe_origin.take().is_some() {
            debug!(touches = touches.len(), "swipe aborted by multi-touch");
        }
    }

    /// Touch released. Decides whether the movement was a horizontal swipe.
    pub fn swipe_end(&mut self, at: Point) -> Result<Option<ReviewEvent>> {
        let Some((page_number, origin)) = self.swipe_origin.take() else {
            return Ok(None);
        };
        let dx = at.x - origin.x;
        let dy = at.y - origin.y;
        if dx.abs() <= dy.abs() || dx.abs() <= self.swipe_threshold {
            return Ok(None);
        }

        if dx > 0.0 {
            let page = self.page_mut(page_number)?;
            page.marked_for_retake = true;
            info!(page_number, "swiped to retake");
            Ok(Some(ReviewEvent::SwipedToRetake(page_number)))
        } else {
            self.request_delete(page_number)?;
            Ok(Some(ReviewEvent::DeleteRequested(page_number)))
        }
    }

    /// A second finger or cancelled touch aborts the swipe.
    pub fn swipe_cancel(&mut self) {
        self.swipe_origin = None;
    }

    // -- Keyboard -------------------------------------------------------------

    pub fn handle_key(&mut self, key: Key) -> Result<Option<ReviewEvent>> {
        if self.pending_delete.is_some() {
            return Ok(match key {
                Key::Enter => self.confirm_delete().map(|p| ReviewEvent::Deleted(p.page_number)),
                Key::Escape => {
                    self.cancel_delete();
                    Some(ReviewEvent::DeleteCancelled)
                }
                _ => None,
            });
        }

        let last = self.pages.len().saturating_sub(1);
        let focused = self.focused_page().map(|p| p.page_number);

        let event = match key {
            Key::ArrowLeft | Key::ArrowUp => {
                self.focus = self.focus.saturating_sub(1);
                Some(ReviewEvent::FocusMoved(self.focus))
            }
            Key::ArrowRight | Key::ArrowDown => {
                self.focus = (self.focus + 1).min(last);
                Some(ReviewEvent::FocusMoved(self.focus))
            }
            k if k.is_char('r') => match focused {
                Some(page_number) => Some(ReviewEvent::RetakeToggled {
                    page_number,
                    marked: self.toggle_retake(page_number)?,
                }),
                None => None,
            },
            k if k.is_char('c') => match focused {
                Some(page_number) => Some(ReviewEvent::CropToggled {
                    page_number,
                    marked: self.toggle_crop(page_number)?,
                }),
                None => None,
            },
            Key::Delete | Key::Backspace => match focused {
                Some(page_number) => {
                    self.request_delete(page_number)?;
                    Some(ReviewEvent::DeleteRequested(page_number))
                }
                None => None,
            },
            Key::Enter if self.can_continue() => Some(ReviewEvent::Continue),
            _ => None,
        };
        Ok(event)
    }

    /// Drop every page and reset transient state.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.focus = 0;
        self.pending_delete = None;
        self.swipe_origin = None;
    }
}
