// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page arena — the session's pages keyed by their stable page number.
//
// Page numbers are handed out once and never reused, so deleting a page leaves
// gaps and replacing a page (retake) keeps its slot. Iteration order is
// ascending page number.

use std::collections::{BTreeMap, HashMap};

use pagescan_core::error::{Result, ScanError};
use pagescan_core::types::{PageId, ProcessedImage};
use tracing::debug;

#[derive(Debug, Default)]
pub struct PageArena {
    pages: BTreeMap<u32, ProcessedImage>,
    index: HashMap<PageId, u32>,
    /// Highest page number handed out so far.
    last_number: u32,
}

impl PageArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next page number without inserting anything.
    pub fn allocate_number(&mut self) -> u32 {
        self.last_number += 1;
        self.last_number
    }

    /// Insert a page under its own `page_number`, which must come from
    /// `allocate_number`.
    pub fn insert(&mut self, page: ProcessedImage) -> Result<()> {
        if page.page_number == 0 || page.page_number > self.last_number {
            return Err(ScanError::PageNotFound(format!(
                "page number {} was never allocated",
                page.page_number
            )));
        }
        if self.pages.contains_key(&page.page_number) {
            return Err(ScanError::PageNotFound(format!(
                "page number {} is already occupied",
                page.page_number
            )));
        }
        self.index.insert(page.id, page.page_number);
        self.pages.insert(page.page_number, page);
        Ok(())
    }

    /// Swap in new content for an existing page, keeping its id, number and
    /// the rotation the user gave it.
    pub fn replace(&mut self, page_number: u32, mut replacement: ProcessedImage) -> Result<()> {
        let slot = self
            .pages
            .get_mut(&page_number)
            .ok_or_else(|| ScanError::PageNotFound(format!("page {page_number}")))?;
        replacement.id = slot.id;
        replacement.page_number = page_number;
        replacement.rotation = slot.rotation;
        *slot = replacement;
        debug!(page_number, "page replaced in place");
        Ok(())
    }

    pub fn remove(&mut self, page_number: u32) -> Option<ProcessedImage> {
        let page = self.pages.remove(&page_number)?;
        self.index.remove(&page.id);
        Some(page)
    }

    pub fn get(&self, page_number: u32) -> Option<&ProcessedImage> {
        self.pages.get(&page_number)
    }

    pub fn get_mut(&mut self, page_number: u32) -> Option<&mut ProcessedImage> {
        self.pages.get_mut(&page_number)
    }

    /// Page number currently holding `id`.
    pub fn number_of(&self, id: PageId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    pub fn by_id(&self, id: PageId) -> Option<&ProcessedImage> {
        self.number_of(id).and_then(|n| self.pages.get(&n))
    }

    /// Pages in ascending page-number order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessedImage> {
        self.pages.values()
    }

    pub fn numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    /// The page at ordinal `position` (0-based) in display order.
    pub fn nth(&self, position: usize) -> Option<&ProcessedImage> {
        self.pages.values().nth(position)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Drop every page. Numbers already handed out stay retired.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.index.clear();
    }
}
