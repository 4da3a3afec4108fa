use std::collections::{HashSet, VecDeque};

use super::exclusion::ExclusionSet;
use crate::models::{CatalogPage, Candidate, ItemId};

/// Ordered, de-duplicated queue of unclassified candidates plus the page cursor
///
/// Invariant: no buffered candidate's ID was in the exclusion set it was
/// appended against, and no ID appears twice.
#[derive(Debug)]
pub struct FeedBuffer {
    items: VecDeque<Candidate>,
    buffered_ids: HashSet<ItemId>,
    next_page: u32,
    exhausted: bool,
    consecutive_empty_pages: u32,
    max_empty_pages: u32,
}

impl FeedBuffer {
    pub fn new(max_empty_pages: u32) -> Self {
        Self {
            items: VecDeque::new(),
            buffered_ids: HashSet::new(),
            next_page: 1,
            exhausted: false,
            consecutive_empty_pages: 0,
            max_empty_pages: max_empty_pages.max(1),
        }
    }

    /// Appends candidates in source order, skipping excluded and already-buffered IDs
    ///
    /// Returns how many candidates were added.
    pub fn append(&mut self, raw: Vec<Candidate>, exclusion: &ExclusionSet) -> usize {
        let before = self.items.len();
        for candidate in raw {
            if exclusion.contains(candidate.id) || self.buffered_ids.contains(&candidate.id) {
                continue;
            }
            self.buffered_ids.insert(candidate.id);
            self.items.push_back(candidate);
        }
        self.items.len() - before
    }

    /// Appends a fetched page and updates exhaustion tracking
    ///
    /// A page that adds nothing counts toward the empty-page limit; reaching
    /// it, or receiving the catalog's last page, marks the buffer exhausted.
    pub fn append_page(&mut self, page: CatalogPage, exclusion: &ExclusionSet) -> usize {
        let raw_len = page.results.len();
        let is_last = page.is_last();
        let added = self.append(page.results, exclusion);

        if added == 0 {
            self.consecutive_empty_pages += 1;
        } else {
            self.consecutive_empty_pages = 0;
        }

        tracing::debug!(
            page = page.page,
            raw = raw_len,
            added,
            consecutive_empty = self.consecutive_empty_pages,
            "Page appended to feed buffer"
        );

        if self.consecutive_empty_pages >= self.max_empty_pages || is_last {
            self.mark_exhausted();
        }

        added
    }

    /// First unclassified candidate, without consuming it
    pub fn peek(&self) -> Option<&Candidate> {
        self.items.front()
    }

    /// Removes and returns the first unclassified candidate
    pub fn take_head(&mut self) -> Option<Candidate> {
        let head = self.items.pop_front()?;
        self.buffered_ids.remove(&head.id);
        Some(head)
    }

    pub fn is_low(&self, threshold: usize) -> bool {
        self.items.len() <= threshold
    }

    /// Returns the page to fetch next and moves the cursor past it
    pub fn advance_page(&mut self) -> u32 {
        let page = self.next_page;
        self.next_page += 1;
        page
    }

    /// Puts the cursor back on a page whose fetch failed
    pub fn requeue_page(&mut self, page: u32) {
        if self.next_page == page + 1 {
            self.next_page = page;
        }
    }

    pub fn mark_exhausted(&mut self) {
        if !self.exhausted {
            tracing::debug!(next_page = self.next_page, "Feed catalog exhausted");
        }
        self.exhausted = true;
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
