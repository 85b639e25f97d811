// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Start-page bookkeeping for the table of contents.

use dossier_core::types::{ConvertedItem, TocEntry};

/// Compute where each converted item starts in the final document.
///
/// The first item starts right after the `preamble_pages` table-of-contents
/// pages; each following item starts after all pages before it.
pub fn compute_offsets(converted: &[ConvertedItem<'_>], preamble_pages: u32) -> Vec<TocEntry> {
    let mut next_page = preamble_pages + 1;
    converted
        .iter()
        .map(|item| {
            let entry = TocEntry {
                title: item.source.title().to_string(),
                start_page: next_page,
            };
            next_page += item.page_count;
            entry
        })
        .collect()
}

/// Total pages contributed by the converted items.
pub fn content_pages(converted: &[ConvertedItem<'_>]) -> u32 {
    converted.iter().map(|item| item.page_count).sum()
}
