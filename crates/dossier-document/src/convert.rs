// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-item conversion: bring every queued input into the run workspace as a
// standalone PDF and record its page count.
//
// Dispatch is by detected kind: PDFs are copied verbatim, images go through
// the image renderer, word-processing files through the office renderer.
// The first failure aborts the whole batch.

use std::path::{Path, PathBuf};

use dossier_core::error::{DossierError, Result};
use dossier_core::types::{ConvertedItem, DocumentKind, SourceItem};
use tracing::{debug, info, instrument, warn};

use crate::pdf::reader::count_pages;
use crate::render::PageRenderer;

/// Converts an ordered list of inputs into per-item PDFs.
pub struct ConversionOrchestrator<'r> {
    image: &'r dyn PageRenderer,
    office: &'r dyn PageRenderer,
}

impl<'r> ConversionOrchestrator<'r> {
    pub fn new(image: &'r dyn PageRenderer, office: &'r dyn PageRenderer) -> Self {
        Self { image, office }
    }

    /// Convert every item, in order, into `workspace`.
    ///
    /// `on_progress(index, total, label)` fires once per item before its
    /// conversion starts; `index` is 1-based and `label` is the display name.
    /// The returned list has the same order and length as `items`.
    #[instrument(skip_all, fields(items = items.len(), workspace = %workspace.display()))]
    pub fn convert_all<'a>(
        &self,
        items: &'a [SourceItem],
        workspace: &Path,
        mut on_progress: impl FnMut(usize, usize, &str),
    ) -> Result<Vec<ConvertedItem<'a>>> {
        let total = items.len();
        let mut converted = Vec::with_capacity(total);

        for (offset, item) in items.iter().enumerate() {
            let index = offset + 1;
            on_progress(index, total, &item.display_name);

            let converted_item = self
                .convert_one(index, item, workspace)
                .map_err(|err| DossierError::conversion(&item.display_name, err))?;
            debug!(
                index,
                item = %item.display_name,
                pages = converted_item.page_count,
                "Item converted"
            );
            converted.push(converted_item);
        }

        let pages: u32 = converted.iter().map(|c| c.page_count).sum();
        info!(items = total, pages, "All items converted");
        Ok(converted)
    }

    fn convert_one<'a>(
        &self,
        index: usize,
        item: &'a SourceItem,
        workspace: &Path,
    ) -> Result<ConvertedItem<'a>> {
        let pdf_path = workspace_path(workspace, index, &item.display_name);

        match item.kind {
            DocumentKind::Pdf => {
                std::fs::copy(&item.source_path, &pdf_path)?;
            }
            DocumentKind::Image => self.image.render_to_pdf(&item.source_path, &pdf_path)?,
            DocumentKind::OfficeDoc => self.office.render_to_pdf(&item.source_path, &pdf_path)?,
        }

        let page_count = count_pages(&pdf_path, &item.display_name)?;
        if item.kind == DocumentKind::Image && page_count != 1 {
            warn!(
                item = %item.display_name,
                pages = page_count,
                "Image renderer produced more than one page"
            );
        }

        Ok(ConvertedItem {
            source: item,
            pdf_path,
            page_count,
        })
    }
}

/// `{index}_{name}.pdf` inside the workspace. Path separators in the display
/// name are flattened so the file always lands directly in `workspace`.
fn workspace_path(workspace: &Path, index: usize, display_name: &str) -> PathBuf {
    let flat: String = display_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    workspace.join(format!("{index}_{flat}.pdf"))
}
