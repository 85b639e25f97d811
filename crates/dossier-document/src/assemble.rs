// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content merge and final assembly.

use dossier_core::StampConfig;
use dossier_core::error::{DossierError, Result, TOC_IDENTITY};
use dossier_core::types::ConvertedItem;
use lopdf::Document;
use tracing::{info, instrument};

use crate::pdf::merge::{OrientationPolicy, PdfMerger, save_to_bytes};
use crate::pdf::stamp::stamp_page_numbers;

/// Concatenate the converted items, in order, into one content document.
///
/// Landscape pages are turned to portrait. A file that cannot be loaded is
/// reported as corrupt under its display name.
#[instrument(skip_all, fields(items = converted.len()))]
pub fn merge_content(converted: &[ConvertedItem<'_>]) -> Result<Vec<u8>> {
    let mut merger = PdfMerger::new();

    for item in converted {
        let name = item.source.display_name.as_str();
        let source =
            Document::load(&item.pdf_path).map_err(|err| DossierError::corrupt(name, err))?;
        merger
            .append_document(&source, OrientationPolicy::ForcePortrait)
            .map_err(|err| DossierError::corrupt(name, err))?;
    }

    info!(
        pages = merger.page_count(),
        rotated = merger.rotated_count(),
        "Content merged"
    );
    merger.to_bytes()
}

/// Put the table of contents in front of the content and number every page.
#[instrument(skip_all, fields(toc_bytes = toc_pdf.len(), content_bytes = content_pdf.len()))]
pub fn assemble(toc_pdf: &[u8], content_pdf: &[u8], stamp: &StampConfig) -> Result<Vec<u8>> {
    let toc =
        Document::load_mem(toc_pdf).map_err(|err| DossierError::corrupt(TOC_IDENTITY, err))?;
    let content = Document::load_mem(content_pdf)
        .map_err(|err| DossierError::corrupt("content.pdf", err))?;

    let mut merger = PdfMerger::new();
    merger.append_document(&toc, OrientationPolicy::Preserve)?;
    merger.append_document(&content, OrientationPolicy::Preserve)?;

    let mut document = merger.into_document();
    let stamped = stamp_page_numbers(&mut document, stamp)?;
    info!(pages = stamped, "Final document assembled");
    save_to_bytes(document)
}
