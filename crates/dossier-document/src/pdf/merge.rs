// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF merger: concatenate the pages of several documents into one, with
// optional orientation normalisation.

use dossier_core::error::{DossierError, Result};
use lopdf::{Document, ObjectId};
use tracing::{debug, info, instrument};

use super::pages::{ObjectCopier, PageGeometry, empty_document};

/// What to do with landscape pages while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationPolicy {
    /// Copy every page as it is.
    Preserve,
    /// Turn pages whose media box is wider than tall by 90 degrees.
    ForcePortrait,
}

/// Accumulates pages from any number of source documents.
pub struct PdfMerger {
    document: Document,
    pages_id: ObjectId,
    page_count: u32,
    rotated: u32,
}

impl Default for PdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfMerger {
    pub fn new() -> Self {
        let (document, pages_id) = empty_document();
        Self {
            document,
            pages_id,
            page_count: 0,
            rotated: 0,
        }
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pages turned by [`OrientationPolicy::ForcePortrait`] so far.
    pub fn rotated_count(&self) -> u32 {
        self.rotated
    }

    /// Append every page of `source`, in order. Returns the number of pages
    /// appended.
    #[instrument(skip_all, fields(policy = ?policy))]
    pub fn append_document(&mut self, source: &Document, policy: OrientationPolicy) -> Result<u32> {
        let mut copier = ObjectCopier::new(source);
        let mut appended = 0;

        for (page_number, page_id) in source.get_pages() {
            let extra_rotation = match policy {
                OrientationPolicy::Preserve => 0,
                OrientationPolicy::ForcePortrait => {
                    let geometry = PageGeometry::of_page(source, page_id)?;
                    if geometry.is_landscape() {
                        debug!(
                            page_number,
                            width = geometry.width,
                            height = geometry.height,
                            "Rotating landscape page"
                        );
                        self.rotated += 1;
                        90
                    } else {
                        0
                    }
                }
            };

            copier.append_page(&mut self.document, self.pages_id, page_id, extra_rotation)?;
            appended += 1;
        }

        self.page_count += appended;
        debug!(appended, total = self.page_count, "Document appended");
        Ok(appended)
    }

    /// Consume the merger and return the merged document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Consume the merger and serialise the merged document.
    pub fn to_bytes(self) -> Result<Vec<u8>> {
        info!(
            pages = self.page_count,
            rotated = self.rotated,
            "Serialising merged PDF"
        );
        save_to_bytes(self.document)
    }
}

/// Serialise a document to bytes.
pub(crate) fn save_to_bytes(mut document: Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    document.save_to(&mut output).map_err(|err| {
        DossierError::PdfError(format!("failed to serialise merged PDF: {}", err))
    })?;
    debug!(output_bytes = output.len(), "Serialisation complete");
    Ok(output)
}
