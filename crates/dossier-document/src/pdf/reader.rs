// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open existing PDF documents and inspect their page sequence
// using the `lopdf` crate.

use std::path::Path;

use dossier_core::error::{DossierError, Result};
use lopdf::Document;
use tracing::{debug, info, instrument};

use super::pages::PageGeometry;

/// Reads existing PDF files.
///
/// Wraps `lopdf::Document`; used to count pages of converted items and to
/// measure the rendered table of contents.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            DossierError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            DossierError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Geometry of every page, in page order.
    pub fn page_geometries(&self) -> Result<Vec<PageGeometry>> {
        self.document
            .get_pages()
            .values()
            .map(|page_id| PageGeometry::of_page(&self.document, *page_id))
            .collect()
    }

    /// Borrow the underlying `lopdf::Document`.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Count the pages of a converted file, failing on unreadable or empty files.
///
/// `item` names the input in errors.
pub fn count_pages(path: &Path, item: &str) -> Result<u32> {
    let reader = PdfReader::open(path).map_err(|err| DossierError::corrupt(item, err))?;
    match reader.page_count() {
        0 => Err(DossierError::corrupt(item, "document contains no pages")),
        count => Ok(count as u32),
    }
}
