// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table of contents: populate a template with the computed entries and
// render it to PDF through the office renderer.

pub mod docx;

use std::path::{Path, PathBuf};

use dossier_core::error::{DossierError, Result};
use dossier_core::types::{ConvertedItem, TocEntry};
use tracing::{debug, info, instrument, warn};

use crate::offsets::compute_offsets;
use crate::pdf::reader::PdfReader;
use crate::render::PageRenderer;

pub use docx::DocxTemplate;

/// File names of the intermediate table-of-contents files in the workspace.
pub const TOC_DOCX: &str = "toc_temp.docx";
pub const TOC_PDF: &str = "toc_temp.pdf";

/// Values substituted into the template.
#[derive(Debug, Clone, Copy)]
pub struct TocBindings<'a> {
    pub school_name: &'a str,
    pub entries: &'a [TocEntry],
}

/// Fills a word-processing template with an institution name and entries.
pub trait TemplateEngine {
    fn populate_template(
        &self,
        template: &Path,
        bindings: &TocBindings<'_>,
        output: &Path,
    ) -> Result<()>;
}

/// A rendered table of contents whose page count matches the offsets it lists.
#[derive(Debug, Clone)]
pub struct PaginatedToc {
    pub pdf: Vec<u8>,
    pub entries: Vec<TocEntry>,
    pub pages: u32,
    /// Render passes needed before the page count settled.
    pub passes: u32,
}

pub struct TocBuilder<'r> {
    engine: &'r dyn TemplateEngine,
    renderer: &'r dyn PageRenderer,
    workspace: PathBuf,
    max_passes: u32,
}

impl<'r> TocBuilder<'r> {
    pub fn new(
        engine: &'r dyn TemplateEngine,
        renderer: &'r dyn PageRenderer,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            renderer,
            workspace: workspace.into(),
            max_passes: 3,
        }
    }

    /// Upper bound on render passes in [`TocBuilder::build_paginated`].
    pub fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Render the table of contents once and return the PDF bytes.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub fn build_toc(
        &self,
        school_name: &str,
        entries: &[TocEntry],
        template: &Path,
    ) -> Result<Vec<u8>> {
        let docx_path = self.workspace.join(TOC_DOCX);
        let pdf_path = self.workspace.join(TOC_PDF);
        let bindings = TocBindings {
            school_name,
            entries,
        };

        self.engine
            .populate_template(template, &bindings, &docx_path)
            .map_err(DossierError::toc)?;
        self.renderer
            .render_to_pdf(&docx_path, &pdf_path)
            .map_err(DossierError::toc)?;

        let pdf = std::fs::read(&pdf_path).map_err(|err| DossierError::toc(err.into()))?;
        debug!(bytes = pdf.len(), "Table of contents rendered");
        Ok(pdf)
    }

    /// Render the table of contents until the page count it was computed
    /// with matches the page count it renders to.
    ///
    /// The first pass assumes `preamble_pages`. A template that fits its
    /// assumption settles in one pass.
    #[instrument(skip(self, converted), fields(items = converted.len()))]
    pub fn build_paginated(
        &self,
        school_name: &str,
        converted: &[ConvertedItem<'_>],
        template: &Path,
        preamble_pages: u32,
    ) -> Result<PaginatedToc> {
        let mut assumed = preamble_pages.max(1);

        for pass in 1..=self.max_passes {
            let entries = compute_offsets(converted, assumed);
            let pdf = self.build_toc(school_name, &entries, template)?;
            let pages = PdfReader::from_bytes(&pdf)
                .map_err(DossierError::toc)?
                .page_count() as u32;

            if pages == 0 {
                return Err(DossierError::TemplateRenderFailure(
                    "table of contents rendered to zero pages".into(),
                ));
            }

            if pages == assumed {
                info!(pages, passes = pass, "Table of contents paginated");
                return Ok(PaginatedToc {
                    pdf,
                    entries,
                    pages,
                    passes: pass,
                });
            }

            warn!(
                assumed,
                measured = pages,
                pass,
                "Table of contents page count differs, recomputing offsets"
            );
            assumed = pages;
        }

        Err(DossierError::TocDidNotConverge {
            passes: self.max_passes,
        })
    }
}
