// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// dossier-document: Document assembly and pagination engine for Dossier.
//
// Converts PDFs, images, and word-processing files into per-item PDFs,
// computes table-of-contents offsets, renders the table of contents from a
// DOCX template, merges everything with orientation normalisation, and
// stamps positional page numbers on the result.

pub mod assemble;
pub mod assembly;
pub mod convert;
pub mod offsets;
pub mod pdf;
pub mod render;
pub mod toc;

#[cfg(test)]
mod testing;

// Re-export the primary entry points so callers can use `dossier_document::Assembler` etc.
pub use assembly::{AssemblyContext, AssemblyRequest, Assembler};
pub use convert::ConversionOrchestrator;
pub use offsets::compute_offsets;
pub use pdf::{PdfMerger, PdfReader, PdfWriter};
pub use render::{ImageRenderer, OfficeRenderer, PageRenderer};
pub use toc::{DocxTemplate, TemplateEngine, TocBindings, TocBuilder};
