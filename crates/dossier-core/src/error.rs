// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Dossier.

use thiserror::Error;

/// Identity used when the table of contents, rather than an input file, fails.
pub const TOC_IDENTITY: &str = "TOC";

/// Top-level error type for all Dossier operations.
#[derive(Debug, Error)]
pub enum DossierError {
    // -- Request validation --
    #[error("invalid assembly request: {0}")]
    InvalidRequest(String),

    #[error("unsupported input '{0}'")]
    UnsupportedInput(String),

    // -- Per-item failures (carry the display name of the offending input) --
    #[error("failed to convert '{item}': {reason}")]
    ConversionFailure { item: String, reason: String },

    #[error("'{item}' could not be read back as a PDF, the file may be damaged: {reason}")]
    CorruptIntermediatePdf { item: String, reason: String },

    // -- Table of contents --
    #[error("template is missing the placeholder marker '{marker}'")]
    TemplateMarkerMissing { marker: String },

    #[error("failed to render the table of contents: {0}")]
    TemplateRenderFailure(String),

    #[error("table of contents page count did not settle after {passes} passes")]
    TocDidNotConverge { passes: u32 },

    // -- Backend-level errors, wrapped with item identity before leaving a step --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("document engine failed: {0}")]
    RendererFailure(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DossierError {
    /// Attach the identity of a failing input to a conversion-stage error.
    ///
    /// Errors that already name an input pass through unchanged.
    pub fn conversion(item: impl Into<String>, err: DossierError) -> Self {
        match err {
            already @ (Self::ConversionFailure { .. } | Self::CorruptIntermediatePdf { .. }) => {
                already
            }
            other => Self::ConversionFailure {
                item: item.into(),
                reason: other.to_string(),
            },
        }
    }

    /// Attach the identity of a failing input to a read-back error.
    pub fn corrupt(item: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::CorruptIntermediatePdf {
            item: item.into(),
            reason: err.to_string(),
        }
    }

    /// Wrap a table-of-contents failure. Marker errors keep their own kind.
    pub fn toc(err: DossierError) -> Self {
        match err {
            already @ (Self::TemplateMarkerMissing { .. }
            | Self::TemplateRenderFailure(_)
            | Self::TocDidNotConverge { .. }) => already,
            other => Self::TemplateRenderFailure(format!("{TOC_IDENTITY}: {other}")),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DossierError>;
