// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for document assembly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DossierError, Result};

/// Unique identifier for one assembly run, used to correlate log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input document kinds the assembler knows how to turn into PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Already a PDF; copied verbatim.
    Pdf,
    /// Raster image placed on a single page.
    Image,
    /// Word-processing document rendered by the office engine.
    OfficeDoc,
}

impl DocumentKind {
    /// Infer the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "doc" | "docx" => Some(Self::OfficeDoc),
            _ => None,
        }
    }

    /// Infer the kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// One document queued for assembly. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    pub display_name: String,
    pub source_path: PathBuf,
    pub kind: DocumentKind,
}

impl SourceItem {
    /// Create an item, detecting its kind from the source path, then from the
    /// display name.
    pub fn new(display_name: impl Into<String>, source_path: impl Into<PathBuf>) -> Result<Self> {
        let display_name = display_name.into();
        let source_path = source_path.into();
        let kind = DocumentKind::from_path(&source_path)
            .or_else(|| DocumentKind::from_path(Path::new(&display_name)))
            .ok_or_else(|| DossierError::UnsupportedInput(display_name.clone()))?;
        Ok(Self {
            display_name,
            source_path,
            kind,
        })
    }

    /// Create an item from a path, using its file name as the display name.
    pub fn from_path(source_path: impl Into<PathBuf>) -> Result<Self> {
        let source_path = source_path.into();
        let display_name = source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| DossierError::UnsupportedInput(source_path.display().to_string()))?;
        Self::new(display_name, source_path)
    }

    /// Display name with its final extension removed.
    pub fn title(&self) -> &str {
        strip_extension(&self.display_name)
    }
}

/// Strip the last extension from a file name. Leading dots are not treated as
/// extension separators (`.profile` stays `.profile`).
pub fn strip_extension(name: &str) -> &str {
    let base_start = name.rfind(['/', '\\']).map_or(0, |idx| idx + 1);
    let base = &name[base_start..];
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    match base.rfind('.') {
        Some(dot) if dot >= leading_dots && dot > 0 => &name[..base_start + dot],
        _ => name,
    }
}

/// A source item after conversion: its PDF in the run workspace and page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedItem<'a> {
    pub source: &'a SourceItem,
    pub pdf_path: PathBuf,
    /// Always at least 1.
    pub page_count: u32,
}

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    /// 1-based page in the final document.
    pub start_page: u32,
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in PDF points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (mm_to_pt(w as f32), mm_to_pt(h as f32))
    }
}

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f32 = 72.0;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm / 25.4 * POINTS_PER_INCH
}

/// Progress notification emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// A step is starting.
    Step { label: String, percent: u8 },
    /// The run finished and the output exists at `output`.
    Finished { output: PathBuf },
    /// The run aborted; nothing was written at the target path.
    Failed { message: String },
}
