// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Assembly configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for one assembly run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Page size used for image pages.
    pub paper_size: crate::PaperSize,
    /// Margin kept clear around images on every side, in inches.
    pub image_margin_in: f32,
    /// Table-of-contents layout and rendering.
    pub toc: TocConfig,
    /// Page-number overlay.
    pub stamp: StampConfig,
    /// Parent directory for the per-run workspace. `None` uses the system
    /// temporary directory.
    pub workspace_parent: Option<PathBuf>,
    /// Office engine executable used for word-processing documents.
    pub office_program: PathBuf,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A4,
            image_margin_in: 1.0,
            toc: TocConfig::default(),
            stamp: StampConfig::default(),
            workspace_parent: None,
            office_program: PathBuf::from("soffice"),
        }
    }
}

impl AssemblyConfig {
    /// Load settings from a JSON file. Fields absent from the file keep their
    /// defaults, and a missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Table-of-contents template and layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Marker replaced by the institution name.
    pub school_marker: String,
    /// Marker replaced by the entry list.
    pub body_marker: String,
    /// Pages the table of contents is assumed to occupy on the first pass.
    pub preamble_pages: u32,
    /// Upper bound on render/measure passes before giving up.
    pub max_passes: u32,
    pub heading_font: String,
    pub heading_font_east_asia: String,
    pub heading_size_pt: f32,
    pub body_font: String,
    pub body_font_east_asia: String,
    pub body_size_pt: f32,
    /// Right-aligned tab stop position, in inches from the left margin.
    pub tab_stop_in: f32,
    /// Separate entries with an empty line.
    pub blank_line_between_entries: bool,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            school_marker: "【目标院校名称】".into(),
            body_marker: "【目录】".into(),
            preamble_pages: 1,
            max_passes: 3,
            heading_font: "SimHei".into(),
            heading_font_east_asia: "黑体".into(),
            heading_size_pt: 26.0,
            body_font: "SimSun".into(),
            body_font_east_asia: "宋体".into(),
            body_size_pt: 12.0,
            tab_stop_in: 6.0,
            blank_line_between_entries: true,
        }
    }
}

/// Page-number overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    pub font_size_pt: f32,
    /// Distance of the text baseline above the bottom edge, in inches.
    pub bottom_offset_in: f32,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            font_size_pt: 9.0,
            bottom_offset_in: 0.5,
        }
    }
}
