// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input listing: turn command-line paths or a JSON manifest into the ordered
// list of source items. Unsupported files are skipped here, never later.

use std::path::{Path, PathBuf};

use dossier_core::error::Result;
use dossier_core::types::{DocumentKind, SourceItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// On-disk list of inputs, in final document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub items: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub display_name: String,
    pub source_path: PathBuf,
}

impl Manifest {
    /// Load a manifest. Relative source paths resolve against the manifest's
    /// own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut manifest: Manifest = serde_json::from_str(&raw)?;
        if let Some(base) = path.parent() {
            for entry in &mut manifest.items {
                if entry.source_path.is_relative() {
                    entry.source_path = base.join(&entry.source_path);
                }
            }
        }
        Ok(manifest)
    }

    /// Source items for every supported entry.
    pub fn into_items(self) -> Vec<SourceItem> {
        self.items
            .into_iter()
            .filter_map(|entry| {
                match SourceItem::new(entry.display_name.clone(), entry.source_path) {
                    Ok(item) => Some(item),
                    Err(err) => {
                        warn!(item = %entry.display_name, error = %err, "Skipping manifest entry");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Expand command-line inputs in order. Directories contribute their
/// supported files sorted by name; their subdirectories are not visited.
pub fn list_inputs(paths: &[PathBuf]) -> Result<Vec<SourceItem>> {
    let mut items = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            files.sort();
            debug!(dir = %path.display(), files = files.len(), "Listing directory");
            items.extend(files.iter().filter_map(|file| supported_item(file)));
        } else {
            items.extend(supported_item(path));
        }
    }
    Ok(items)
}

fn supported_item(path: &Path) -> Option<SourceItem> {
    if DocumentKind::from_path(path).is_none() {
        warn!(path = %path.display(), "Skipping unsupported file type");
        return None;
    }
    SourceItem::from_path(path).ok()
}

/// Default output file name for an institution.
pub fn suggested_output_name(school_name: &str) -> String {
    format!("{}-申请材料.pdf", school_name.trim())
}
