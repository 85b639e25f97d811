// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer backends: turn one input document into one standalone PDF file.
//
// The assembler only depends on the `PageRenderer` trait; the two concrete
// backends here are the image placer (printpdf) and an office engine driven
// as an external process (LibreOffice headless by default).

use std::path::{Path, PathBuf};
use std::process::Command;

use dossier_core::AssemblyConfig;
use dossier_core::error::{DossierError, Result};
use tracing::{debug, info, instrument};

use crate::pdf::writer::PdfWriter;

/// Converts one input document into a PDF file on disk.
pub trait PageRenderer {
    /// Render `source` and write the resulting PDF to `output`.
    fn render_to_pdf(&self, source: &Path, output: &Path) -> Result<()>;
}

/// Places a raster image centred on a single fixed-size page.
pub struct ImageRenderer {
    writer: PdfWriter,
}

impl ImageRenderer {
    pub fn new(writer: PdfWriter) -> Self {
        Self { writer }
    }

    pub fn from_config(config: &AssemblyConfig) -> Self {
        Self::new(PdfWriter::new(config.paper_size, config.image_margin_in))
    }
}

impl PageRenderer for ImageRenderer {
    #[instrument(skip(self), fields(source = %source.display()))]
    fn render_to_pdf(&self, source: &Path, output: &Path) -> Result<()> {
        let bytes = std::fs::read(source)?;
        let title = source
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        self.writer.write_image_to_file(&bytes, &title, output)
    }
}

/// Delegates word-processing documents to an external office engine.
///
/// The engine is invoked as
/// `<program> --headless --convert-to pdf --outdir <dir> <source>` and is
/// expected to write `<dir>/<source stem>.pdf`.
pub struct OfficeRenderer {
    program: PathBuf,
}

impl OfficeRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &AssemblyConfig) -> Self {
        Self::new(config.office_program.clone())
    }
}

impl PageRenderer for OfficeRenderer {
    #[instrument(skip(self), fields(program = %self.program.display(), source = %source.display()))]
    fn render_to_pdf(&self, source: &Path, output: &Path) -> Result<()> {
        let parent = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        // Private output directory so same-named sources cannot collide.
        let outdir = tempfile::Builder::new()
            .prefix("office-")
            .tempdir_in(parent)?;

        info!("Invoking office engine");
        let result = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir.path())
            .arg(source)
            .output()
            .map_err(|err| {
                DossierError::RendererFailure(format!(
                    "could not start {}: {}",
                    self.program.display(),
                    err
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DossierError::RendererFailure(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        let stem = source.file_stem().ok_or_else(|| {
            DossierError::RendererFailure(format!("{} has no file name", source.display()))
        })?;
        let mut file_name = stem.to_os_string();
        file_name.push(".pdf");
        let produced = outdir.path().join(file_name);
        if !produced.is_file() {
            return Err(DossierError::RendererFailure(format!(
                "{} reported success but produced no PDF for {}",
                self.program.display(),
                source.display()
            )));
        }

        std::fs::rename(&produced, output)?;
        debug!(output = %output.display(), "Office conversion complete");
        Ok(())
    }
}
