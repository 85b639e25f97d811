// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Assembly pipeline: validate a request, convert every input, build the
// table of contents, merge, number, and persist the final PDF.
//
// Each run owns a private temporary workspace that is removed on every exit
// path. The final file is written next to its target and renamed into place,
// so a failed run never leaves a partial document behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use dossier_core::AssemblyConfig;
use dossier_core::error::{DossierError, Result};
use dossier_core::types::{ConvertedItem, ProgressEvent, RunId, SourceItem};
use tempfile::{NamedTempFile, TempDir};
use tracing::{error, info, info_span, warn};

use crate::assemble::{assemble, merge_content};
use crate::convert::ConversionOrchestrator;
use crate::offsets::content_pages;
use crate::render::{ImageRenderer, OfficeRenderer, PageRenderer};
use crate::toc::{DocxTemplate, TemplateEngine, TocBuilder};

pub const STEP_MERGE: &str = "Merging content and normalizing page orientation";
pub const STEP_TOC: &str = "Building table of contents";
pub const STEP_FINAL: &str = "Final merge and page numbering";

/// Name of the merged content document inside the workspace.
pub const CONTENT_PDF: &str = "content.pdf";

/// Everything a caller supplies for one run.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    /// Inputs in final document order.
    pub items: Vec<SourceItem>,
    pub school_name: String,
    pub template: PathBuf,
    pub output: PathBuf,
}

impl AssemblyRequest {
    /// Reject requests that cannot possibly succeed, before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(DossierError::InvalidRequest("no input documents".into()));
        }
        if self.school_name.trim().is_empty() {
            return Err(DossierError::InvalidRequest(
                "institution name is empty".into(),
            ));
        }
        if !self.template.is_file() {
            return Err(DossierError::InvalidRequest(format!(
                "template {} does not exist",
                self.template.display()
            )));
        }
        if let Some(missing) = self.items.iter().find(|item| !item.source_path.is_file()) {
            return Err(DossierError::InvalidRequest(format!(
                "source file for '{}' does not exist: {}",
                missing.display_name,
                missing.source_path.display()
            )));
        }
        let parent = output_dir(&self.output);
        if !parent.is_dir() {
            return Err(DossierError::InvalidRequest(format!(
                "output directory {} does not exist",
                parent.display()
            )));
        }
        Ok(())
    }
}

/// State of one in-flight run.
pub struct AssemblyContext<'req> {
    run_id: RunId,
    items: &'req [SourceItem],
    converted: Vec<ConvertedItem<'req>>,
    workspace: TempDir,
    step: u32,
    total_steps: u32,
}

impl<'req> AssemblyContext<'req> {
    /// Create the run's workspace under `workspace_parent`, or the system
    /// temporary directory.
    pub fn new(
        run_id: RunId,
        items: &'req [SourceItem],
        workspace_parent: Option<&Path>,
    ) -> Result<Self> {
        let prefix = format!("dossier-{run_id}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let workspace = match workspace_parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        Ok(Self {
            run_id,
            items,
            converted: Vec::with_capacity(items.len()),
            workspace,
            step: 0,
            total_steps: items.len() as u32 + 4,
        })
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    pub fn converted(&self) -> &[ConvertedItem<'req>] {
        &self.converted
    }

    /// Move to the next step and describe it.
    pub fn advance(&mut self, label: &str) -> ProgressEvent {
        self.step = (self.step + 1).min(self.total_steps);
        ProgressEvent::Step {
            label: label.to_string(),
            percent: (self.step * 100 / self.total_steps) as u8,
        }
    }

    /// Remove the workspace now, logging rather than failing if that is not
    /// possible. Dropping the context removes it too.
    pub fn close(self) {
        let path = self.workspace.path().to_path_buf();
        if let Err(err) = self.workspace.close() {
            warn!(workspace = %path.display(), error = %err, "Failed to remove workspace");
        }
    }
}

/// Runs assembly requests against a fixed configuration and set of backends.
pub struct Assembler {
    config: AssemblyConfig,
    image: Box<dyn PageRenderer>,
    office: Box<dyn PageRenderer>,
    engine: Box<dyn TemplateEngine>,
}

impl Assembler {
    /// Assembler with the built-in image placer, office engine, and DOCX
    /// template engine.
    pub fn new(config: AssemblyConfig) -> Self {
        let image = Box::new(ImageRenderer::from_config(&config));
        let office = Box::new(OfficeRenderer::from_config(&config));
        let engine = Box::new(DocxTemplate::new(config.toc.clone()));
        Self::with_backends(config, image, office, engine)
    }

    pub fn with_backends(
        config: AssemblyConfig,
        image: Box<dyn PageRenderer>,
        office: Box<dyn PageRenderer>,
        engine: Box<dyn TemplateEngine>,
    ) -> Self {
        Self {
            config,
            image,
            office,
            engine,
        }
    }

    /// Run one request to completion.
    ///
    /// `progress` receives one `Step` per input and per pipeline stage, then
    /// exactly one `Finished` or `Failed`. Returns the output path.
    pub fn run(
        &self,
        request: &AssemblyRequest,
        progress: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<PathBuf> {
        let run_id = RunId::new();
        let span = info_span!("assembly", run_id = %run_id, items = request.items.len());
        let _entered = span.enter();

        match self.execute(run_id, request, progress) {
            Ok(output) => {
                info!(output = %output.display(), "Assembly finished");
                progress(&ProgressEvent::Finished {
                    output: output.clone(),
                });
                Ok(output)
            }
            Err(err) => {
                error!(error = %err, "Assembly failed");
                progress(&ProgressEvent::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        run_id: RunId,
        request: &AssemblyRequest,
        progress: &mut dyn FnMut(&ProgressEvent),
    ) -> Result<PathBuf> {
        request.validate()?;

        let mut context = AssemblyContext::new(
            run_id,
            &request.items,
            self.config.workspace_parent.as_deref(),
        )?;
        let workspace = context.workspace().to_path_buf();
        let items = context.items;
        info!(run_id = %context.run_id(), workspace = %workspace.display(), "Workspace created");

        let orchestrator = ConversionOrchestrator::new(self.image.as_ref(), self.office.as_ref());
        let converted = orchestrator.convert_all(items, &workspace, |_, _, label| {
            progress(&context.advance(label));
        })?;
        context.converted = converted;
        info!(
            items = items.len(),
            pages = content_pages(context.converted()),
            "Inputs converted"
        );

        progress(&context.advance(STEP_MERGE));
        let content = merge_content(context.converted())?;
        std::fs::write(workspace.join(CONTENT_PDF), &content)?;

        progress(&context.advance(STEP_TOC));
        let toc = TocBuilder::new(self.engine.as_ref(), self.office.as_ref(), &workspace)
            .with_max_passes(self.config.toc.max_passes)
            .build_paginated(
                &request.school_name,
                context.converted(),
                &request.template,
                self.config.toc.preamble_pages,
            )?;

        progress(&context.advance(STEP_FINAL));
        let document = assemble(&toc.pdf, &content, &self.config.stamp)?;
        persist_atomically(&request.output, &document)?;

        context.close();
        Ok(request.output.clone())
    }
}

fn output_dir(output: &Path) -> &Path {
    output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Write `bytes` beside `target` and rename over it in one step.
fn persist_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let mut staged = NamedTempFile::new_in(output_dir(target))?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|err| DossierError::Io(err.error))?;
    info!(path = %target.display(), bytes = bytes.len(), "Output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dir: &Path) -> AssemblyRequest {
        let template = dir.join("surface.docx");
        let source = dir.join("A.pdf");
        std::fs::write(&template, b"docx").unwrap();
        std::fs::write(&source, b"pdf").unwrap();
        AssemblyRequest {
            items: vec![SourceItem::from_path(source).unwrap()],
            school_name: "Test University".into(),
            template,
            output: dir.join("out.pdf"),
        }
    }

    #[test]
    fn well_formed_request_validates() {
        let dir = tempfile::tempdir().unwrap();
        request(dir.path()).validate().unwrap();
    }

    #[test]
    fn blank_institution_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path());
        req.school_name = "   ".into();
        assert!(matches!(req.validate(), Err(DossierError::InvalidRequest(_))));
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path());
        req.items.clear();
        assert!(matches!(req.validate(), Err(DossierError::InvalidRequest(_))));
    }

    #[test]
    fn missing_template_and_sources_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path());
        req.template = dir.path().join("absent.docx");
        assert!(matches!(req.validate(), Err(DossierError::InvalidRequest(_))));

        let mut req = request(dir.path());
        req.items.push(SourceItem::from_path(dir.path().join("gone.png")).unwrap());
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("gone.png"), "{err}");
    }

    #[test]
    fn progress_counts_items_plus_four_steps() {
        let items: Vec<SourceItem> = ["a.pdf", "b.pdf", "c.pdf", "d.pdf", "e.pdf", "f.pdf"]
            .iter()
            .map(|name| SourceItem::new(*name, *name).unwrap())
            .collect();
        let dir = tempfile::tempdir().unwrap();
        let mut context = AssemblyContext::new(RunId::new(), &items, Some(dir.path())).unwrap();

        let percents: Vec<u8> = (0..9)
            .map(|_| match context.advance("step") {
                ProgressEvent::Step { percent, .. } => percent,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(percents, vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
    }

    #[test]
    fn closing_the_context_removes_the_workspace() {
        let items = vec![SourceItem::new("a.pdf", "a.pdf").unwrap()];
        let parent = tempfile::tempdir().unwrap();
        let context = AssemblyContext::new(RunId::new(), &items, Some(parent.path())).unwrap();
        let workspace = context.workspace().to_path_buf();
        std::fs::write(workspace.join(CONTENT_PDF), b"x").unwrap();
        assert!(workspace.is_dir());

        context.close();
        assert!(!workspace.exists());
    }

    #[test]
    fn persisting_replaces_the_target_whole() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("final.pdf");
        std::fs::write(&target, b"old").unwrap();
        persist_atomically(&target, b"new contents").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new contents");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn workspace_is_named_after_the_run() {
        let items = vec![SourceItem::new("a.pdf", "a.pdf").unwrap()];
        let parent = tempfile::tempdir().unwrap();
        let context = AssemblyContext::new(RunId::new(), &items, Some(parent.path())).unwrap();
        let name = context.workspace().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(&format!("dossier-{}-", context.run_id())), "{name}");
    }
}
