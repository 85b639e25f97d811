// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end assembly runs against the real image placer and template engine,
// with the office engine replaced by a fixture.

mod common;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use dossier_core::error::DossierError;
use dossier_core::types::{ProgressEvent, SourceItem};
use dossier_core::{AssemblyConfig, TocConfig};
use dossier_document::pdf::stamp::last_shown_text;
use dossier_document::{Assembler, AssemblyRequest, DocxTemplate, ImageRenderer, PdfReader};

use common::{A4, A4_LANDSCAPE, FakeOffice, png_bytes, synthetic_pdf, write_default_template};

struct Fixture {
    _dir: tempfile::TempDir,
    inputs: PathBuf,
    workspaces: PathBuf,
    template: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let inputs = dir.path().join("inputs");
        let workspaces = dir.path().join("workspaces");
        let out = dir.path().join("out");
        for d in [&inputs, &workspaces, &out] {
            std::fs::create_dir(d).unwrap();
        }
        let template = inputs.join("surface.docx");
        write_default_template(&template);
        Self {
            inputs,
            workspaces,
            template,
            output: out.join("Test University-申请材料.pdf"),
            _dir: dir,
        }
    }

    fn input(&self, name: &str, bytes: &[u8]) -> SourceItem {
        let path = self.inputs.join(name);
        std::fs::write(&path, bytes).unwrap();
        SourceItem::from_path(path).unwrap()
    }

    /// A.pdf (2 pages), B.jpg (one image), C.docx (3 pages).
    fn scenario_items(&self) -> Vec<SourceItem> {
        vec![
            self.input("A.pdf", &synthetic_pdf(&[A4, A4])),
            self.input("B.jpg", &png_bytes()),
            self.input("C.docx", b"3"),
        ]
    }

    fn request(&self, items: Vec<SourceItem>) -> AssemblyRequest {
        AssemblyRequest {
            items,
            school_name: "Test University".into(),
            template: self.template.clone(),
            output: self.output.clone(),
        }
    }

    fn config(&self) -> AssemblyConfig {
        AssemblyConfig {
            workspace_parent: Some(self.workspaces.clone()),
            ..AssemblyConfig::default()
        }
    }

    fn assembler(&self, office: FakeOffice) -> Assembler {
        let config = self.config();
        Assembler::with_backends(
            config.clone(),
            Box::new(ImageRenderer::from_config(&config)),
            Box::new(office),
            Box::new(DocxTemplate::new(config.toc.clone())),
        )
    }

    fn workspace_is_gone(&self) -> bool {
        std::fs::read_dir(&self.workspaces).unwrap().next().is_none()
    }
}

fn stamps(path: &Path) -> Vec<String> {
    let reader = PdfReader::open(path).unwrap();
    let document = reader.document();
    document
        .get_pages()
        .values()
        .map(|id| last_shown_text(document, *id).unwrap_or_default())
        .collect()
}

fn run(
    assembler: &Assembler,
    request: &AssemblyRequest,
) -> (Result<PathBuf, DossierError>, Vec<ProgressEvent>) {
    let mut events = Vec::new();
    let result = assembler.run(request, &mut |event: &ProgressEvent| {
        events.push(event.clone())
    });
    (result, events)
}

#[test]
fn scenario_produces_paginated_dossier() {
    let fixture = Fixture::new();
    let office = FakeOffice::new();
    let tocs = Rc::clone(&office.rendered_tocs);
    let assembler = fixture.assembler(office);

    let request = fixture.request(fixture.scenario_items());
    let (result, _) = run(&assembler, &request);
    let output = result.unwrap();
    assert_eq!(output, fixture.output);

    let reader = PdfReader::open(&output).unwrap();
    assert_eq!(reader.page_count(), 7);
    assert_eq!(stamps(&output), vec!["1", "2", "3", "4", "5", "6", "7"]);

    let tocs = tocs.borrow();
    assert_eq!(tocs.len(), 1);
    assert_eq!(tocs[0], "Test University\nContents\nA\t2\n\nB\t4\n\nC\t5");
    assert!(fixture.workspace_is_gone());
}

#[test]
fn repeated_runs_agree() {
    let fixture = Fixture::new();
    let items = fixture.scenario_items();

    let mut results = Vec::new();
    for _ in 0..2 {
        let office = FakeOffice::new();
        let tocs = Rc::clone(&office.rendered_tocs);
        let assembler = fixture.assembler(office);
        let (result, _) = run(&assembler, &fixture.request(items.clone()));
        let output = result.unwrap();
        let pages = PdfReader::open(&output).unwrap().page_count();
        let toc = tocs.borrow()[0].clone();
        results.push((pages, toc));
    }

    assert_eq!(results[0], results[1]);
}

#[test]
fn only_landscape_pages_are_turned() {
    let fixture = Fixture::new();
    let items = vec![fixture.input("Mixed.pdf", &synthetic_pdf(&[A4, A4_LANDSCAPE, A4]))];
    let assembler = fixture.assembler(FakeOffice::new());

    let (result, _) = run(&assembler, &fixture.request(items));
    let output = result.unwrap();

    let rotations: Vec<i64> = PdfReader::open(&output)
        .unwrap()
        .page_geometries()
        .unwrap()
        .iter()
        .map(|g| g.rotation)
        .collect();
    assert_eq!(rotations, vec![0, 0, 90, 0]);
}

#[test]
fn conversion_failure_leaves_nothing_behind() {
    let fixture = Fixture::new();
    let mut office = FakeOffice::new();
    office.fail_on = Some("C.docx".into());
    let assembler = fixture.assembler(office);

    let (result, events) = run(&assembler, &fixture.request(fixture.scenario_items()));
    match result.unwrap_err() {
        DossierError::ConversionFailure { item, reason } => {
            assert_eq!(item, "C.docx");
            assert!(reason.contains("cannot open C.docx"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(!fixture.output.exists());
    assert!(fixture.workspace_is_gone());
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Failed { message }) if message.contains("C.docx")
    ));
}

#[test]
fn template_without_toc_marker_fails() {
    let fixture = Fixture::new();
    common::write_template(&fixture.template, &["【目标院校名称】", "no toc here"]);
    let assembler = fixture.assembler(FakeOffice::new());

    let (result, _) = run(&assembler, &fixture.request(fixture.scenario_items()));
    assert!(
        matches!(&result, Err(DossierError::TemplateMarkerMissing { marker }) if marker == "【目录】"),
        "{result:?}"
    );
    assert!(!fixture.output.exists());
    assert!(fixture.workspace_is_gone());
}

#[test]
fn two_page_toc_shifts_every_entry() {
    let fixture = Fixture::new();
    let mut office = FakeOffice::new();
    office.toc_pages = 2;
    let tocs = Rc::clone(&office.rendered_tocs);
    let assembler = fixture.assembler(office);

    let (result, _) = run(&assembler, &fixture.request(fixture.scenario_items()));
    let output = result.unwrap();

    assert_eq!(PdfReader::open(&output).unwrap().page_count(), 8);
    let tocs = tocs.borrow();
    assert_eq!(tocs.len(), 2);
    assert_eq!(tocs[1], "Test University\nContents\nA\t3\n\nB\t5\n\nC\t6");
}

#[test]
fn progress_reports_every_step_then_finishes() {
    let fixture = Fixture::new();
    let assembler = fixture.assembler(FakeOffice::new());

    let (result, events) = run(&assembler, &fixture.request(fixture.scenario_items()));
    let output = result.unwrap();

    let steps: Vec<(String, u8)> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Step { label, percent } => Some((label.clone(), *percent)),
            _ => None,
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            ("A.pdf".to_string(), 14),
            ("B.jpg".to_string(), 28),
            ("C.docx".to_string(), 42),
            ("Merging content and normalizing page orientation".to_string(), 57),
            ("Building table of contents".to_string(), 71),
            ("Final merge and page numbering".to_string(), 85),
        ]
    );
    assert_eq!(events.last(), Some(&ProgressEvent::Finished { output }));
}

#[test]
fn blank_institution_is_rejected_before_any_work() {
    let fixture = Fixture::new();
    let office = FakeOffice::new();
    let tocs = Rc::clone(&office.rendered_tocs);
    let assembler = fixture.assembler(office);

    let mut request = fixture.request(fixture.scenario_items());
    request.school_name = String::new();
    let (result, events) = run(&assembler, &request);

    assert!(matches!(result, Err(DossierError::InvalidRequest(_))));
    assert!(tocs.borrow().is_empty());
    assert_eq!(events.len(), 1);
    assert!(fixture.workspace_is_gone());
}

#[test]
fn compact_toc_config_drops_blank_lines() {
    let fixture = Fixture::new();
    let office = FakeOffice::new();
    let tocs = Rc::clone(&office.rendered_tocs);
    let mut config = fixture.config();
    config.toc = TocConfig {
        blank_line_between_entries: false,
        ..TocConfig::default()
    };
    let assembler = Assembler::with_backends(
        config.clone(),
        Box::new(ImageRenderer::from_config(&config)),
        Box::new(office),
        Box::new(DocxTemplate::new(config.toc.clone())),
    );

    let (result, _) = run(&assembler, &fixture.request(fixture.scenario_items()));
    result.unwrap();
    let tocs = tocs.borrow();
    assert_eq!(tocs[0], "Test University\nContents\nA\t2\nB\t4\nC\t5");
}
