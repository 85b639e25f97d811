// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for pipeline tests: synthetic PDFs, a DOCX template, and
// an office engine stand-in.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::rc::Rc;

use dossier_core::error::{DossierError, Result};
use dossier_document::PageRenderer;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const A4: (f32, f32) = (595.0, 842.0);
pub const A4_LANDSCAPE: (f32, f32) = (842.0, 595.0);

#[path = "../../src/testing.rs"]
mod fixtures;

pub(crate) use fixtures::synthetic_pdf;

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A small PNG photo.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::from_pixel(120, 80, image::Rgb([20, 120, 200]))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Write a DOCX template whose body holds the given paragraphs' text.
pub fn write_template(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|text| format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"{WML_NS}\"><w:body>{body}</w:body></w:document>"
    );

    let mut writer = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap();
}

/// The standard two-marker template.
pub fn write_default_template(path: &Path) {
    write_template(path, &["【目标院校名称】", "Contents", "【目录】"]);
}

/// Text of a DOCX body, one line per paragraph; tabs and breaks kept.
pub fn docx_text(path: &Path) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();

    let document = roxmltree::Document::parse(&xml).unwrap();
    let mut lines = Vec::new();
    for paragraph in document
        .descendants()
        .filter(|n| n.tag_name().name() == "p" && n.tag_name().namespace() == Some(WML_NS))
    {
        let mut line = String::new();
        for node in paragraph.descendants() {
            if node.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match node.tag_name().name() {
                "t" => line.push_str(node.text().unwrap_or("")),
                // A `w:tab` inside `w:tabs` is a tab-stop definition, not text.
                "tab" if node.parent().is_some_and(|p| p.tag_name().name() == "r") => {
                    line.push('\t')
                }
                "br" => line.push('\n'),
                _ => {}
            }
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// Stand-in for the office engine.
///
/// Source documents are plain-text files holding their page count. DOCX
/// archives (the populated table of contents) render to `toc_pages` pages
/// and have their text recorded.
pub struct FakeOffice {
    pub toc_pages: usize,
    pub fail_on: Option<String>,
    pub rendered_tocs: Rc<RefCell<Vec<String>>>,
}

impl FakeOffice {
    pub fn new() -> Self {
        Self {
            toc_pages: 1,
            fail_on: None,
            rendered_tocs: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl PageRenderer for FakeOffice {
    fn render_to_pdf(&self, source: &Path, output: &Path) -> Result<()> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(DossierError::RendererFailure(format!(
                "cannot open {name}"
            )));
        }

        let bytes = std::fs::read(source)?;
        let pages = if bytes.starts_with(b"PK") {
            self.rendered_tocs.borrow_mut().push(docx_text(source));
            self.toc_pages
        } else {
            String::from_utf8_lossy(&bytes)
                .trim()
                .parse()
                .map_err(|_| DossierError::RendererFailure(format!("{name} is unreadable")))?
        };

        std::fs::write(output, synthetic_pdf(&vec![A4; pages]))?;
        Ok(())
    }
}
