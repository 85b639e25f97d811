// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX template population.
//
// Only `word/document.xml` is rewritten. Every other part of the package is
// copied into the output archive byte for byte. Marker paragraphs are found
// with roxmltree and replaced by splicing new paragraph XML over their source
// byte range, so the rest of the document text is untouched.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use dossier_core::TocConfig;
use dossier_core::error::{DossierError, Result};
use roxmltree::Node;
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{TemplateEngine, TocBindings};

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";
const TWIPS_PER_INCH: f32 = 1440.0;

/// Fills a Word template's institution and table-of-contents markers.
pub struct DocxTemplate {
    config: TocConfig,
}

impl DocxTemplate {
    pub fn new(config: TocConfig) -> Self {
        Self { config }
    }

    /// Rewrite the main document part, replacing both marker paragraphs.
    pub fn populate_document_xml(&self, xml: &str, bindings: &TocBindings<'_>) -> Result<String> {
        let document = roxmltree::Document::parse(xml)
            .map_err(|err| render_failure(format!("{DOCUMENT_PART} is not valid XML: {err}")))?;
        let root = document.root_element();
        let body = wml_child(root, "body")
            .ok_or_else(|| render_failure(format!("{DOCUMENT_PART} has no w:body")))?;

        let school = find_marker_paragraph(body, &self.config.school_marker)?;
        let toc = find_marker_paragraph(body, &self.config.body_marker)?;
        if school.id() == toc.id() {
            return Err(render_failure(format!(
                "markers '{}' and '{}' share one paragraph",
                self.config.school_marker, self.config.body_marker
            )));
        }

        let wml = WmlWriter::for_document(root);
        let mut edits = vec![
            (school.range(), self.heading_paragraph(&wml, school, bindings.school_name)),
            (toc.range(), self.toc_paragraph(&wml, toc, bindings)),
        ];
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

        let mut populated = xml.to_string();
        for (range, replacement) in edits {
            populated.replace_range(range, &replacement);
        }

        debug!(entries = bindings.entries.len(), "Template markers replaced");
        Ok(populated)
    }

    fn heading_paragraph(&self, wml: &WmlWriter, marker: Node, school_name: &str) -> String {
        let cfg = &self.config;
        let jc = format!("<{0}jc {0}val=\"center\"/>", wml.prefix);
        let ppr = wml.paragraph_properties(marker, &[("jc", jc)]);

        let rpr = wml.run_properties(
            &cfg.heading_font,
            &cfg.heading_font_east_asia,
            cfg.heading_size_pt,
        );
        let run = format!(
            "<{0}r>{1}<{0}t xml:space=\"preserve\">{2}</{0}t></{0}r>",
            wml.prefix,
            rpr,
            escape_xml(school_name)
        );
        wml.paragraph(&ppr, &run)
    }

    fn toc_paragraph(&self, wml: &WmlWriter, marker: Node, bindings: &TocBindings<'_>) -> String {
        let cfg = &self.config;
        let w = wml.prefix.as_str();

        let tab_pos = (cfg.tab_stop_in * TWIPS_PER_INCH).round() as u32;
        let tabs = format!(
            "<{w}tabs><{w}tab {w}val=\"right\" {w}leader=\"dot\" {w}pos=\"{tab_pos}\"/></{w}tabs>"
        );
        let ppr = wml.paragraph_properties(marker, &[("tabs", tabs)]);

        let rpr = wml.run_properties(&cfg.body_font, &cfg.body_font_east_asia, cfg.body_size_pt);
        let line_break = format!("<{w}r><{w}br/></{w}r>");

        let mut runs = String::new();
        for (index, entry) in bindings.entries.iter().enumerate() {
            if index > 0 {
                runs.push_str(&line_break);
                if cfg.blank_line_between_entries {
                    runs.push_str(&line_break);
                }
            }
            runs.push_str(&format!(
                "<{w}r>{rpr}<{w}t xml:space=\"preserve\">{}</{w}t><{w}tab/><{w}t>{}</{w}t></{w}r>",
                escape_xml(&entry.title),
                entry.start_page
            ));
        }

        wml.paragraph(&ppr, &runs)
    }
}

impl TemplateEngine for DocxTemplate {
    #[instrument(skip_all, fields(template = %template.display(), output = %output.display()))]
    fn populate_template(
        &self,
        template: &Path,
        bindings: &TocBindings<'_>,
        output: &Path,
    ) -> Result<()> {
        let file = File::open(template)?;
        let mut archive = ZipArchive::new(file).map_err(|err| {
            render_failure(format!("{} is not a DOCX archive: {err}", template.display()))
        })?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|err| render_failure(format!("template has no {DOCUMENT_PART}: {err}")))?
            .read_to_string(&mut xml)?;

        let populated = self.populate_document_xml(&xml, bindings)?;

        let mut writer = ZipWriter::new(File::create(output)?);
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index).map_err(zip_failure)?;
            if entry.name() == DOCUMENT_PART {
                drop(entry);
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(DOCUMENT_PART, options).map_err(zip_failure)?;
                writer.write_all(populated.as_bytes())?;
            } else {
                writer.raw_copy_file(entry).map_err(zip_failure)?;
            }
        }
        writer.finish().map_err(zip_failure)?;

        info!(entries = bindings.entries.len(), "Template populated");
        Ok(())
    }
}

/// Element prefix for WordprocessingML as declared by the document.
struct WmlWriter {
    /// `"w:"` or whatever the document binds the namespace to.
    prefix: String,
    /// Declaration added to inserted paragraphs when the namespace has no
    /// prefix in the source document (attributes must be qualified).
    declaration: Option<String>,
}

impl WmlWriter {
    fn for_document(root: Node) -> Self {
        match root.lookup_prefix(WML_NS) {
            Some(prefix) if !prefix.is_empty() => Self {
                prefix: format!("{prefix}:"),
                declaration: None,
            },
            _ => Self {
                prefix: "w:".to_string(),
                declaration: Some(format!(" xmlns:w=\"{WML_NS}\"")),
            },
        }
    }

    fn paragraph(&self, ppr: &str, runs: &str) -> String {
        let w = self.prefix.as_str();
        let declaration = self.declaration.as_deref().unwrap_or("");
        format!("<{w}p{declaration}><{w}pPr>{ppr}</{w}pPr>{runs}</{w}p>")
    }

    /// The marker paragraph's `w:pPr` content with the `overrides` elements
    /// replaced, kept in schema order so Word accepts the result.
    fn paragraph_properties(&self, marker: Node, overrides: &[(&str, String)]) -> String {
        let source = marker.document().input_text();
        let mut children: Vec<(usize, &str)> = wml_child(marker, "pPr")
            .map(|ppr| {
                ppr.children()
                    .filter(|n| n.is_element())
                    .filter(|n| !overrides.iter().any(|(name, _)| is_wml(n, name)))
                    .map(|n| (ppr_rank(n), &source[n.range()]))
                    .collect()
            })
            .unwrap_or_default();
        for (name, xml) in overrides {
            children.push((ppr_rank_of(name), xml.as_str()));
        }
        children.sort_by_key(|(rank, _)| *rank);
        children.into_iter().map(|(_, xml)| xml).collect()
    }

    fn run_properties(&self, font: &str, east_asia: &str, size_pt: f32) -> String {
        let w = self.prefix.as_str();
        let half_points = (size_pt * 2.0).round() as u32;
        let font = escape_xml(font);
        let east_asia = escape_xml(east_asia);
        format!(
            "<{w}rPr><{w}rFonts {w}ascii=\"{font}\" {w}hAnsi=\"{font}\" {w}eastAsia=\"{east_asia}\"/>\
             <{w}sz {w}val=\"{half_points}\"/><{w}szCs {w}val=\"{half_points}\"/></{w}rPr>"
        )
    }
}

/// Element order inside `w:pPr`.
const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle", "rPr",
    "sectPr", "pPrChange",
];

fn ppr_rank_of(name: &str) -> usize {
    PPR_ORDER
        .iter()
        .position(|known| *known == name)
        .unwrap_or(PPR_ORDER.len())
}

/// Unknown and foreign-namespace elements sort just before `w:rPr`.
fn ppr_rank(node: Node) -> usize {
    if node.tag_name().namespace() == Some(WML_NS) && PPR_ORDER.contains(&node.tag_name().name()) {
        ppr_rank_of(node.tag_name().name())
    } else {
        ppr_rank_of("cnfStyle")
    }
}

fn wml_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

fn is_wml(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

/// Visible text of a paragraph: every `w:t` below it, concatenated. Word
/// often splits a typed string across several runs.
fn paragraph_text(paragraph: Node) -> String {
    paragraph
        .descendants()
        .filter(|n| is_wml(n, "t"))
        .filter_map(|n| n.text())
        .collect()
}

/// First top-level body paragraph whose text contains `marker`.
fn find_marker_paragraph<'a, 'input>(
    body: Node<'a, 'input>,
    marker: &str,
) -> Result<Node<'a, 'input>> {
    body.children()
        .filter(|n| is_wml(n, "p"))
        .find(|p| paragraph_text(*p).contains(marker))
        .ok_or_else(|| DossierError::TemplateMarkerMissing {
            marker: marker.to_string(),
        })
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn render_failure(reason: String) -> DossierError {
    DossierError::TemplateRenderFailure(reason)
}

fn zip_failure(err: zip::result::ZipError) -> DossierError {
    render_failure(format!("DOCX archive error: {err}"))
}
