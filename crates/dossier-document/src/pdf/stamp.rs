// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-number stamping: build a one-line overlay per page and flatten it
// onto the page's existing content.
//
// The overlay is a content stream drawn in the page's own coordinate space.
// Pages carrying a /Rotate are displayed turned clockwise, so the overlay is
// transformed to sit at the *displayed* bottom edge and read left to right.

use dossier_core::StampConfig;
use dossier_core::error::{DossierError, Result};
use dossier_core::types::POINTS_PER_INCH;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument};

use super::pages::{PageGeometry, inherited_attribute, resolve};

/// Resource name of the stamp font inside each page's /Font dictionary.
pub const STAMP_FONT_RESOURCE: &str = "FDossierPageNo";

/// Helvetica advance width of every ASCII digit, in 1/1000 em.
const HELVETICA_DIGIT_WIDTH: f32 = 556.0;

/// A transient overlay for one page: same dimensions as the page, carrying
/// only a centred label near the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOverlay {
    geometry: PageGeometry,
    label: String,
    font_size: f32,
    bottom_offset: f32,
}

impl PageOverlay {
    /// Overlay carrying the 1-based page number `number`.
    pub fn page_number(geometry: PageGeometry, number: u32, config: &StampConfig) -> Self {
        Self {
            geometry,
            label: number.to_string(),
            font_size: config.font_size_pt,
            bottom_offset: config.bottom_offset_in * POINTS_PER_INCH,
        }
    }

    /// Rendered width of the label in points.
    fn text_width(&self) -> f32 {
        self.label.chars().count() as f32 * HELVETICA_DIGIT_WIDTH / 1000.0 * self.font_size
    }

    /// Text-space placement matrix `[a b c d e f]` for the page's rotation.
    fn placement(&self) -> [f32; 6] {
        let g = &self.geometry;
        let half_text = self.text_width() / 2.0;
        let off = self.bottom_offset;
        let (x0, y0, w, h) = (g.origin_x, g.origin_y, g.width, g.height);

        match g.rotation {
            90 => [0.0, 1.0, -1.0, 0.0, x0 + w - off, y0 + h / 2.0 - half_text],
            180 => [-1.0, 0.0, 0.0, -1.0, x0 + w / 2.0 + half_text, y0 + h - off],
            270 => [0.0, -1.0, 1.0, 0.0, x0 + off, y0 + h / 2.0 + half_text],
            _ => [1.0, 0.0, 0.0, 1.0, x0 + w / 2.0 - half_text, y0 + off],
        }
    }

    /// Content-stream operations drawing the overlay.
    pub fn operations(&self) -> Vec<Operation> {
        let matrix = self.placement().iter().map(|v| Object::Real(*v)).collect();
        vec![
            Operation::new("q", vec![]),
            Operation::new("cm", matrix),
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(STAMP_FONT_RESOURCE.as_bytes().to_vec()),
                    Object::Real(self.font_size),
                ],
            ),
            Operation::new("Td", vec![Object::Integer(0), Object::Integer(0)]),
            Operation::new("Tj", vec![Object::string_literal(self.label.as_str())]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Content {
            operations: self.operations(),
        }
        .encode()
        .map_err(|err| DossierError::PdfError(format!("failed to encode page overlay: {}", err)))
    }
}

/// Stamp every page of `document` with its 1-based position.
///
/// Numbering is positional and ignores any numbering already present in the
/// page content. Returns the number of pages stamped.
#[instrument(skip_all)]
pub fn stamp_page_numbers(document: &mut Document, config: &StampConfig) -> Result<u32> {
    let font_id = document.add_object(helvetica());
    let pages: Vec<ObjectId> = document.get_pages().into_values().collect();

    for (index, page_id) in pages.iter().enumerate() {
        let geometry = PageGeometry::of_page(document, *page_id)?;
        let overlay = PageOverlay::page_number(geometry, index as u32 + 1, config);
        flatten_overlay(document, *page_id, font_id, &overlay)?;
        debug!(page = index + 1, rotation = geometry.rotation, "Page stamped");
    }

    info!(pages = pages.len(), "Page numbers stamped");
    Ok(pages.len() as u32)
}

fn helvetica() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

/// Composite `overlay` onto the page. The original content is isolated in its
/// own `q … Q` pair so its graphics state cannot leak into the overlay.
fn flatten_overlay(
    document: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    overlay: &PageOverlay,
) -> Result<()> {
    let (contents, mut resources) = {
        let page = document.get_dictionary(page_id).map_err(|err| {
            DossierError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let contents: Vec<Object> = match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let resources = inherited_attribute(document, page, b"Resources")
            .and_then(|obj| resolve(document, obj))
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);

        (contents, resources)
    };

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve(document, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    fonts.set(STAMP_FONT_RESOURCE, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let prefix_id = document.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut suffix = b"\nQ\n".to_vec();
    suffix.extend(overlay.encode()?);
    let suffix_id = document.add_object(Stream::new(Dictionary::new(), suffix));

    let mut layered = Vec::with_capacity(contents.len() + 2);
    layered.push(Object::Reference(prefix_id));
    layered.extend(contents);
    layered.push(Object::Reference(suffix_id));

    let page = document.get_dictionary_mut(page_id).map_err(|err| {
        DossierError::PdfError(format!("cannot update page object {:?}: {}", page_id, err))
    })?;
    page.set("Contents", Object::Array(layered));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Text shown by the last `Tj` on a page, if any. The overlay is always the
/// last content drawn, so this reads back the stamped page number.
pub fn last_shown_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let data = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&data).ok()?;
    content
        .operations
        .iter()
        .rev()
        .find(|op| op.operator == "Tj")
        .and_then(|op| op.operands.first())
        .and_then(|operand| match operand {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
}
