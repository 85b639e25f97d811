// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-tree plumbing shared by the merger and the page-number stamper:
// page geometry, inherited attribute lookup, and cross-document page copying.

use std::collections::HashMap;

use dossier_core::error::{DossierError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Page trees deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

/// Physical size and display rotation of a single page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Lower-left corner of the media box.
    pub origin_x: f32,
    pub origin_y: f32,
    /// Media box width in points, before rotation.
    pub width: f32,
    /// Media box height in points, before rotation.
    pub height: f32,
    /// Clockwise display rotation, normalised to 0, 90, 180, or 270.
    pub rotation: i64,
}

impl PageGeometry {
    /// Wider than tall, judged on the unrotated media box.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Read the geometry of `page_id`, following inheritance up the page tree.
    pub fn of_page(document: &Document, page_id: ObjectId) -> Result<Self> {
        let page = document.get_dictionary(page_id).map_err(|err| {
            DossierError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let media_box = inherited_attribute(document, page, b"MediaBox")
            .and_then(|obj| resolve(document, obj))
            .and_then(|obj| obj.as_array().ok())
            .ok_or_else(|| {
                DossierError::PdfError(format!("page {:?} has no usable /MediaBox", page_id))
            })?;

        let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
        if coords.len() != 4 {
            return Err(DossierError::PdfError(format!(
                "page {:?} /MediaBox has {} numeric entries, expected 4",
                page_id,
                coords.len()
            )));
        }

        let rotation = inherited_attribute(document, page, b"Rotate")
            .and_then(|obj| resolve(document, obj))
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);

        Ok(Self {
            origin_x: coords[0].min(coords[2]),
            origin_y: coords[1].min(coords[3]),
            width: (coords[2] - coords[0]).abs(),
            height: (coords[3] - coords[1]).abs(),
            rotation: rotation.rem_euclid(360),
        })
    }
}

/// Look up `key` on the page or, failing that, on its nearest ancestor.
pub(crate) fn inherited_attribute<'a>(
    document: &'a Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent_id).ok()?;
    }
    None
}

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Create a document holding an empty page tree and a catalog.
///
/// Returns the document and the object ID of its root `/Pages` node.
pub(crate) fn empty_document() -> (Document, ObjectId) {
    let mut document = Document::with_version("1.5");

    let pages_id = document.new_object_id();
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(Vec::new()));
    pages.set("Count", Object::Integer(0));
    document.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = document.add_object(catalog);
    document.trailer.set("Root", Object::Reference(catalog_id));

    (document, pages_id)
}

/// Copies objects from one source document into a target, remembering what
/// has already been copied so shared resources are copied once and reference
/// cycles (e.g. annotation `/P` back-links) terminate.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub(crate) fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    /// Copy page `page_id` into `target` and append it under `pages_id`.
    ///
    /// Inherited attributes are materialised on the copied page, because the
    /// source ancestors are not copied. `extra_rotation` is added to the
    /// page's `/Rotate` (mod 360).
    pub(crate) fn append_page(
        &mut self,
        target: &mut Document,
        pages_id: ObjectId,
        page_id: ObjectId,
        extra_rotation: i64,
    ) -> Result<ObjectId> {
        let source = self.source;
        let source_page = source.get_dictionary(page_id).map_err(|err| {
            DossierError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let inherited: Vec<(&[u8], &Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|key| !source_page.has(key))
            .filter_map(|key| {
                inherited_attribute(source, source_page, key).map(|value| (*key, value))
            })
            .collect();

        let new_id = self.copy_reference(target, page_id);

        let mut materialised = Vec::with_capacity(inherited.len());
        for (key, value) in inherited {
            materialised.push((key, self.copy_object(target, value)));
        }

        let page = target.get_dictionary_mut(new_id).map_err(|err| {
            DossierError::PdfError(format!("copied page {:?} is not a dictionary: {}", new_id, err))
        })?;
        page.set("Parent", Object::Reference(pages_id));
        for (key, value) in materialised {
            page.set(key, value);
        }
        if extra_rotation != 0 {
            let current = page
                .get(b"Rotate")
                .ok()
                .and_then(|obj| obj.as_i64().ok())
                .unwrap_or(0);
            page.set(
                "Rotate",
                Object::Integer((current + extra_rotation).rem_euclid(360)),
            );
        }

        push_kid(target, pages_id, new_id)?;
        Ok(new_id)
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> ObjectId {
        if let Some(existing) = self.copied.get(&id) {
            return *existing;
        }

        // Reserve the target ID before recursing so cycles resolve to it.
        let new_id = target.new_object_id();
        self.copied.insert(id, new_id);

        let cloned = match self.source.get_object(id) {
            Ok(object) => self.copy_object(target, object),
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        };
        target.objects.insert(new_id, cloned);
        new_id
    }

    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(target, item))
                    .collect(),
            ),
            Object::Reference(id) => Object::Reference(self.copy_reference(target, *id)),
            Object::Stream(stream) => Object::Stream(Stream::new(
                self.copy_dictionary(target, &stream.dict),
                stream.content.clone(),
            )),
            other => other.clone(),
        }
    }

    /// Page-tree nodes lose their `/Parent`; the caller re-parents copied
    /// pages. Every other `/Parent` (form fields, outlines) is copied.
    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let page_tree_node = matches!(
            dict.get(b"Type").and_then(Object::as_name),
            Ok(b"Page") | Ok(b"Pages")
        );
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if page_tree_node && key == b"Parent" {
                continue;
            }
            let value = self.copy_object(target, value);
            copy.set(key.clone(), value);
        }
        copy
    }
}

/// Add `page_id` to the `/Kids` of `pages_id` and bump `/Count`.
fn push_kid(target: &mut Document, pages_id: ObjectId, page_id: ObjectId) -> Result<()> {
    let pages = target.get_dictionary_mut(pages_id).map_err(|err| {
        DossierError::PdfError(format!("page tree root is not a dictionary: {}", err))
    })?;

    if !matches!(pages.get(b"Kids"), Ok(Object::Array(_))) {
        pages.set("Kids", Object::Array(Vec::new()));
    }
    if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
        kids.push(Object::Reference(page_id));
    }

    let count = pages
        .get(b"Count")
        .ok()
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);
    pages.set("Count", Object::Integer(count + 1));
    Ok(())
}
