// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — parse source documents, inspect page geometry, and copy single
// pages (with everything they reference) into another document, using the
// `lopdf` crate.

use std::collections::HashMap;

use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::types::PageSize;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page-tree depth; guards against /Parent cycles.
const MAX_TREE_DEPTH: usize = 64;

/// Reads an existing PDF and copies pages out of it.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Name used in error messages.
    name: String,
}

impl PdfReader {
    /// Parse a PDF held in memory. `name` identifies it in errors.
    #[instrument(skip(data), fields(bytes_len = data.len()))]
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| HeftwerkError::CorruptDocument {
            name: name.to_string(),
            detail: err.to_string(),
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            name: name.to_string(),
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// MediaBox size of the page at a 0-based index, following inheritance.
    ///
    /// Pages without any MediaBox are treated as A4.
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        let page_id = self.page_id(index)?;
        let size = inherited_attribute(&self.document, page_id, b"MediaBox")
            .and_then(|object| PageBox::from_object(&self.document, object))
            .map(|media_box| media_box.size());

        Ok(size.unwrap_or_else(|| {
            warn!(document = %self.name, page = index + 1, "page has no MediaBox, assuming A4");
            PageSize::A4
        }))
    }

    /// Sizes of every page, in page order.
    pub fn page_sizes(&self) -> Result<Vec<PageSize>> {
        (0..self.page_count()).map(|i| self.page_size(i)).collect()
    }

    /// Object id of the page at a 0-based index.
    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        let out_of_range = || HeftwerkError::PageOutOfRange {
            page: index + 1,
            total: pages.len(),
        };
        // lopdf pages are keyed by 1-indexed page number.
        let number = u32::try_from(index + 1).map_err(|_| out_of_range())?;
        pages.get(&number).copied().ok_or_else(out_of_range)
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }
}

/// A page bounding box as stored in /MediaBox or /CropBox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    /// Read a 4-number array, resolving an indirect reference if needed.
    pub(crate) fn from_object(document: &Document, object: &Object) -> Option<Self> {
        let resolved = match object {
            Object::Reference(id) => document.get_object(*id).ok()?,
            other => other,
        };
        let values = match resolved {
            Object::Array(items) if items.len() == 4 => items
                .iter()
                .map(number_value)
                .collect::<Option<Vec<f32>>>()?,
            _ => return None,
        };
        Some(Self {
            llx: values[0].min(values[2]),
            lly: values[1].min(values[3]),
            urx: values[0].max(values[2]),
            ury: values[1].max(values[3]),
        })
    }

    pub(crate) fn size(&self) -> PageSize {
        PageSize::new(self.urx - self.llx, self.ury - self.lly)
    }

    /// Same origin, new width and height.
    pub(crate) fn resized(&self, size: PageSize) -> Self {
        Self {
            urx: self.llx + size.width,
            ury: self.lly + size.height,
            ..*self
        }
    }

    pub(crate) fn to_object(self) -> Object {
        Object::Array(vec![
            number_object(self.llx),
            number_object(self.lly),
            number_object(self.urx),
            number_object(self.ury),
        ])
    }
}

fn number_value(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f as f32),
        _ => None,
    }
}

fn number_object(value: f32) -> Object {
    if value.fract() == 0.0 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value.into())
    }
}

/// Look up `key` on the page, then up the /Parent chain.
pub(crate) fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let dict = document.get_dictionary(current?).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

// -- Page copying -------------------------------------------------------------

/// Copies pages from one document into another.
///
/// Every object a page references is copied once; the id map keeps shared
/// resources shared and turns reference cycles into back-references. Other
/// nodes of the source page tree are never pulled across, so a page copy
/// cannot drag in the rest of its document.
pub(crate) struct PageCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    pub(crate) fn new(source: &'a PdfReader, target: &'a mut Document) -> Self {
        Self {
            source: source.document(),
            target,
            copied: HashMap::new(),
        }
    }

    /// Copy the page with `page_id` into the target and return its new id.
    ///
    /// Inheritable attributes are folded into the copy. The copy has no
    /// /Parent; the caller links it into the target page tree.
    pub(crate) fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            HeftwerkError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let new_id = self.target.new_object_id();
        self.copied.insert(page_id, new_id);

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(value)?);
        }
        for key in INHERITABLE {
            if copy.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                copy.set(key.to_vec(), self.copy_object(value)?);
            }
        }

        self.target.objects.insert(new_id, Object::Dictionary(copy));
        debug!(?page_id, ?new_id, objects = self.copied.len(), "page copied");
        Ok(new_id)
    }

    fn copy_object(&mut self, object: &Object) -> Result<Object> {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(dict)?)),
            Object::Array(items) => items
                .iter()
                .map(|item| self.copy_object(item))
                .collect::<Result<Vec<_>>>()
                .map(Object::Array),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(&stream.dict)?;
                Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
            }
            // Booleans, numbers, strings, names and null copy as-is.
            other => Ok(other.clone()),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Result<Dictionary> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(value)?);
        }
        Ok(copy)
    }

    fn copy_reference(&mut self, id: ObjectId) -> Result<Object> {
        if let Some(new_id) = self.copied.get(&id) {
            return Ok(Object::Reference(*new_id));
        }

        let source = self.source;
        let object = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "cannot resolve reference, using null");
                return Ok(Object::Null);
            }
        };
        if is_page_tree_node(object) {
            return Ok(Object::Null);
        }

        let new_id = self.target.new_object_id();
        self.copied.insert(id, new_id);
        let copy = self.copy_object(object)?;
        self.target.objects.insert(new_id, copy);
        Ok(Object::Reference(new_id))
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(
            dict.get(b"Type").and_then(Object::as_name),
            Ok(b"Page") | Ok(b"Pages")
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::writer::PdfWriter;
    use lopdf::dictionary;

    #[test]
    fn reads_page_count_and_sizes() {
        let bytes = PdfWriter::blank_pages(&[PageSize::A4, PageSize::new(842.0, 595.0)]).unwrap();
        let reader = PdfReader::from_bytes("two.pdf", &bytes).unwrap();

        assert_eq!(reader.page_count(), 2);
        let sizes = reader.page_sizes().unwrap();
        assert_eq!(sizes, vec![PageSize::A4, PageSize::new(842.0, 595.0)]);
    }

    #[test]
    fn garbage_is_a_corrupt_document() {
        let result = PdfReader::from_bytes("junk.pdf", b"%PDF-1.4\nthis is not a pdf");
        match result {
            Err(HeftwerkError::CorruptDocument { name, .. }) => assert_eq!(name, "junk.pdf"),
            Err(other) => panic!("unexpected error variant: {other}"),
            Ok(_) => panic!("garbage parsed as a PDF"),
        }
    }

    #[test]
    fn page_index_out_of_range() {
        let bytes = PdfWriter::blank_pages(&[PageSize::A4]).unwrap();
        let reader = PdfReader::from_bytes("one.pdf", &bytes).unwrap();
        assert!(matches!(
            reader.page_size(1),
            Err(HeftwerkError::PageOutOfRange { page: 2, total: 1 })
        ));
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        // Page tree carries the MediaBox; the page itself has none.
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let reader = PdfReader::from_bytes("letter.pdf", &bytes).unwrap();
        assert_eq!(reader.page_size(0).unwrap(), PageSize::new(612.0, 792.0));
    }

    #[test]
    fn page_box_resize_keeps_origin() {
        let media_box = PageBox {
            llx: 10.0,
            lly: 20.0,
            urx: 110.0,
            ury: 220.0,
        };
        let resized = media_box.resized(PageSize::new(50.0, 60.0));
        assert_eq!(resized.size(), PageSize::new(50.0, 60.0));
        assert_eq!((resized.llx, resized.lly), (10.0, 20.0));
    }
}
