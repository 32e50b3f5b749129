// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — assemble a new document page by page with `lopdf`.
//
// The writer owns a fresh document with a catalog and a flat page tree.
// Pages are linked in append order; `finish` writes the /Pages node.

use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::types::PageSize;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, instrument};

/// Builds a new PDF from pages appended one at a time.
pub struct PdfWriter {
    document: Document,
    /// Reserved id of the root /Pages node.
    pages_id: ObjectId,
    /// Page object ids in output order.
    kids: Vec<ObjectId>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    /// Create an empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Link an already-inserted page object as the last page.
    pub(crate) fn append_page(&mut self, page_id: ObjectId) -> Result<()> {
        let page = self.document.get_dictionary_mut(page_id).map_err(|err| {
            HeftwerkError::PdfError(format!("page object {:?} missing: {}", page_id, err))
        })?;
        page.set("Parent", Object::Reference(self.pages_id));
        self.kids.push(page_id);
        Ok(())
    }

    /// Write the page tree and return the finished document.
    pub fn finish(mut self) -> Document {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        self.document
    }

    // -- Blank documents ------------------------------------------------------

    /// Create a PDF with one labelled page per entry in `sizes`.
    ///
    /// Each page shows "Page N" in Helvetica near its lower-left corner.
    #[instrument(skip_all, fields(pages = sizes.len()))]
    pub fn blank_pages(sizes: &[PageSize]) -> Result<Vec<u8>> {
        let mut writer = Self::new();
        let font_id = writer.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = writer.document.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        for (index, size) in sizes.iter().enumerate() {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![36.into(), 36.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("Page {}", index + 1))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let encoded = content.encode().map_err(|err| {
                HeftwerkError::PdfError(format!("failed to encode page content: {}", err))
            })?;
            let content_id = writer
                .document
                .add_object(Stream::new(dictionary! {}, encoded));
            let media_box = super::reader::PageBox {
                llx: 0.0,
                lly: 0.0,
                urx: size.width,
                ury: size.height,
            };
            let page_id = writer.document.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => media_box.to_object(),
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            writer.append_page(page_id)?;
        }

        let mut document = writer.finish();
        let mut output = Vec::new();
        document.save_to(&mut output).map_err(|err| {
            HeftwerkError::PdfError(format!("failed to serialise blank document: {}", err))
        })?;

        debug!(output_bytes = output.len(), "Blank document created");
        Ok(output)
    }
}
