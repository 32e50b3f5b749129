// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composite builder — turn a manifest snapshot into one assembled PDF.
//
// Every rebuild starts from an empty document and the sources' raw bytes.
// There is no incremental update: page N of the result always mirrors entry
// N of the snapshot it was built from.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::Utc;
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::manifest::ManifestSnapshot;
use heftwerk_core::types::{PageEntry, SourceId};
use lopdf::{Document, Object, dictionary};
use tracing::{debug, info, instrument};

use super::reader::{PageBox, PageCopier, PdfReader, inherited_attribute};
use super::source::SourceLibrary;
use super::writer::PdfWriter;

/// An assembled document plus the snapshot it mirrors.
#[derive(Debug, Clone)]
pub struct Composite {
    generation: u64,
    snapshot: ManifestSnapshot,
    document: Document,
}

impl Composite {
    /// Rebuild request number this composite answers.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_count(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn snapshot(&self) -> &ManifestSnapshot {
        &self.snapshot
    }

    /// Serialise a fresh copy of the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut document = self.document.clone();
        save(&mut document)
    }

    /// Serialise with an /Info dictionary naming the producer and the
    /// creation time.
    pub fn to_export_bytes(&self, producer: &str) -> Result<Vec<u8>> {
        let mut document = self.document.clone();
        let created = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        let info_id = document.add_object(dictionary! {
            "Producer" => Object::string_literal(producer),
            "CreationDate" => Object::string_literal(created),
        });
        document.trailer.set("Info", info_id);
        save(&mut document)
    }
}

fn save(document: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    document.save_to(&mut output).map_err(|err| {
        HeftwerkError::PdfError(format!("failed to serialise composite: {}", err))
    })?;
    Ok(output)
}

/// Builds composites from manifest snapshots.
pub struct CompositeBuilder;

impl CompositeBuilder {
    /// Assemble every entry of `snapshot`, in order, from `library`.
    ///
    /// Each source is parsed from its raw bytes at most once per call. The
    /// stored rotation and original size of each entry are applied to its
    /// copied page.
    #[instrument(skip_all, fields(pages = snapshot.len(), generation = generation))]
    pub fn rebuild(
        snapshot: &ManifestSnapshot,
        library: &SourceLibrary,
        generation: u64,
    ) -> Result<Composite> {
        let mut writer = PdfWriter::new();
        let mut parsed: HashMap<SourceId, PdfReader> = HashMap::new();

        for entry in snapshot.entries() {
            let reader = match parsed.entry(entry.source.id) {
                Entry::Occupied(slot) => slot.into_mut(),
                Entry::Vacant(slot) => {
                    let document = library
                        .get(&entry.source.id)
                        .ok_or_else(|| HeftwerkError::UnknownSource(entry.source.name.clone()))?;
                    slot.insert(PdfReader::from_bytes(document.name(), document.bytes())?)
                }
            };
            copy_entry(reader, &mut writer, entry)?;
        }

        let page_count = writer.page_count();
        info!(page_count, generation, "Composite built");

        Ok(Composite {
            generation,
            snapshot: snapshot.clone(),
            document: writer.finish(),
        })
    }
}

/// Copy one page and apply the entry's transform state to the copy.
fn copy_entry(reader: &PdfReader, writer: &mut PdfWriter, entry: &PageEntry) -> Result<()> {
    let source_page = reader.page_id(entry.source_page_index)?;
    let media_box = inherited_attribute(reader.document(), source_page, b"MediaBox")
        .and_then(|object| PageBox::from_object(reader.document(), object))
        .unwrap_or(PageBox {
            llx: 0.0,
            lly: 0.0,
            urx: entry.original_size.width,
            ury: entry.original_size.height,
        })
        .resized(entry.original_size);

    let page_id = PageCopier::new(reader, writer.document_mut()).copy_page(source_page)?;

    let page = writer
        .document_mut()
        .get_dictionary_mut(page_id)
        .map_err(|err| HeftwerkError::PdfError(format!("copied page missing: {}", err)))?;
    page.set("Rotate", Object::Integer(i64::from(entry.rotation.degrees())));
    page.set("MediaBox", media_box.to_object());

    writer.append_page(page_id)?;
    debug!(
        source = %entry.source.name,
        page = entry.source_page_index + 1,
        rotation = entry.rotation.degrees(),
        "Entry appended to composite"
    );
    Ok(())
}
