// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source documents — the raw bytes of every selected PDF, keyed by a
// synthetic id so that equal file names never collide.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::types::{DocumentType, PageEntry, PageSize, Rotation, SourceId, SourceRef};
use tracing::{info, instrument};

use super::reader::PdfReader;

/// A selected source PDF: identity, raw bytes, and per-page sizes captured
/// at selection time.
#[derive(Debug)]
pub struct SourceDocument {
    source: SourceRef,
    bytes: Arc<[u8]>,
    page_sizes: Vec<PageSize>,
    added_at: DateTime<Utc>,
}

impl SourceDocument {
    /// Check the format, parse, and capture page geometry.
    ///
    /// Fails with `UnsupportedFormat` when `name`/`bytes` are not a PDF and
    /// `CorruptDocument` when the PDF does not parse.
    #[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
    pub fn load(name: &str, bytes: Vec<u8>) -> Result<Self> {
        if DocumentType::detect(name, &bytes) != Some(DocumentType::Pdf) {
            return Err(HeftwerkError::UnsupportedFormat(name.to_string()));
        }

        let reader = PdfReader::from_bytes(name, &bytes)?;
        let page_sizes = reader.page_sizes()?;

        info!(name, pages = page_sizes.len(), "Source document loaded");

        Ok(Self {
            source: SourceRef {
                id: SourceId::new(),
                name: name.to_string(),
            },
            bytes: Arc::from(bytes),
            page_sizes,
            added_at: Utc::now(),
        })
    }

    pub fn id(&self) -> SourceId {
        self.source.id
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    /// Size of the page at a 0-based index, as captured at selection time.
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        self.page_sizes
            .get(index)
            .copied()
            .ok_or(HeftwerkError::PageOutOfRange {
                page: index + 1,
                total: self.page_sizes.len(),
            })
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// One manifest entry per page, in source order.
    pub fn entries(&self, landscape_rotation: Option<Rotation>) -> Vec<PageEntry> {
        self.page_sizes
            .iter()
            .enumerate()
            .map(|(index, size)| {
                PageEntry::new(self.source.clone(), index, *size, landscape_rotation)
            })
            .collect()
    }
}

/// Every source document currently selected, by id.
///
/// Cloning is cheap: documents are shared behind `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SourceLibrary {
    documents: HashMap<SourceId, Arc<SourceDocument>>,
}

impl SourceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: SourceDocument) -> Arc<SourceDocument> {
        let document = Arc::new(document);
        self.documents.insert(document.id(), Arc::clone(&document));
        document
    }

    pub fn get(&self, id: &SourceId) -> Option<&Arc<SourceDocument>> {
        self.documents.get(id)
    }

    /// Documents in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SourceDocument>> {
        let mut documents: Vec<&Arc<SourceDocument>> = self.documents.values().collect();
        documents.sort_by_key(|document| document.added_at());
        documents.into_iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Drop documents none of whose pages are still referenced.
    pub fn retain_referenced(&mut self, referenced: impl IntoIterator<Item = SourceId>) -> usize {
        let keep: std::collections::HashSet<SourceId> = referenced.into_iter().collect();
        let before = self.documents.len();
        self.documents.retain(|id, _| keep.contains(id));
        before - self.documents.len()
    }
}
