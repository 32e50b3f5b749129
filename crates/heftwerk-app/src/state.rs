// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session state — the manifest, the selected sources, the installed composite
// and the preview, owned by one context object.
//
// Every mutation follows the same chain: checkpoint, change the manifest,
// rebuild the composite from a snapshot of it, then refresh the preview. A
// rebuild that fails restores the checkpoint and leaves the previous composite
// installed. A preview that cannot be drawn does not undo the mutation; it is
// logged and kept as a notice for the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::human_errors::{Notice, humanize_error, rejected_file};
use heftwerk_core::types::{EntryId, PageEntry, Rotation};
use heftwerk_core::{AppConfig, PageManifest};
use heftwerk_document::render::backend_for;
use heftwerk_document::{Composite, CompositeBuilder, PreviewRenderer, RenderBackend, SourceDocument, SourceLibrary};
use tracing::{info, instrument, warn};

use crate::services::rebuild::Rebuilder;

/// Which page the preview should land on after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Bulk changes start again at page 1.
    First,
    /// Follow one entry to wherever it now sits.
    Entry(EntryId),
    /// A 1-based page, clamped.
    Page(usize),
}

/// Outcome of adding several files at once.
#[derive(Debug, Default)]
pub struct AddReport {
    /// File name and number of pages added.
    pub added: Vec<(String, usize)>,
    /// One notice per file that was skipped or failed.
    pub notices: Vec<Notice>,
}

/// Manifest and sources as they were before a mutation.
struct Checkpoint {
    manifest: PageManifest,
    library: SourceLibrary,
}

/// Owned application context. Operations take `&mut self`.
pub struct Session {
    config: AppConfig,
    library: SourceLibrary,
    manifest: PageManifest,
    rebuilder: Rebuilder,
    preview: PreviewRenderer,
    preview_notice: Option<Notice>,
}

impl Session {
    /// Create a session with the render backend named in `config`.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let backend = backend_for(config.render_backend)?;
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: AppConfig, backend: Arc<dyn RenderBackend>) -> Self {
        let preview = PreviewRenderer::new(backend, config.preview_scale)
            .with_max_pixels(config.max_preview_pixels);
        Self {
            config,
            library: SourceLibrary::new(),
            manifest: PageManifest::new(),
            rebuilder: Rebuilder::new(),
            preview,
            preview_notice: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn manifest(&self) -> &PageManifest {
        &self.manifest
    }

    pub fn library(&self) -> &SourceLibrary {
        &self.library
    }

    pub fn preview(&self) -> &PreviewRenderer {
        &self.preview
    }

    /// Notice left by the last preview that could not be drawn.
    pub fn take_preview_notice(&mut self) -> Option<Notice> {
        self.preview_notice.take()
    }

    /// The composite the preview is drawn from.
    pub fn composite(&self) -> Option<Arc<Composite>> {
        self.rebuilder.current()
    }

    /// Manifest entry at a 1-based display number.
    pub fn entry_at(&self, display_number: usize) -> Result<&PageEntry> {
        display_number
            .checked_sub(1)
            .and_then(|position| self.manifest.get(position))
            .ok_or(HeftwerkError::PageOutOfRange {
                page: display_number,
                total: self.manifest.len(),
            })
    }

    // -- Adding sources -------------------------------------------------------

    /// Add one source document and append an entry for each of its pages.
    ///
    /// Returns the number of pages added. Format, parse and rebuild failures
    /// leave the manifest and sources untouched.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub async fn add_document(&mut self, name: &str, bytes: Vec<u8>) -> Result<usize> {
        let owned_name = name.to_string();
        let document = tokio::task::spawn_blocking(move || SourceDocument::load(&owned_name, bytes))
            .await
            .map_err(|err| HeftwerkError::Task(format!("load task panicked: {}", err)))??;

        let checkpoint = self.checkpoint();
        let document = self.library.insert(document);
        let entries = document.entries(self.config.landscape_rotation);
        let pages = entries.len();
        self.manifest.append(entries);
        info!(name, pages, total = self.manifest.len(), "Pages added");

        self.commit(checkpoint, Focus::First).await?;
        Ok(pages)
    }

    /// Read and add each file in turn. Files that cannot be added become
    /// notices; the rest are still processed.
    pub async fn add_files(&mut self, paths: &[PathBuf]) -> AddReport {
        let mut report = AddReport::default();
        for path in paths {
            let name = display_name(path);
            let outcome = match tokio::fs::read(path).await {
                Ok(bytes) => self.add_document(&name, bytes).await,
                Err(e) => Err(HeftwerkError::Io(e)),
            };
            match outcome {
                Ok(pages) => report.added.push((name, pages)),
                Err(HeftwerkError::UnsupportedFormat(_)) => {
                    warn!(name, "skipping non-PDF file");
                    report.notices.push(rejected_file(&name));
                }
                Err(e) => {
                    warn!(name, error = %e, "could not add file");
                    report.notices.push(humanize_error(&e));
                }
            }
        }
        report
    }

    // -- Manifest mutators ----------------------------------------------------

    /// Remove one entry. Returns `None` when it is not in the manifest.
    pub async fn remove_page(&mut self, id: &EntryId) -> Result<Option<PageEntry>> {
        let checkpoint = self.checkpoint();
        let Some(removed) = self.manifest.remove(id) else {
            return Ok(None);
        };
        let pruned = self.library.retain_referenced(self.manifest.iter().map(|e| e.source.id));
        info!(label = %removed.label(), pruned, "Page removed");
        self.commit(checkpoint, Focus::First).await?;
        Ok(Some(removed))
    }

    /// Replace the page order. Returns how many entries came from `order`.
    pub async fn reorder(&mut self, order: &[EntryId]) -> Result<usize> {
        let checkpoint = self.checkpoint();
        let placed = self.manifest.reorder(order);
        info!(placed, requested = order.len(), "Pages reordered");
        self.commit(checkpoint, Focus::First).await?;
        Ok(placed)
    }

    /// Move one entry to a 0-based position. Returns its new position.
    pub async fn move_page(&mut self, id: &EntryId, to_position: usize) -> Result<Option<usize>> {
        let checkpoint = self.checkpoint();
        let Some(position) = self.manifest.move_entry(id, to_position) else {
            return Ok(None);
        };
        self.commit(checkpoint, Focus::Entry(*id)).await?;
        Ok(Some(position))
    }

    /// Turn one entry by `delta_degrees`. Returns its new rotation.
    pub async fn rotate_page(&mut self, id: &EntryId, delta_degrees: i32) -> Result<Option<Rotation>> {
        let checkpoint = self.checkpoint();
        let Some(rotation) = self.manifest.rotate(id, delta_degrees)? else {
            return Ok(None);
        };
        self.commit(checkpoint, Focus::Entry(*id)).await?;
        Ok(Some(rotation))
    }

    // -- Preview --------------------------------------------------------------

    /// Preview a 1-based page of the installed composite, clamped into range.
    ///
    /// Only an empty manifest is rejected.
    pub async fn select_page(&mut self, page: usize) -> Result<()> {
        if self.manifest.is_empty() {
            return Err(HeftwerkError::PageOutOfRange { page, total: 0 });
        }
        match self.composite() {
            Some(composite) => {
                self.preview.goto(&composite, page).await?;
                Ok(())
            }
            None => self.refresh(Focus::Page(page)).await,
        }
    }

    /// Show the next page. `false` on the last page.
    pub async fn next(&mut self) -> Result<bool> {
        match self.composite() {
            Some(composite) => self.preview.next(&composite).await,
            None => Ok(false),
        }
    }

    /// Show the previous page. `false` on page 1.
    pub async fn previous(&mut self) -> Result<bool> {
        match self.composite() {
            Some(composite) => self.preview.previous(&composite).await,
            None => Ok(false),
        }
    }

    /// Write the current preview surface as PNG.
    pub fn save_preview(&self, path: &Path) -> Result<()> {
        let surface = self.preview.surface().ok_or(HeftwerkError::PageOutOfRange {
            page: 0,
            total: self.manifest.len(),
        })?;
        surface.save(path)
    }

    /// Rebuild from the current manifest and point the preview at `focus`.
    ///
    /// Only the rebuild can fail. A preview that cannot be drawn clears the
    /// surface and leaves a notice behind.
    pub async fn refresh(&mut self, focus: Focus) -> Result<()> {
        let composite = self
            .rebuilder
            .rebuild(self.manifest.snapshot(), self.library.clone())
            .await?;

        let page = match focus {
            Focus::First => 1,
            Focus::Page(page) => page,
            Focus::Entry(id) => self.manifest.position(&id).map_or(1, |position| position + 1),
        };
        self.preview_notice = match self.preview.show(&composite, page).await {
            Ok(_) => None,
            Err(e) => {
                warn!(page, error = %e, "preview could not be drawn");
                self.preview.clear();
                Some(humanize_error(&e))
            }
        };
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            manifest: self.manifest.clone(),
            library: self.library.clone(),
        }
    }

    /// Refresh after a mutation, restoring `checkpoint` if the rebuild fails.
    async fn commit(&mut self, checkpoint: Checkpoint, focus: Focus) -> Result<()> {
        if let Err(e) = self.refresh(focus).await {
            warn!(error = %e, "rebuild failed, change undone");
            self.manifest = checkpoint.manifest;
            self.library = checkpoint.library;
            return Err(e);
        }
        Ok(())
    }

    // -- Export ---------------------------------------------------------------

    /// Build a fresh composite from the manifest and serialise it.
    ///
    /// Independent of the composite installed for preview.
    #[instrument(skip(self), fields(pages = self.manifest.len()))]
    pub async fn export(&self) -> Result<Vec<u8>> {
        if self.manifest.is_empty() {
            return Err(HeftwerkError::EmptyExport);
        }
        let snapshot = self.manifest.snapshot();
        let library = self.library.clone();
        let producer = self.config.producer.clone();
        let generation = self.rebuilder.next_generation();

        tokio::task::spawn_blocking(move || {
            CompositeBuilder::rebuild(&snapshot, &library, generation)?.to_export_bytes(&producer)
        })
        .await
        .map_err(|err| HeftwerkError::Task(format!("export task panicked: {}", err)))?
    }

    /// Export and write to `target`. A directory target receives the
    /// configured export file name. Returns the path written.
    pub async fn export_to(&self, target: &Path) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(&self.config.export_file_name)
        } else {
            target.to_path_buf()
        };
        let bytes = self.export().await?;
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Exported");
        Ok(path)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heftwerk_core::human_errors::Severity;
    use heftwerk_core::types::PageSize;
    use heftwerk_document::render::{Surface, Viewport};
    use heftwerk_document::{OutlineBackend, PdfReader, PdfWriter, PreviewState};

    fn session() -> Session {
        Session::with_backend(AppConfig::default(), Arc::new(OutlineBackend))
    }

    fn pdf(pages: usize) -> Vec<u8> {
        PdfWriter::blank_pages(&vec![PageSize::A4; pages]).unwrap()
    }

    fn ids(session: &Session) -> Vec<EntryId> {
        session.manifest().ids()
    }

    fn numbers(session: &Session) -> Vec<usize> {
        session.manifest().iter().map(|e| e.display_number).collect()
    }

    #[tokio::test]
    async fn full_editing_scenario() {
        let mut session = session();
        session.add_document("A.pdf", pdf(2)).await.unwrap();
        session.add_document("B.pdf", pdf(1)).await.unwrap();

        let [a0, a1, b0] = ids(&session)[..] else {
            panic!("expected three entries");
        };
        assert_eq!(numbers(&session), vec![1, 2, 3]);

        session.reorder(&[a1, b0, a0]).await.unwrap();
        assert_eq!(ids(&session), vec![a1, b0, a0]);
        assert_eq!(numbers(&session), vec![1, 2, 3]);

        session.rotate_page(&a0, 90).await.unwrap();
        let rotation = session.rotate_page(&a0, 90).await.unwrap();
        assert_eq!(rotation, Some(Rotation::HALF));
        assert_eq!(session.preview().current_page(), Some(3));

        session.remove_page(&b0).await.unwrap();
        assert_eq!(ids(&session), vec![a1, a0]);
        assert_eq!(numbers(&session), vec![1, 2]);
        assert_eq!(session.library().len(), 1);

        session.remove_page(&a1).await.unwrap();
        session.remove_page(&a0).await.unwrap();
        assert!(matches!(session.export().await, Err(HeftwerkError::EmptyExport)));
        assert_eq!(session.preview().state(), PreviewState::Empty);
    }

    #[tokio::test]
    async fn corrupt_input_leaves_manifest_unchanged() {
        let mut session = session();
        session.add_document("good.pdf", pdf(1)).await.unwrap();

        let result = session.add_document("bad.pdf", b"%PDF-1.4\nthis is not a pdf".to_vec()).await;
        assert!(matches!(result, Err(HeftwerkError::CorruptDocument { .. })));
        let result = session.add_document("notes.txt", b"plain text".to_vec()).await;
        assert!(matches!(result, Err(HeftwerkError::UnsupportedFormat(_))));

        assert_eq!(session.manifest().len(), 1);
        assert_eq!(session.library().len(), 1);
    }

    #[tokio::test]
    async fn landscape_pages_use_configured_rotation() {
        let config = AppConfig {
            landscape_rotation: Some(Rotation::QUARTER),
            ..AppConfig::default()
        };
        let mut session = Session::with_backend(config, Arc::new(OutlineBackend));
        let bytes = PdfWriter::blank_pages(&[PageSize::A4, PageSize::new(842.0, 595.0)]).unwrap();
        session.add_document("mixed.pdf", bytes).await.unwrap();

        let rotations: Vec<Rotation> = session.manifest().iter().map(|e| e.rotation).collect();
        assert_eq!(rotations, vec![Rotation::NONE, Rotation::QUARTER]);
    }

    #[tokio::test]
    async fn move_page_previews_new_position() {
        let mut session = session();
        session.add_document("A.pdf", pdf(3)).await.unwrap();
        let first = ids(&session)[0];

        assert_eq!(session.move_page(&first, 2).await.unwrap(), Some(2));
        assert_eq!(session.preview().page_info(), "Page 3 / 3");
        assert_eq!(session.entry_at(3).unwrap().id(), first);
    }

    #[tokio::test]
    async fn missing_entries_are_noops() {
        let mut session = session();
        session.add_document("A.pdf", pdf(1)).await.unwrap();
        let other = SourceDocument::load("other.pdf", pdf(1)).unwrap();
        let absent = EntryId::new(other.id(), 0);

        assert_eq!(session.remove_page(&absent).await.unwrap(), None);
        assert_eq!(session.rotate_page(&absent, 90).await.unwrap(), None);
        assert_eq!(session.move_page(&absent, 0).await.unwrap(), None);
        assert_eq!(session.manifest().len(), 1);
    }

    #[tokio::test]
    async fn navigation_follows_composite() {
        let mut session = session();
        session.add_document("A.pdf", pdf(2)).await.unwrap();
        assert_eq!(session.preview().current_page(), Some(1));

        assert!(!session.previous().await.unwrap());
        assert!(session.next().await.unwrap());
        assert!(!session.next().await.unwrap());

        session.select_page(1).await.unwrap();
        assert_eq!(session.preview().current_page(), Some(1));
        session.select_page(5).await.unwrap();
        assert_eq!(session.preview().page_info(), "Page 2 / 2");
        session.select_page(0).await.unwrap();
        assert_eq!(session.preview().current_page(), Some(1));
    }

    #[tokio::test]
    async fn select_page_on_empty_manifest_is_rejected() {
        let mut session = session();
        assert!(matches!(
            session.select_page(1).await,
            Err(HeftwerkError::PageOutOfRange { page: 1, total: 0 })
        ));
    }

    /// Backend that fails every render.
    struct BrokenBackend;

    impl RenderBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn rasterize(&self, _pdf: &[u8], _page: usize, _viewport: &Viewport) -> Result<Surface> {
            Err(HeftwerkError::Render("renderer offline".into()))
        }
    }

    #[tokio::test]
    async fn preview_failure_does_not_undo_mutations() {
        let mut session = Session::with_backend(AppConfig::default(), Arc::new(BrokenBackend));

        assert_eq!(session.add_document("A.pdf", pdf(2)).await.unwrap(), 2);
        assert_eq!(session.manifest().len(), 2);
        assert_eq!(session.composite().unwrap().page_count(), 2);
        assert_eq!(session.preview().state(), PreviewState::Empty);
        let notice = session.take_preview_notice().unwrap();
        assert_eq!(notice.message, "The preview could not be drawn.");
        assert!(session.take_preview_notice().is_none());

        let [first, second] = ids(&session)[..] else {
            panic!("expected two entries");
        };
        assert_eq!(session.rotate_page(&first, 90).await.unwrap(), Some(Rotation::QUARTER));
        assert_eq!(session.manifest().entry(&first).unwrap().rotation, Rotation::QUARTER);
        assert!(session.remove_page(&second).await.unwrap().is_some());
        assert_eq!(ids(&session), vec![first]);
        assert_eq!(session.composite().unwrap().page_count(), 1);
        assert!(session.take_preview_notice().is_some());
    }

    #[tokio::test]
    async fn failed_rebuild_restores_manifest_and_sources() {
        let mut session = session();
        session.add_document("A.pdf", pdf(2)).await.unwrap();
        let before = ids(&session);
        let installed = session.composite().unwrap().generation();

        // A library that lost its documents makes every rebuild fail.
        let library = std::mem::take(&mut session.library);

        let result = session.rotate_page(&before[0], 90).await;
        assert!(matches!(result, Err(HeftwerkError::UnknownSource(_))));
        assert_eq!(session.manifest().entry(&before[0]).unwrap().rotation, Rotation::NONE);

        let result = session.add_document("B.pdf", pdf(1)).await;
        assert!(matches!(result, Err(HeftwerkError::UnknownSource(_))));
        assert_eq!(ids(&session), before);
        assert!(session.library().is_empty());
        assert_eq!(session.composite().unwrap().generation(), installed);

        session.library = library;
        session.reorder(&[before[1]]).await.unwrap();
        assert_eq!(ids(&session), vec![before[1], before[0]]);
    }

    #[tokio::test]
    async fn tiny_landscape_page_is_added_and_previewed() {
        let config = AppConfig {
            landscape_rotation: Some(Rotation::QUARTER),
            ..AppConfig::default()
        };
        let mut session = Session::with_backend(config, Arc::new(OutlineBackend));
        let bytes = PdfWriter::blank_pages(&[PageSize::new(0.6, 0.3)]).unwrap();

        assert_eq!(session.add_document("speck.pdf", bytes).await.unwrap(), 1);
        assert_eq!(session.manifest().get(0).unwrap().rotation, Rotation::QUARTER);
        assert_eq!(session.preview().page_info(), "Page 1 / 1");
        assert!(session.take_preview_notice().is_none());
    }

    #[tokio::test]
    async fn oversized_page_preview_is_capped() {
        let config = AppConfig {
            max_preview_pixels: 256,
            ..AppConfig::default()
        };
        let mut session = Session::with_backend(config, Arc::new(OutlineBackend));
        let bytes = PdfWriter::blank_pages(&[PageSize::new(14_400.0, 14_400.0)]).unwrap();
        session.add_document("poster.pdf", bytes).await.unwrap();

        let surface = session.preview().surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (256, 256));
    }

    #[tokio::test]
    async fn export_writes_independent_fresh_composite() {
        let mut session = session();
        session.add_document("A.pdf", pdf(2)).await.unwrap();
        session.add_document("B.pdf", pdf(1)).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = session.export_to(dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("merged.pdf"));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(PdfReader::from_bytes("merged.pdf", &bytes).unwrap().page_count(), 3);
    }

    #[tokio::test]
    async fn add_files_reports_rejected_files_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        let good = dir.path().join("good.pdf");
        std::fs::write(&notes, "hello").unwrap();
        std::fs::write(&good, pdf(2)).unwrap();

        let mut session = session();
        let report = session
            .add_files(&[notes, dir.path().join("missing.pdf"), good])
            .await;

        assert_eq!(report.added, vec![("good.pdf".to_string(), 2)]);
        assert_eq!(report.notices.len(), 2);
        assert_eq!(report.notices[0].message, "notes.txt is not a PDF file and will be skipped.");
        assert_eq!(report.notices[0].severity, Severity::Skipped);
        assert_eq!(session.manifest().len(), 2);
    }
}
