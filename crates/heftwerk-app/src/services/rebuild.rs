// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composite rebuilds on the blocking pool, installed by generation.
//
// Each request takes the next generation number before any work starts. A
// finished composite replaces the installed one only when its generation is
// newer, so overlapping rebuilds that complete out of order still leave the
// slot holding the result of the latest mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use heftwerk_core::error::{HeftwerkError, Result};
use heftwerk_core::manifest::ManifestSnapshot;
use heftwerk_document::{Composite, CompositeBuilder, SourceLibrary};
use tracing::{debug, instrument};

/// Shared rebuild state. Clones share the generation counter and the slot.
#[derive(Clone, Default)]
pub struct Rebuilder {
    issued: Arc<AtomicU64>,
    installed: Arc<Mutex<Option<Arc<Composite>>>>,
}

impl Rebuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next generation number. The first one handed out is 1.
    pub fn next_generation(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently installed composite.
    pub fn current(&self) -> Option<Arc<Composite>> {
        self.slot().clone()
    }

    /// Install `composite` unless a newer generation is already in place.
    ///
    /// Returns `true` when the composite was installed.
    pub fn install(&self, composite: Composite) -> bool {
        let mut slot = self.slot();
        let newer_installed = slot
            .as_ref()
            .map(|current| current.generation() >= composite.generation());
        if newer_installed == Some(true) {
            debug!(
                stale = composite.generation(),
                installed = slot.as_ref().map(|current| current.generation()),
                "Stale rebuild discarded"
            );
            return false;
        }
        *slot = Some(Arc::new(composite));
        true
    }

    /// Build a composite from `snapshot` on the blocking pool and install it.
    ///
    /// Returns whichever composite is installed afterwards: the new one, or a
    /// newer one that finished first.
    #[instrument(skip_all, fields(pages = snapshot.len()))]
    pub async fn rebuild(
        &self,
        snapshot: ManifestSnapshot,
        library: SourceLibrary,
    ) -> Result<Arc<Composite>> {
        let generation = self.next_generation();
        let composite = tokio::task::spawn_blocking(move || {
            CompositeBuilder::rebuild(&snapshot, &library, generation)
        })
        .await
        .map_err(|err| HeftwerkError::Task(format!("rebuild task panicked: {}", err)))??;

        self.install(composite);
        self.current()
            .ok_or_else(|| HeftwerkError::Task("composite slot empty after install".into()))
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<Composite>>> {
        self.installed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
