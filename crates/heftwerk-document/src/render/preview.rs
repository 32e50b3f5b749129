// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview renderer — shows one page of the latest composite and tracks the
// current page for next/previous navigation.
//
// Every render re-serialises the composite and hands the bytes to the
// backend, which parses them afresh. Rasterisation runs on the blocking pool.

use std::sync::Arc;

use heftwerk_core::config::DEFAULT_MAX_PREVIEW_PIXELS;
use heftwerk_core::error::{HeftwerkError, Result};
use tracing::{debug, instrument};

use super::{RenderBackend, Surface, Viewport};
use crate::pdf::composite::Composite;

/// What the preview currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// No pages; the surface is cleared.
    Empty,
    /// Page `page` (1-based) of `total`.
    Showing { page: usize, total: usize },
}

/// Page-at-a-time preview over a composite.
pub struct PreviewRenderer {
    backend: Arc<dyn RenderBackend>,
    /// Fixed zoom factor.
    scale: f32,
    /// Longest edge allowed for a surface.
    max_pixels: u32,
    state: PreviewState,
    surface: Option<Surface>,
}

impl PreviewRenderer {
    pub fn new(backend: Arc<dyn RenderBackend>, scale: f32) -> Self {
        Self {
            backend,
            scale,
            max_pixels: DEFAULT_MAX_PREVIEW_PIXELS,
            state: PreviewState::Empty,
            surface: None,
        }
    }

    /// Cap both surface edges at `max_pixels`.
    pub fn with_max_pixels(mut self, max_pixels: u32) -> Self {
        self.max_pixels = max_pixels.max(1);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// 1-based page on display, if any.
    pub fn current_page(&self) -> Option<usize> {
        match self.state {
            PreviewState::Showing { page, .. } => Some(page),
            PreviewState::Empty => None,
        }
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn can_previous(&self) -> bool {
        matches!(self.state, PreviewState::Showing { page, .. } if page > 1)
    }

    pub fn can_next(&self) -> bool {
        matches!(self.state, PreviewState::Showing { page, total } if page < total)
    }

    /// "Page 2 / 5", or "Page 0 / 0" when empty.
    pub fn page_info(&self) -> String {
        match self.state {
            PreviewState::Showing { page, total } => format!("Page {page} / {total}"),
            PreviewState::Empty => "Page 0 / 0".to_string(),
        }
    }

    /// Clear the surface and return to `Empty`.
    pub fn clear(&mut self) {
        self.state = PreviewState::Empty;
        self.surface = None;
    }

    /// Render `requested` (1-based, clamped into range) of `composite`.
    ///
    /// An empty composite clears the preview. On failure the previous state
    /// and surface are kept.
    #[instrument(skip(self, composite), fields(generation = composite.generation()))]
    pub async fn show(&mut self, composite: &Arc<Composite>, requested: usize) -> Result<PreviewState> {
        let total = composite.page_count();
        if total == 0 {
            self.clear();
            return Ok(self.state);
        }

        let page = requested.clamp(1, total);
        let entry = composite
            .snapshot()
            .page(page)
            .ok_or(HeftwerkError::PageOutOfRange { page, total })?;
        let viewport =
            Viewport::new(entry.original_size, self.scale, entry.rotation).capped(self.max_pixels);

        let backend = Arc::clone(&self.backend);
        let composite = Arc::clone(composite);
        let surface = tokio::task::spawn_blocking(move || {
            let bytes = composite.to_bytes()?;
            backend.rasterize(&bytes, page - 1, &viewport)
        })
        .await
        .map_err(|err| HeftwerkError::Task(format!("render task panicked: {}", err)))??;

        debug!(page, total, width = surface.width(), height = surface.height(), "Preview updated");
        self.surface = Some(surface);
        self.state = PreviewState::Showing { page, total };
        Ok(self.state)
    }

    /// Jump to `page`, clamped into `[1, total]`.
    pub async fn goto(&mut self, composite: &Arc<Composite>, page: usize) -> Result<PreviewState> {
        self.show(composite, page).await
    }

    /// Advance one page. Returns `false` (and does nothing) on the last page.
    pub async fn next(&mut self, composite: &Arc<Composite>) -> Result<bool> {
        match self.state {
            PreviewState::Showing { page, total } if page < total => {
                self.show(composite, page + 1).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Go back one page. Returns `false` (and does nothing) on page 1.
    pub async fn previous(&mut self, composite: &Arc<Composite>) -> Result<bool> {
        match self.state {
            PreviewState::Showing { page, .. } if page > 1 => {
                self.show(composite, page - 1).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
