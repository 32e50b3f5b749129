// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pdfium renderer — full page rasterisation through `pdfium-render`.
//
// Pdfium keeps thread-local state, so the library is bound per call rather
// than stored in the backend. Callers run `rasterize` on a blocking thread.

use heftwerk_core::error::{HeftwerkError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument};

use super::{RenderBackend, Surface, Viewport};

/// Renderer backed by a pdfium shared library.
#[derive(Debug, Clone, Copy)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    /// Check that a pdfium library can be bound before committing to it.
    pub fn new() -> Result<Self> {
        bind()?;
        info!("pdfium library bound");
        Ok(Self)
    }
}

/// Bind pdfium from the working directory first, then from the system.
fn bind() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|err| HeftwerkError::RenderBackendUnavailable(format!("{:?}", err)))?;
    Ok(Pdfium::new(bindings))
}

impl RenderBackend for PdfiumBackend {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len()))]
    fn rasterize(&self, pdf: &[u8], page_index: usize, viewport: &Viewport) -> Result<Surface> {
        let pdfium = bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| HeftwerkError::Render(format!("pdfium could not parse composite: {:?}", err)))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        if page_index >= total {
            return Err(HeftwerkError::PageOutOfRange {
                page: page_index + 1,
                total,
            });
        }

        let page = pages
            .get(page_index as u16)
            .map_err(|err| HeftwerkError::Render(format!("page {}: {:?}", page_index + 1, err)))?;

        // Pdfium applies the page's own /Rotate; the viewport only fixes the
        // pixel budget.
        let render_config = PdfRenderConfig::new()
            .set_target_width(viewport.width as i32)
            .set_maximum_height(viewport.height as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|err| HeftwerkError::Render(format!("page {}: {:?}", page_index + 1, err)))?;

        let image = bitmap.as_image().to_rgba8();
        debug!(
            page = page_index + 1,
            width = image.width(),
            height = image.height(),
            "Page rasterised"
        );
        Ok(Surface::new(image))
    }
}
