// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — rasterise composite pages for preview.
//
// A backend receives serialised PDF bytes, parses them itself, and draws one
// page into a `Surface` sized by a `Viewport`. The builder's in-memory
// document is never shared with a backend.

pub mod outline;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod preview;
pub mod surface;

use std::sync::Arc;

use heftwerk_core::config::RenderBackendKind;
use heftwerk_core::error::Result;
use heftwerk_core::types::{PageSize, Rotation};

pub use outline::OutlineBackend;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumBackend;
pub use preview::{PreviewRenderer, PreviewState};
pub use surface::Surface;

/// Pixel dimensions of a rendered page after zoom and rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    pub rotation: Rotation,
}

impl Viewport {
    /// Size a page of `size` points at `scale`, turned by `rotation`.
    pub fn new(size: PageSize, scale: f32, rotation: Rotation) -> Self {
        let displayed = size.rotated(rotation);
        let pixels = |points: f32| (points * scale).round().max(1.0) as u32;
        Self {
            width: pixels(displayed.width),
            height: pixels(displayed.height),
            scale,
            rotation,
        }
    }

    /// Shrink proportionally so neither edge exceeds `max_pixels`.
    ///
    /// Each edge stays at least one pixel, and `scale` is reduced to match.
    pub fn capped(self, max_pixels: u32) -> Self {
        let max_pixels = max_pixels.max(1);
        let longest = self.width.max(self.height);
        if longest <= max_pixels {
            return self;
        }
        let factor = max_pixels as f64 / longest as f64;
        let shrink = |pixels: u32| ((pixels as f64 * factor).round() as u32).clamp(1, max_pixels);
        Self {
            width: shrink(self.width),
            height: shrink(self.height),
            scale: (self.scale as f64 * factor) as f32,
            rotation: self.rotation,
        }
    }
}

/// A rendering service.
pub trait RenderBackend: Send + Sync {
    /// Short name for logs and `config` output.
    fn name(&self) -> &'static str;

    /// Parse `pdf` and draw the page at a 0-based index.
    fn rasterize(&self, pdf: &[u8], page_index: usize, viewport: &Viewport) -> Result<Surface>;
}

/// Construct the backend selected in the configuration.
pub fn backend_for(kind: RenderBackendKind) -> Result<Arc<dyn RenderBackend>> {
    match kind {
        RenderBackendKind::Outline => Ok(Arc::new(OutlineBackend)),
        #[cfg(feature = "pdfium")]
        RenderBackendKind::Pdfium => Ok(Arc::new(PdfiumBackend::new()?)),
        #[cfg(not(feature = "pdfium"))]
        RenderBackendKind::Pdfium => Err(heftwerk_core::HeftwerkError::RenderBackendUnavailable(
            "built without the `pdfium` feature".into(),
        )),
    }
}
