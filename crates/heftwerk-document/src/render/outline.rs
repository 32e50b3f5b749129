// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outline renderer — a pure-Rust backend that draws each page as a sheet with
// a border and a heading bar along its top edge.
//
// It does not interpret content streams. It does parse the bytes it is given
// and checks the requested page exists, so a preview never shows a page the
// composite does not have.

use heftwerk_core::error::{HeftwerkError, Result};
use image::Rgba;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::{debug, instrument};

use super::{RenderBackend, Surface, Viewport};
use crate::pdf::reader::PdfReader;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BORDER: Rgba<u8> = Rgba([96, 96, 96, 255]);
const HEADING: Rgba<u8> = Rgba([70, 130, 180, 255]);

/// Built-in page outline renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineBackend;

impl RenderBackend for OutlineBackend {
    fn name(&self) -> &'static str {
        "outline"
    }

    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len()))]
    fn rasterize(&self, pdf: &[u8], page_index: usize, viewport: &Viewport) -> Result<Surface> {
        let reader = PdfReader::from_bytes("composite", pdf)?;
        let total = reader.page_count();
        if page_index >= total {
            return Err(HeftwerkError::PageOutOfRange {
                page: page_index + 1,
                total,
            });
        }

        let (width, height) = (viewport.width, viewport.height);
        let mut surface = Surface::filled(width, height, PAPER);
        let image = surface.image_mut();

        draw_hollow_rect_mut(image, Rect::at(0, 0).of_size(width, height), BORDER);

        // The heading bar marks where the page's own top edge ends up once
        // /Rotate (clockwise) is applied.
        // Never wider than the sheet itself, which can be a single pixel.
        let band = (width.min(height) / 20).max(2).min(width).min(height);
        let heading = match viewport.rotation.degrees() {
            90 => Rect::at(width.saturating_sub(band) as i32, 0).of_size(band, height),
            180 => Rect::at(0, height.saturating_sub(band) as i32).of_size(width, band),
            270 => Rect::at(0, 0).of_size(band, height),
            _ => Rect::at(0, 0).of_size(width, band),
        };
        draw_filled_rect_mut(image, heading, HEADING);

        debug!(page = page_index + 1, width, height, "Outline rendered");
        Ok(surface)
    }
}
