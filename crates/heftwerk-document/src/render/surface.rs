// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render surface — the RGBA raster a backend draws a page into.

use std::path::Path;

use heftwerk_core::error::{HeftwerkError, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::info;

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// A surface filled with a single colour.
    pub fn filled(width: u32, height: u32, colour: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, colour))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Encode the surface as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| HeftwerkError::Render(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the surface to a PNG file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_png_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote preview to {}", path.as_ref().display());
        Ok(())
    }
}
