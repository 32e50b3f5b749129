// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HeftwerkError, Result};
use crate::types::Rotation;

/// Longest edge, in pixels, of a preview surface unless configured otherwise.
pub const DEFAULT_MAX_PREVIEW_PIXELS: u32 = 4096;

/// Which rendering service draws preview surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderBackendKind {
    /// Built-in page outline renderer (always available).
    #[default]
    Outline,
    /// Full rasterisation through pdfium (requires the `pdfium` feature).
    Pdfium,
}

impl std::str::FromStr for RenderBackendKind {
    type Err = HeftwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "outline" => Ok(Self::Outline),
            "pdfium" => Ok(Self::Pdfium),
            other => Err(HeftwerkError::InvalidConfig(format!(
                "unknown render backend '{other}' (expected outline or pdfium)"
            ))),
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial rotation for pages wider than tall. `None` leaves them upright.
    pub landscape_rotation: Option<Rotation>,
    /// Zoom factor applied when rasterising preview pages.
    pub preview_scale: f32,
    /// Upper bound on either edge of a preview surface. Pages that would
    /// exceed it at `preview_scale` are drawn smaller.
    pub max_preview_pixels: u32,
    /// File name used when exporting into a directory.
    pub export_file_name: String,
    /// Rendering service for previews.
    pub render_backend: RenderBackendKind,
    /// Producer string written to the exported document's /Info.
    pub producer: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            landscape_rotation: Some(Rotation::THREE_QUARTERS),
            preview_scale: 1.5,
            max_preview_pixels: DEFAULT_MAX_PREVIEW_PIXELS,
            export_file_name: "merged.pdf".into(),
            render_backend: RenderBackendKind::Outline,
            producer: concat!("Heftwerk ", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl AppConfig {
    /// Reject settings the renderer or exporter cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.preview_scale.is_finite() && self.preview_scale > 0.0) {
            return Err(HeftwerkError::InvalidConfig(format!(
                "preview scale must be positive, got {}",
                self.preview_scale
            )));
        }
        if self.max_preview_pixels == 0 {
            return Err(HeftwerkError::InvalidConfig(
                "max preview pixels must be at least 1".into(),
            ));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(HeftwerkError::InvalidConfig(
                "export file name must not be empty".into(),
            ));
        }
        Ok(())
    }
}
