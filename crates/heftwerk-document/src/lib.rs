// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// heftwerk-document — PDF handling for the Heftwerk page merger.
//
// Provides source loading, page copying into a fresh composite document, and
// page rasterisation for preview (built-in outline renderer, optional pdfium).

pub mod pdf;
pub mod render;

// Re-export the primary structs so callers can use `heftwerk_document::Composite` etc.
pub use pdf::composite::{Composite, CompositeBuilder};
pub use pdf::reader::PdfReader;
pub use pdf::source::{SourceDocument, SourceLibrary};
pub use pdf::writer::PdfWriter;
pub use render::{OutlineBackend, PreviewRenderer, PreviewState, RenderBackend, Surface, Viewport, backend_for};
