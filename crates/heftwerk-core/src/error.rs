// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Heftwerk.

use thiserror::Error;

/// Top-level error type for all Heftwerk operations.
#[derive(Debug, Error)]
pub enum HeftwerkError {
    // -- Input errors --
    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("cannot read {name}: {detail}")]
    CorruptDocument { name: String, detail: String },

    // -- Assembly errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("nothing to export: the page list is empty")]
    EmptyExport,

    #[error("page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    #[error("unknown source document: {0}")]
    UnknownSource(String),

    #[error("rotation must be a multiple of 90, got {0}")]
    InvalidRotation(i32),

    // -- Rendering --
    #[error("rendering failed: {0}")]
    Render(String),

    #[error("render backend unavailable: {0}")]
    RenderBackendUnavailable(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Runtime --
    #[error("background task failed: {0}")]
    Task(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HeftwerkError>;
