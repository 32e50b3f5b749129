// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing notices.
//
// Every error surfaced by a command is mapped to a short message plus a
// suggestion. Nothing here is fatal: the caller shows the notice and keeps
// accepting commands.

use crate::error::HeftwerkError;
use crate::types::DocumentType;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// One input was skipped; the rest of the operation went ahead.
    Skipped,
    /// The user must do something before trying again.
    ActionRequired,
    /// Retrying the same thing will fail the same way.
    Permanent,
}

/// A plain-language notice with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct Notice {
    /// One-line summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Notice shown when a selected file is not a PDF.
pub fn rejected_file(name: &str) -> Notice {
    Notice {
        message: format!("{name} is not a PDF file and will be skipped."),
        suggestion: format!(
            "Only PDF documents ({}) can be combined.",
            DocumentType::Pdf.mime_type()
        ),
        severity: Severity::Skipped,
    }
}

/// Convert a `HeftwerkError` into a `Notice`.
pub fn humanize_error(err: &HeftwerkError) -> Notice {
    match err {
        HeftwerkError::UnsupportedFormat(name) => rejected_file(name),

        HeftwerkError::CorruptDocument { name, .. } => Notice {
            message: format!("{name} could not be opened."),
            suggestion: "The file may be damaged or password-protected. Try re-saving it as a PDF."
                .into(),
            severity: Severity::Skipped,
        },

        HeftwerkError::EmptyExport => Notice {
            message: "There are no pages to save.".into(),
            suggestion: "Add at least one PDF file first.".into(),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::PageOutOfRange { page, total } => Notice {
            message: format!("There is no page {page}."),
            suggestion: format!("Pick a page between 1 and {total}."),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::InvalidRotation(degrees) => Notice {
            message: format!("Pages can't be turned by {degrees} degrees."),
            suggestion: "Turn pages a quarter at a time (90 degrees).".into(),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::UnknownSource(detail) | HeftwerkError::PdfError(detail) => Notice {
            message: "The combined document could not be built.".into(),
            suggestion: format!("Remove the last added file and try again. ({detail})"),
            severity: Severity::Permanent,
        },

        HeftwerkError::Render(detail) => Notice {
            message: "The preview could not be drawn.".into(),
            suggestion: format!("The document can still be exported. ({detail})"),
            severity: Severity::Permanent,
        },

        HeftwerkError::RenderBackendUnavailable(detail) => Notice {
            message: "The selected preview renderer isn't available.".into(),
            suggestion: format!("Switch to the outline renderer with --backend outline. ({detail})"),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::InvalidConfig(detail) => Notice {
            message: "A setting is invalid.".into(),
            suggestion: format!("Fix the configuration and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::Io(io) => Notice {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check that the path exists and is writable. ({io})"),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::Serialization(detail) => Notice {
            message: "The settings file could not be read.".into(),
            suggestion: format!("Delete it to restore defaults. ({detail})"),
            severity: Severity::ActionRequired,
        },

        HeftwerkError::Task(detail) => Notice {
            message: "A background job stopped unexpectedly.".into(),
            suggestion: format!("Repeat the last action. ({detail})"),
            severity: Severity::Permanent,
        },
    }
}
