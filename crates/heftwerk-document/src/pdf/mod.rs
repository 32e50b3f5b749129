// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — source loading, page copying, and composite assembly.

pub mod composite;
pub mod reader;
pub mod source;
pub mod writer;

pub use composite::{Composite, CompositeBuilder};
pub use reader::PdfReader;
pub use source::{SourceDocument, SourceLibrary};
pub use writer::PdfWriter;
