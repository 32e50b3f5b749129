// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Heftwerk: source identity, rotation, page geometry,
// and the per-page manifest entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HeftwerkError, Result};

/// Unique identifier for a selected source document.
///
/// Assigned once at selection time. Two uploads that share a file name still
/// get distinct ids, so entry identity never collides on names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub Uuid);

impl SourceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source document as seen by a manifest entry: identity plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: SourceId,
    /// File name as selected by the user. Display only.
    pub name: String,
}

/// Identity of one manifest entry: which source, which page of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId {
    pub source: SourceId,
    /// 0-based page index within the source document.
    pub page_index: usize,
}

impl EntryId {
    pub fn new(source: SourceId, page_index: usize) -> Self {
        Self { source, page_index }
    }
}

/// Page rotation in degrees, always one of 0, 90, 180, 270.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u16")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);
    pub const QUARTER: Rotation = Rotation(90);
    pub const HALF: Rotation = Rotation(180);
    pub const THREE_QUARTERS: Rotation = Rotation(270);

    /// Normalise an arbitrary multiple of 90 into `[0, 360)`.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(HeftwerkError::InvalidRotation(degrees));
        }
        Ok(Self(degrees.rem_euclid(360) as u16))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    /// Apply a relative turn. `delta` must be a multiple of 90.
    pub fn rotated_by(self, delta: i32) -> Result<Self> {
        if delta % 90 != 0 {
            return Err(HeftwerkError::InvalidRotation(delta));
        }
        Ok(Self((i32::from(self.0) + delta).rem_euclid(360) as u16))
    }

    /// True for 90 and 270, where the displayed width and height swap.
    pub fn is_quarter_turn(self) -> bool {
        self.0 % 180 == 90
    }
}

impl TryFrom<i32> for Rotation {
    type Error = HeftwerkError;

    fn try_from(degrees: i32) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        rotation.0
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// The size as displayed after `rotation` is applied.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        if rotation.is_quarter_turn() {
            Self::new(self.height, self.width)
        } else {
            *self
        }
    }
}

/// One page destined for the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub source: SourceRef,
    /// 0-based page index within the source document.
    pub source_page_index: usize,
    /// 1-based position in the output. Maintained by the manifest.
    pub display_number: usize,
    pub rotation: Rotation,
    /// MediaBox size captured at selection time; reapplied on every rebuild.
    pub original_size: PageSize,
}

impl PageEntry {
    /// Create an entry, picking the initial rotation from `landscape_rotation`
    /// when the page is wider than tall.
    pub fn new(
        source: SourceRef,
        source_page_index: usize,
        original_size: PageSize,
        landscape_rotation: Option<Rotation>,
    ) -> Self {
        let rotation = match landscape_rotation {
            Some(rotation) if original_size.is_landscape() => rotation,
            _ => Rotation::NONE,
        };
        Self {
            source,
            source_page_index,
            display_number: 0,
            rotation,
            original_size,
        }
    }

    pub fn id(&self) -> EntryId {
        EntryId::new(self.source.id, self.source_page_index)
    }

    /// Row label shown in page lists, e.g. `report.pdf - page 3`.
    pub fn label(&self) -> String {
        format!("{} - page {}", self.source.name, self.source_page_index + 1)
    }
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
}

impl DocumentType {
    /// MIME type string.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
        }
    }

    /// Standard file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
        }
    }

    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Self::Pdf]
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }

    /// Identify a selected file from its name and leading bytes.
    ///
    /// A known extension must agree with the content; a name with no
    /// extension is judged on content alone.
    pub fn detect(name: &str, bytes: &[u8]) -> Option<Self> {
        let by_content = bytes.starts_with(b"%PDF-").then_some(Self::Pdf);
        match std::path::Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext).filter(|t| Some(*t) == by_content),
            None => by_content,
        }
    }
}
