//! Domain types for describing a converted presentation.

use serde::{Deserialize, Serialize};

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected only to reject it clearly.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }

    /// Whether this format can be converted.
    pub fn is_convertible(self) -> bool {
        matches!(self, Self::Pptx)
    }
}

/// Which kind of presentation part a report entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Slide,
    Notes,
}

/// Where a run sits inside its slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLocation {
    /// A run in a shape's text frame.
    TextFrame,
    /// A run in a table cell.
    TableCell,
}

/// A run's text color, either direct RGB or a theme reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunColor {
    /// Six uppercase hex digits, e.g. `FF0000`.
    Rgb(String),
    /// A theme color name, e.g. `accent1`.
    Theme(String),
}

/// Character formatting carried by a run.
///
/// Every field is optional: absent means inherited from the paragraph,
/// shape or theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFormat {
    /// Latin font family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// Size in hundredths of a point (2400 is 24pt).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,

    /// Underline style, e.g. `sng` or `none`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<RunColor>,
}

impl RunFormat {
    /// Size in points, if set.
    pub fn size_pt(&self) -> Option<f64> {
        self.size.map(|size| f64::from(size) / 100.0)
    }
}

/// One converted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub location: RunLocation,
    pub format: RunFormat,
    pub original: String,
    pub converted: String,
}

impl RunRecord {
    /// Whether conversion changed the run's text.
    pub fn changed(&self) -> bool {
        self.original != self.converted
    }

    /// Whether the run has any non-whitespace text.
    pub fn has_visible_text(&self) -> bool {
        !self.original.trim().is_empty()
    }
}

/// The result of converting one slide or notes part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartReport {
    pub kind: PartKind,

    /// 1-based number (presentation order for slides).
    pub number: usize,

    /// Path of the part inside the container.
    pub path: String,

    /// Converted runs in document order.
    pub runs: Vec<RunRecord>,
}

impl PartReport {
    /// Create an empty report for a part.
    pub fn new(kind: PartKind, number: usize, path: impl Into<String>) -> Self {
        Self {
            kind,
            number,
            path: path.into(),
            runs: Vec::new(),
        }
    }

    /// Runs with visible text, the count the conversion summary reports.
    pub fn text_elements(&self) -> usize {
        self.runs.iter().filter(|r| r.has_visible_text()).count()
    }

    /// Runs whose text changed.
    pub fn changed_runs(&self) -> usize {
        self.runs.iter().filter(|r| r.changed()).count()
    }

    /// Runs inside table cells.
    pub fn table_runs(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.location == RunLocation::TableCell)
            .count()
    }
}

/// Summary of a whole presentation conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Original filename (without path).
    pub filename: String,

    /// Converted parts, slides first in presentation order, then notes.
    pub parts: Vec<PartReport>,
}

impl ConversionReport {
    /// Create an empty report.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            parts: Vec::new(),
        }
    }

    /// Add a part report.
    pub fn add_part(&mut self, part: PartReport) {
        self.parts.push(part);
    }

    /// Sort parts into slides-then-notes, each by number.
    pub fn sort_parts(&mut self) {
        self.parts.sort_by_key(|p| (p.kind, p.number));
    }

    /// Number of slides processed.
    pub fn slides_processed(&self) -> usize {
        self.parts.iter().filter(|p| p.kind == PartKind::Slide).count()
    }

    /// Number of notes pages processed.
    pub fn notes_processed(&self) -> usize {
        self.parts.iter().filter(|p| p.kind == PartKind::Notes).count()
    }

    /// Runs with visible text across all parts.
    pub fn text_elements_converted(&self) -> usize {
        self.parts.iter().map(PartReport::text_elements).sum()
    }

    /// Runs whose text changed across all parts.
    pub fn runs_changed(&self) -> usize {
        self.parts.iter().map(PartReport::changed_runs).sum()
    }
}
