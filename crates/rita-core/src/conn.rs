//! Connection records
//!
//! A [`ConnRecord`] is one logged network flow between two endpoints. The
//! report pipeline only reads records; it never mutates them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One recorded connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnRecord {
    /// Source address (IP literal, not validated)
    pub src: String,
    /// Source port
    pub spt: i64,
    /// Destination address
    pub dst: String,
    /// Destination port
    pub dpt: i64,
    /// Duration in seconds
    pub dur: f64,
    /// Protocol token, e.g. `tcp`
    pub proto: String,
}

impl ConnRecord {
    #[must_use]
    pub fn new(
        src: impl Into<String>,
        spt: i64,
        dst: impl Into<String>,
        dpt: i64,
        dur: f64,
        proto: impl Into<String>,
    ) -> Self {
        Self {
            src: src.into(),
            spt,
            dst: dst.into(),
            dpt,
            dur,
            proto: proto.into(),
        }
    }

    /// Default text for a field: integers and the duration use their
    /// standard `Display` form (`120.5`, `5`).
    #[must_use]
    pub fn field_text(&self, field: ConnField) -> String {
        match field {
            ConnField::Src => self.src.clone(),
            ConnField::Spt => self.spt.to_string(),
            ConnField::Dst => self.dst.clone(),
            ConnField::Dpt => self.dpt.to_string(),
            ConnField::Dur => self.dur.to_string(),
            ConnField::Proto => self.proto.clone(),
        }
    }
}

/// Fields of a connection record, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnField {
    Src,
    Spt,
    Dst,
    Dpt,
    Dur,
    Proto,
}

impl ConnField {
    /// All fields in the fixed report order
    pub const ALL: [Self; 6] = [
        Self::Src,
        Self::Spt,
        Self::Dst,
        Self::Dpt,
        Self::Dur,
        Self::Proto,
    ];

    /// Short field name used in templates
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Src => "src",
            Self::Spt => "spt",
            Self::Dst => "dst",
            Self::Dpt => "dpt",
            Self::Dur => "dur",
            Self::Proto => "proto",
        }
    }

    /// Storage column name
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Dur => "duration",
            other => other.name(),
        }
    }

    /// Table header label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Src => "Source IP",
            Self::Spt => "Source Port",
            Self::Dst => "Destination IP",
            Self::Dpt => "Destination Port",
            Self::Dur => "Duration",
            Self::Proto => "Protocol",
        }
    }

    /// Whether the field holds a number
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Spt | Self::Dpt | Self::Dur)
    }

    /// Look up a field by template name or column name (case-insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.name() == name || field.column() == name)
    }

    /// Compare two records by this field
    #[must_use]
    pub fn compare(self, a: &ConnRecord, b: &ConnRecord) -> Ordering {
        match self {
            Self::Src => a.src.cmp(&b.src),
            Self::Spt => a.spt.cmp(&b.spt),
            Self::Dst => a.dst.cmp(&b.dst),
            Self::Dpt => a.dpt.cmp(&b.dpt),
            Self::Dur => a.dur.total_cmp(&b.dur),
            Self::Proto => a.proto.cmp(&b.proto),
        }
    }
}

impl fmt::Display for ConnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check that records are ordered longest first
#[must_use]
pub fn is_duration_descending(records: &[ConnRecord]) -> bool {
    records.windows(2).all(|pair| pair[0].dur >= pair[1].dur)
}
