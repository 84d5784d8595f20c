//! Lead records and the raw rows they are extracted from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known source column names.
pub mod columns {
    pub const ID: &str = "ID";
    pub const NAME: &str = "Name";
    pub const PHONE: &str = "Phone";
    pub const EMAIL: &str = "Email";
    pub const INTEREST: &str = "Interest";
    pub const STATUS: &str = "Status";
    pub const NOTES: &str = "Notes";
    pub const LAST_UPDATED: &str = "Last Updated";
}

/// Stable lead identifier.
///
/// Either the source's `ID` column or, when that cell is empty, the sheet
/// row number. Serializes untagged, so a ledger file holds a mix of JSON
/// strings and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadId {
    /// Positional fallback: the 1-based sheet row number.
    Row(u64),
    /// Caller-supplied identifier from the `ID` column.
    Text(String),
}

impl LeadId {
    /// Whether this id fell back to row position.
    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Row(_))
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Row(n) => write!(f, "row:{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Contact status mirrored into the source's `Status` column.
///
/// Advisory only: the ledger decides whether a lead was already sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    /// Not yet attempted (also used for an empty cell).
    New,
    /// A send is in flight.
    Processing,
    /// Message was delivered to the transport.
    Contacted,
    /// The transport rejected the send.
    Failed,
}

impl LeadStatus {
    /// Cell text written back to the source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Processing => "Processing",
            Self::Contacted => "Contacted",
            Self::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "New" => Ok(Self::New),
            "Processing" => Ok(Self::Processing),
            "Contacted" => Ok(Self::Contacted),
            "Failed" => Ok(Self::Failed),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}

/// Opaque back-reference to the originating source row.
///
/// Only the source store interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRef(u64);

impl RowRef {
    pub fn new(row_number: u64) -> Self {
        Self(row_number)
    }

    /// 1-based row number in the source sheet.
    pub fn row_number(&self) -> u64 {
        self.0
    }
}

/// A raw source row keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub row_number: u64,
    pub cells: HashMap<String, String>,
}

impl Row {
    pub fn new(row_number: u64) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    /// Builder-style cell setter, mostly for fixtures.
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    /// Trimmed cell value; `None` for a missing or blank cell.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn source_ref(&self) -> RowRef {
        RowRef::new(self.row_number)
    }
}

/// A candidate contact extracted from the source.
#[derive(Debug, Clone)]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    pub phone: String,
    /// Carried through from the source; dispatch does not use it.
    pub email: Option<String>,
    pub interest: Option<String>,
    pub status: LeadStatus,
    pub source_ref: RowRef,
}

impl Lead {
    /// Normalize a raw row. Returns `None` when the `Status` cell holds text
    /// that is not a known status.
    pub fn from_row(row: &Row) -> Option<Self> {
        let status = row
            .get(columns::STATUS)
            .unwrap_or("")
            .parse::<LeadStatus>()
            .ok()?;

        let id = row
            .get(columns::ID)
            .map(LeadId::from)
            .unwrap_or(LeadId::Row(row.row_number));

        Some(Self {
            id,
            name: row.get(columns::NAME).unwrap_or_default().to_string(),
            phone: row.get(columns::PHONE).unwrap_or_default().to_string(),
            email: row.get(columns::EMAIL).map(str::to_string),
            interest: row.get(columns::INTEREST).map(str::to_string),
            status,
            source_ref: row.source_ref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_row_uses_id_column() {
        let row = Row::new(4)
            .with(columns::ID, "A-17")
            .with(columns::NAME, " Ann ")
            .with(columns::PHONE, "+15550000001")
            .with(columns::INTEREST, "solar panels");

        let lead = Lead::from_row(&row).unwrap();
        assert_eq!(lead.id, LeadId::Text("A-17".into()));
        assert_eq!(lead.name, "Ann");
        assert_eq!(lead.interest.as_deref(), Some("solar panels"));
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.source_ref.row_number(), 4);
    }

    #[test]
    fn from_row_falls_back_to_row_number() {
        let row = Row::new(9).with(columns::ID, "  ").with(columns::NAME, "Bo");
        let lead = Lead::from_row(&row).unwrap();
        assert_eq!(lead.id, LeadId::Row(9));
        assert!(lead.id.is_positional());
        assert!(lead.interest.is_none());
        assert!(lead.email.is_none());
    }

    #[test]
    fn from_row_unknown_status_is_skipped() {
        let row = Row::new(2).with(columns::STATUS, "Do not call");
        assert!(Lead::from_row(&row).is_none());
    }

    #[test]
    fn status_parse_and_display() {
        assert_eq!("".parse::<LeadStatus>().unwrap(), LeadStatus::New);
        assert_eq!(" New ".parse::<LeadStatus>().unwrap(), LeadStatus::New);
        assert_eq!(
            "Contacted".parse::<LeadStatus>().unwrap(),
            LeadStatus::Contacted
        );
        assert!("contacted".parse::<LeadStatus>().is_err());
        assert_eq!(LeadStatus::Failed.to_string(), "Failed");
    }

    #[test]
    fn lead_id_serializes_untagged() {
        let ids = vec![LeadId::from("A"), LeadId::Row(7)];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, r#"["A",7]"#);

        let back: Vec<LeadId> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ids);
    }
}
