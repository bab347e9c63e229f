use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of per-record failures. None of them abort a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    /// Rejected at the fetch boundary
    InvalidRecord,
    /// No country or city recognized in the locality text
    ResolutionAmbiguous,
    /// City lookup failed or returned nothing
    GeocodeFailure,
    /// Unmappable country or malformed number
    PhoneParseError,
    /// Neither an email nor a display name could be extracted
    MissingIdentity,
    /// Upload of the cleaned record failed
    PersistError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidRecord => "invalid_record",
            FailureKind::ResolutionAmbiguous => "resolution_ambiguous",
            FailureKind::GeocodeFailure => "geocode_failure",
            FailureKind::PhoneParseError => "phone_parse_error",
            FailureKind::MissingIdentity => "missing_identity",
            FailureKind::PersistError => "persist_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub contact_id: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl RecordFailure {
    pub fn new(contact_id: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            contact_id: contact_id.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] contact {}: {}", self.kind, self.contact_id, self.detail)
    }
}
