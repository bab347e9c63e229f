use chrono::{DateTime, Utc};

use crate::domain::contact::RawContact;
use crate::domain::failure::RecordFailure;

/// The materialized result of a fetch.
///
/// Only fetch code (or a file loader standing in for it) builds one, so holding
/// a `RecordSet` means retrieval has completed.
#[derive(Debug, Clone)]
pub struct RecordSet {
    contacts: Vec<RawContact>,
    rejected: Vec<RecordFailure>,
    pages: usize,
    fetched_at: DateTime<Utc>,
    interrupted_by: Option<String>,
}

impl RecordSet {
    pub fn materialized(
        contacts: Vec<RawContact>,
        rejected: Vec<RecordFailure>,
        pages: usize,
        interrupted_by: Option<String>,
    ) -> Self {
        Self {
            contacts,
            rejected,
            pages,
            fetched_at: Utc::now(),
            interrupted_by,
        }
    }

    /// A complete, single-page set. Convenient for file input and tests.
    pub fn from_contacts(contacts: Vec<RawContact>) -> Self {
        Self::materialized(contacts, Vec::new(), 1, None)
    }

    pub fn contacts(&self) -> &[RawContact] {
        &self.contacts
    }

    pub fn rejected(&self) -> &[RecordFailure] {
        &self.rejected
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// The fetch error that stopped pagination early, if any
    pub fn interrupted_by(&self) -> Option<&str> {
        self.interrupted_by.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.interrupted_by.is_none()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
