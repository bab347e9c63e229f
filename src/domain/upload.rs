use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::{
    OUT_CITY, OUT_COUNTRY, OUT_EMAIL, OUT_ORIGINAL_CREATE_DATE, OUT_ORIGINAL_INDUSTRY, OUT_PHONE,
    OUT_TEMPORARY_ID,
};
use crate::domain::contact::NormalizedContact;
use crate::error::PersistError;

/// Body of a contact create call: `{"properties": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadPayload {
    pub properties: BTreeMap<&'static str, String>,
}

impl UploadPayload {
    /// Every target property is required. City may be empty when the
    /// country was recognized directly.
    pub fn from_contact(contact: &NormalizedContact) -> Result<Self, PersistError> {
        let required = |value: &Option<String>, field: &'static str| {
            value.clone().ok_or(PersistError::MissingField(field))
        };

        let create_date = contact
            .create_date
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .ok_or(PersistError::MissingField(OUT_ORIGINAL_CREATE_DATE))?;

        let mut properties = BTreeMap::new();
        properties.insert(OUT_EMAIL, required(&contact.email, OUT_EMAIL)?);
        properties.insert(OUT_PHONE, required(&contact.phone_international, OUT_PHONE)?);
        properties.insert(OUT_COUNTRY, required(&contact.country, OUT_COUNTRY)?);
        properties.insert(OUT_CITY, required(&contact.city, OUT_CITY)?);
        properties.insert(OUT_ORIGINAL_CREATE_DATE, create_date);
        properties.insert(OUT_ORIGINAL_INDUSTRY, required(&contact.industry, OUT_ORIGINAL_INDUSTRY)?);
        properties.insert(OUT_TEMPORARY_ID, contact.id.clone());

        Ok(Self { properties })
    }
}
