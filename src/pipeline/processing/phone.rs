//! International phone formatting.
//!
//! Numbers are parsed under the dialing rules of the contact's resolved
//! country and rendered as `(+CC) rest`, e.g. `(+33) 6 12 34 56 78`.

use once_cell::sync::Lazy;
use phonenumber::country;
use phonenumber::Mode;
use regex::Regex;
use std::marker::PhantomData;
use thiserror::Error;

use crate::domain::RecordSet;
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::gazetteer::Gazetteer;

static DISPLAY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(\+(\d+)\)").expect("static regex"));

static INTERNATIONAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+([0-9]+)").expect("static regex"));

/// Why a phone was left blank
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneSkip {
    #[error("country '{0}' has no dialing region")]
    UnmappedCountry(String),

    #[error("cannot parse '{phone}': {reason}")]
    Unparseable { phone: String, reason: String },
}

/// Phone normalizer bound to a fetched record set.
///
/// It can only be built once contacts have been materialized, so normalizing
/// before the fetch is a type error rather than a runtime flag check.
#[derive(Debug)]
pub struct PhoneNormalizer<'a> {
    gazetteer: &'static Gazetteer,
    _records: PhantomData<&'a RecordSet>,
}

impl<'a> PhoneNormalizer<'a> {
    pub fn for_records(records: &'a RecordSet) -> Result<Self> {
        if records.is_empty() {
            return Err(PipelineError::MissingPrerequisite(
                "phone normalization needs a fetched, non-empty record set".to_string(),
            ));
        }
        Ok(Self {
            gazetteer: Gazetteer::global(),
            _records: PhantomData,
        })
    }

    /// `Ok(None)` when there is nothing to normalize: no phone or no country.
    pub fn normalize(
        &self,
        phone: Option<&str>,
        country: Option<&str>,
    ) -> std::result::Result<Option<String>, PhoneSkip> {
        let phone = match phone.map(str::trim).filter(|p| !p.is_empty()) {
            Some(phone) => phone,
            None => return Ok(None),
        };
        let country = match country.map(str::trim).filter(|c| !c.is_empty()) {
            Some(country) => country,
            None => return Ok(None),
        };

        let region = self
            .region_for(country)
            .ok_or_else(|| PhoneSkip::UnmappedCountry(country.to_string()))?;

        let unwrapped = DISPLAY_PREFIX.replace(phone, "+$1");
        let number = phonenumber::parse(Some(region), unwrapped.as_ref()).map_err(|e| {
            PhoneSkip::Unparseable {
                phone: phone.to_string(),
                reason: e.to_string(),
            }
        })?;
        if !phonenumber::is_valid(&number) {
            return Err(PhoneSkip::Unparseable {
                phone: phone.to_string(),
                reason: format!("not a valid number for {}", country),
            });
        }

        let international = number.format().mode(Mode::International).to_string();
        Ok(Some(INTERNATIONAL_PREFIX.replace(&international, "(+$1)").into_owned()))
    }

    fn region_for(&self, country: &str) -> Option<country::Id> {
        let entry = self.gazetteer.country_by_name(country)?;
        entry.alpha2.parse::<country::Id>().ok()
    }
}
