use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    is_typed_property, PROP_ADDRESS, PROP_BUILTIN_CREATE_DATE, PROP_CITY, PROP_COUNTRY,
    PROP_CREATE_DATE, PROP_INDUSTRY, PROP_OBJECT_ID, PROP_PHONE, PROP_RAW_EMAIL,
};
use crate::domain::failure::{FailureKind, RecordFailure};

/// A contact as fetched from the CRM, validated at the fetch boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContact {
    pub id: String,
    #[serde(default)]
    pub object_id: Option<String>,
    /// `"Display Name <email@domain>"` as typed into the CRM
    #[serde(default)]
    pub raw_email: Option<String>,
    /// Free-text locality: a country, a city, both, or noise
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Every other non-null property, passed through untouched
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl RawContact {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object_id: None,
            raw_email: None,
            country: None,
            city: None,
            phone: None,
            create_date: None,
            industry: None,
            address: None,
            extra: BTreeMap::new(),
        }
    }

    /// Build a contact from a CRM property bag.
    ///
    /// Blank values are treated as absent. A record whose `hs_object_id`
    /// disagrees with its id is rejected.
    pub fn from_properties(
        id: &str,
        properties: &BTreeMap<String, Option<String>>,
    ) -> std::result::Result<Self, RecordFailure> {
        let id = id.trim();
        if id.is_empty() {
            return Err(RecordFailure::new(
                "",
                FailureKind::InvalidRecord,
                "record has an empty id",
            ));
        }

        let prop = |name: &str| -> Option<String> {
            properties
                .get(name)
                .and_then(|v| v.as_deref())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let object_id = prop(PROP_OBJECT_ID);
        if let Some(object_id) = &object_id {
            if object_id != id {
                return Err(RecordFailure::new(
                    id,
                    FailureKind::InvalidRecord,
                    format!("{} '{}' does not match record id", PROP_OBJECT_ID, object_id),
                ));
            }
        }

        let create_date = match prop(PROP_CREATE_DATE).or_else(|| prop(PROP_BUILTIN_CREATE_DATE)) {
            Some(value) => {
                let parsed = parse_create_date(&value);
                if parsed.is_none() {
                    tracing::warn!(contact_id = %id, "Unparseable create date '{}'", value);
                }
                parsed
            }
            None => None,
        };

        let extra = properties
            .iter()
            .filter(|(name, _)| !is_typed_property(name))
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (name.clone(), v.to_string()))
            })
            .collect();

        Ok(Self {
            id: id.to_string(),
            object_id,
            raw_email: prop(PROP_RAW_EMAIL),
            country: prop(PROP_COUNTRY),
            city: prop(PROP_CITY),
            phone: prop(PROP_PHONE),
            create_date,
            industry: prop(PROP_INDUSTRY),
            address: prop(PROP_ADDRESS),
            extra,
        })
    }
}

/// Shortest digit string read as epoch milliseconds (September 2001 onward).
const MIN_EPOCH_MILLIS_DIGITS: usize = 10;

/// Parse the CRM's create date: RFC 3339, `YYYY-MM-DD`, `YYYYMMDD`, or epoch
/// milliseconds.
pub fn parse_create_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let all_digits = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    let day_format = if all_digits && value.len() == 8 { "%Y%m%d" } else { "%Y-%m-%d" };
    if let Ok(day) = NaiveDate::parse_from_str(value, day_format) {
        return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if all_digits && value.len() >= MIN_EPOCH_MILLIS_DIGITS {
        return value
            .parse::<i64>()
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }
    None
}

/// Country and optional city derived from a free-text locality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub country: String,
    /// Empty when the country was recognized directly
    pub city: String,
}

impl ResolvedLocation {
    pub fn country_only(country: impl Into<String>) -> Self {
        Self { country: country.into(), city: String::new() }
    }

    pub fn with_city(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self { country: country.into(), city: city.into() }
    }
}

/// A raw contact plus the fields derived from it, before deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedContact {
    pub raw: RawContact,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub phone_international: Option<String>,
}

impl EnrichedContact {
    pub fn unenriched(raw: RawContact) -> Self {
        Self {
            raw,
            email: None,
            display_name: None,
            country: None,
            city: None,
            phone_international: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.raw.id
    }

    pub fn create_date(&self) -> Option<DateTime<Utc>> {
        self.raw.create_date
    }

    /// Lower-cased email, the authoritative dedup key
    pub fn email_key(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase)
    }

    pub fn name_key(&self) -> Option<String> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    /// Copy every field absent here from `donor`. Populated fields are never
    /// overwritten. Identity and ordering data (id, object id, create date)
    /// always stay with the receiving record.
    pub fn backfill_from(&mut self, donor: &EnrichedContact) -> usize {
        let mut filled = 0;
        filled += fill(&mut self.email, &donor.email);
        filled += fill(&mut self.display_name, &donor.display_name);
        filled += fill(&mut self.country, &donor.country);
        filled += fill(&mut self.city, &donor.city);
        filled += fill(&mut self.phone_international, &donor.phone_international);

        let raw = &mut self.raw;
        filled += fill(&mut raw.raw_email, &donor.raw.raw_email);
        filled += fill(&mut raw.country, &donor.raw.country);
        filled += fill(&mut raw.city, &donor.raw.city);
        filled += fill(&mut raw.phone, &donor.raw.phone);
        filled += fill(&mut raw.industry, &donor.raw.industry);
        filled += fill(&mut raw.address, &donor.raw.address);
        for (name, value) in &donor.raw.extra {
            if !raw.extra.contains_key(name) {
                raw.extra.insert(name.clone(), value.clone());
                filled += 1;
            }
        }
        filled
    }
}

fn fill<T: Clone>(target: &mut Option<T>, source: &Option<T>) -> usize {
    match (target.is_none(), source) {
        (true, Some(value)) => {
            *target = Some(value.clone());
            1
        }
        _ => 0,
    }
}

/// The cleaned record handed to the persist interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContact {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub phone_international: Option<String>,
    pub create_date: Option<DateTime<Utc>>,
    /// Deduplicated industries joined with `;`
    pub industry: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl NormalizedContact {
    /// Turn a cleaned record back into pipeline input.
    pub fn to_raw(&self) -> RawContact {
        let raw_email = match (&self.display_name, &self.email) {
            (Some(name), Some(email)) => Some(format!("{} <{}>", name, email)),
            (None, Some(email)) => Some(format!("<{}>", email)),
            (Some(name), None) => Some(format!("{} <>", name)),
            (None, None) => None,
        };
        RawContact {
            id: self.id.clone(),
            object_id: Some(self.id.clone()),
            raw_email,
            country: self.country.clone(),
            city: self.city.clone(),
            phone: self.phone_international.clone(),
            create_date: self.create_date,
            industry: self.industry.clone(),
            address: self.address.clone(),
            extra: self.extra.clone(),
        }
    }
}
