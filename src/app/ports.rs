use async_trait::async_trait;

use crate::config::HubspotConfig;
use crate::domain::{NormalizedContact, RawContact, RecordFailure};
use crate::error::PersistError;

// Fetch-side ports

/// Which contacts are eligible, and how many to ask for per page
#[derive(Clone, Debug)]
pub struct FetchCriteria {
    pub filter_property: String,
    pub filter_value: String,
    pub page_size: u32,
}

impl From<&HubspotConfig> for FetchCriteria {
    fn from(config: &HubspotConfig) -> Self {
        Self {
            filter_property: config.filter_property.clone(),
            filter_value: config.filter_value.clone(),
            page_size: config.page_size,
        }
    }
}

/// One page of search results plus the opaque cursor for the next one
#[derive(Clone, Debug, Default)]
pub struct ContactPage {
    pub contacts: Vec<RawContact>,
    pub rejected: Vec<RecordFailure>,
    /// `None` signals the end of results
    pub next_after: Option<String>,
}

#[async_trait]
pub trait ContactSourcePort: Send + Sync {
    async fn fetch_page(&self, criteria: &FetchCriteria, after: Option<&str>) -> Result<ContactPage, String>;
}

// Persist-side ports

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ack {
    pub contact_id: String,
    /// Id assigned by the target system, when it reports one
    pub remote_id: Option<String>,
}

#[async_trait]
pub trait ContactSinkPort: Send + Sync {
    async fn persist(&self, contact: &NormalizedContact) -> Result<Ack, PersistError>;
}

// Geocoding port

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeocodedPlace {
    pub display_name: String,
    /// ISO 3166-1 alpha-2, any case
    pub country_code: Option<String>,
}

#[async_trait]
pub trait GeocoderPort: Send + Sync {
    /// `Ok(None)` when the provider has no result for `query`
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedPlace>, String>;
}
