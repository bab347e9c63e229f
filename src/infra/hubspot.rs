//! HubSpot CRM v3 adapter: contact search with cursor pagination, and
//! contact creation for upload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::ports::{Ack, ContactPage, ContactSinkPort, ContactSourcePort, FetchCriteria};
use crate::config::HubspotConfig;
use crate::constants::search_properties;
use crate::domain::{NormalizedContact, RawContact, UploadPayload};
use crate::error::{PersistError, PipelineError, Result};

const SEARCH_PATH: &str = "/crm/v3/objects/contacts/search";
const CREATE_PATH: &str = "/crm/v3/objects/contacts";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    filter_groups: Vec<FilterGroup<'a>>,
    properties: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct FilterGroup<'a> {
    filters: Vec<Filter<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter<'a> {
    property_name: &'a str,
    operator: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ContactObject>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
pub struct NextPage {
    pub after: String,
}

/// A CRM object as returned by search: an id plus a loose property bag.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactObject {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl ContactObject {
    /// Validate into a `RawContact`; non-string property values are kept in
    /// their JSON text form.
    pub fn into_raw(self) -> std::result::Result<RawContact, crate::domain::RecordFailure> {
        let properties: BTreeMap<String, Option<String>> = self
            .properties
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                };
                (name, value)
            })
            .collect();
        RawContact::from_properties(&self.id, &properties)
    }
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id {}", other))),
    }
}

/// Split a search page into accepted contacts and boundary rejects.
pub fn page_from_response(response: SearchResponse) -> ContactPage {
    let mut page = ContactPage {
        next_after: response.paging.and_then(|p| p.next).map(|n| n.after),
        ..ContactPage::default()
    };
    for object in response.results {
        match object.into_raw() {
            Ok(contact) => page.contacts.push(contact),
            Err(failure) => {
                warn!("Rejected record at fetch boundary: {}", failure);
                page.rejected.push(failure);
            }
        }
    }
    page
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<String>,
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

pub struct HubspotClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HubspotClient {
    pub fn new(config: &HubspotConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn search(&self, criteria: &FetchCriteria, after: Option<&str>) -> Result<SearchResponse> {
        let body = SearchRequest {
            filter_groups: vec![FilterGroup {
                filters: vec![Filter {
                    property_name: &criteria.filter_property,
                    operator: "EQ",
                    value: &criteria.filter_value,
                }],
            }],
            properties: search_properties(),
            after,
            limit: criteria.page_size,
        };

        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        debug!("POST {} after={:?}", url, after);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Api {
                message: format!("search returned {}: {}", status.as_u16(), text),
            });
        }
        Ok(response.json::<SearchResponse>().await?)
    }
}

#[async_trait]
impl ContactSourcePort for HubspotClient {
    async fn fetch_page(&self, criteria: &FetchCriteria, after: Option<&str>) -> std::result::Result<ContactPage, String> {
        let response = self.search(criteria, after).await.map_err(|e| e.to_string())?;
        Ok(page_from_response(response))
    }
}

#[async_trait]
impl ContactSinkPort for HubspotClient {
    async fn persist(&self, contact: &NormalizedContact) -> std::result::Result<Ack, PersistError> {
        let payload = UploadPayload::from_contact(contact)?;
        let url = format!("{}{}", self.base_url, CREATE_PATH);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PersistError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let remote_id = serde_json::from_str::<CreatedObject>(&body)
            .ok()
            .and_then(|created| created.id);
        Ok(Ack {
            contact_id: contact.id.clone(),
            remote_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use serde_json::json;

    #[test]
    fn search_request_matches_wire_format() {
        let criteria = FetchCriteria {
            filter_property: "allowed_to_collect".into(),
            filter_value: "true".into(),
            page_size: 100,
        };
        let body = SearchRequest {
            filter_groups: vec![FilterGroup {
                filters: vec![Filter {
                    property_name: &criteria.filter_property,
                    operator: "EQ",
                    value: &criteria.filter_value,
                }],
            }],
            properties: vec!["raw_email"],
            after: Some("200"),
            limit: criteria.page_size,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "filterGroups": [{"filters": [{
                    "propertyName": "allowed_to_collect",
                    "operator": "EQ",
                    "value": "true"
                }]}],
                "properties": ["raw_email"],
                "after": "200",
                "limit": 100
            })
        );
    }

    #[test]
    fn page_splits_accepted_and_rejected() {
        let response: SearchResponse = serde_json::from_value(json!({
            "total": 3,
            "results": [
                {"id": "1", "properties": {"raw_email": "Jane <jane@example.com>", "hs_object_id": "1", "phone": null}},
                {"id": 2, "properties": {"country": "France", "num_notes": 4}},
                {"id": "3", "properties": {"hs_object_id": "99"}}
            ],
            "paging": {"next": {"after": "3", "link": "?after=3"}}
        }))
        .unwrap();

        let page = page_from_response(response);
        assert_eq!(page.next_after.as_deref(), Some("3"));
        assert_eq!(page.contacts.len(), 2);
        assert_eq!(page.contacts[1].id, "2");
        assert_eq!(page.contacts[1].extra.get("num_notes").map(String::as_str), Some("4"));
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].kind, FailureKind::InvalidRecord);
    }

    #[test]
    fn last_page_has_no_cursor() {
        let response: SearchResponse =
            serde_json::from_value(json!({"results": []})).unwrap();
        let page = page_from_response(response);
        assert!(page.next_after.is_none());
        assert!(page.contacts.is_empty());
    }
}
