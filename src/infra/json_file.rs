//! File adapters for offline and dry runs.
//!
//! Input may be a HubSpot search response, a JSON array of `{id, properties}`
//! objects, or contacts previously written by [`NdjsonFileSink`] (as an array
//! or one per line). Output is NDJSON, one `NormalizedContact` per line.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app::ports::{Ack, ContactPage, ContactSinkPort, ContactSourcePort, FetchCriteria};
use crate::constants::{
    PROP_ADDRESS, PROP_CITY, PROP_COUNTRY, PROP_CREATE_DATE, PROP_INDUSTRY, PROP_OBJECT_ID,
    PROP_PHONE, PROP_RAW_EMAIL,
};
use crate::domain::{FailureKind, NormalizedContact, RawContact, RecordFailure};
use crate::error::{PersistError, PipelineError, Result};
use crate::infra::hubspot::{page_from_response, ContactObject, SearchResponse};

/// Serves a whole file as a single page.
pub struct JsonFileSource {
    page: ContactPage,
}

impl JsonFileSource {
    pub async fn open(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::Config(format!("cannot read input '{}': {}", path.display(), e))
        })?;
        let page = parse_document(&text)?;
        info!(
            "Loaded {} contacts ({} rejected) from {}",
            page.contacts.len(),
            page.rejected.len(),
            path.display()
        );
        Ok(Self { page })
    }
}

#[async_trait]
impl ContactSourcePort for JsonFileSource {
    async fn fetch_page(&self, _criteria: &FetchCriteria, _after: Option<&str>) -> std::result::Result<ContactPage, String> {
        Ok(self.page.clone())
    }
}

pub fn parse_document(text: &str) -> Result<ContactPage> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(ContactPage::default());
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) if map.contains_key("results") => {
            let response: SearchResponse = serde_json::from_value(Value::Object(map))?;
            let mut page = page_from_response(response);
            page.next_after = None;
            Ok(page)
        }
        Ok(Value::Array(items)) => Ok(page_from_items(items)),
        Ok(single @ Value::Object(_)) => Ok(page_from_items(vec![single])),
        Ok(other) => Err(PipelineError::Config(format!(
            "expected a JSON object or array, found {}",
            other
        ))),
        Err(_) => {
            let mut items = Vec::new();
            for (number, line) in trimmed.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let item = serde_json::from_str::<Value>(line).map_err(|e| {
                    PipelineError::Config(format!("line {} is not JSON: {}", number + 1, e))
                })?;
                items.push(item);
            }
            Ok(page_from_items(items))
        }
    }
}

fn page_from_items(items: Vec<Value>) -> ContactPage {
    let mut page = ContactPage::default();
    for item in items {
        let id_hint = item
            .get("id")
            .map(|id| id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()))
            .unwrap_or_default();

        let parsed = if item.get("properties").is_some() {
            serde_json::from_value::<ContactObject>(item)
                .map_err(|e| RecordFailure::new(id_hint.as_str(), FailureKind::InvalidRecord, e.to_string()))
                .and_then(ContactObject::into_raw)
        } else {
            serde_json::from_value::<NormalizedContact>(item)
                .map(|contact| contact.to_raw())
                .map_err(|e| RecordFailure::new(id_hint.as_str(), FailureKind::InvalidRecord, e.to_string()))
        };

        match parsed {
            Ok(contact) => page.contacts.push(contact),
            Err(failure) => {
                warn!("Rejected record from file: {}", failure);
                page.rejected.push(failure);
            }
        }
    }
    page
}

/// `{id, properties}` form of a raw contact, readable by [`JsonFileSource`].
pub fn contact_object(contact: &RawContact) -> Value {
    let mut properties = Map::new();
    for (name, value) in &contact.extra {
        properties.insert(name.clone(), Value::String(value.clone()));
    }
    let typed = [
        (PROP_RAW_EMAIL, contact.raw_email.clone()),
        (PROP_COUNTRY, contact.country.clone()),
        (PROP_CITY, contact.city.clone()),
        (PROP_PHONE, contact.phone.clone()),
        (PROP_CREATE_DATE, contact.create_date.map(|dt| dt.to_rfc3339())),
        (PROP_INDUSTRY, contact.industry.clone()),
        (PROP_ADDRESS, contact.address.clone()),
        (PROP_OBJECT_ID, contact.object_id.clone()),
    ];
    for (name, value) in typed {
        if let Some(value) = value {
            properties.insert(name.to_string(), Value::String(value));
        }
    }
    json!({ "id": contact.id, "properties": properties })
}

/// Write raw contacts as a pretty JSON array.
pub async fn write_raw_contacts(path: &Path, contacts: &[RawContact]) -> Result<()> {
    let objects: Vec<Value> = contacts.iter().map(contact_object).collect();
    let text = serde_json::to_string_pretty(&objects)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

/// Appends each persisted contact as one JSON line.
pub struct NdjsonFileSink {
    file: Mutex<tokio::fs::File>,
}

impl NdjsonFileSink {
    /// Create or truncate `path`.
    pub async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self { file: Mutex::new(file) })
    }
}

#[async_trait]
impl ContactSinkPort for NdjsonFileSink {
    async fn persist(&self, contact: &NormalizedContact) -> std::result::Result<Ack, PersistError> {
        let mut line = serde_json::to_vec(contact)?;
        line.push(b'\n');
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(Ack {
            contact_id: contact.id.clone(),
            remote_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn criteria() -> FetchCriteria {
        FetchCriteria {
            filter_property: "allowed_to_collect".into(),
            filter_value: "true".into(),
            page_size: 100,
        }
    }

    #[test]
    fn reads_search_response_and_bare_arrays() {
        let response = json!({
            "results": [{"id": "1", "properties": {"raw_email": "A <a@x.com>"}}],
            "paging": {"next": {"after": "1"}}
        });
        let page = parse_document(&response.to_string()).unwrap();
        assert_eq!(page.contacts.len(), 1);
        assert!(page.next_after.is_none());

        let array = json!([
            {"id": "1", "properties": {"country": "Spain"}},
            {"id": "2", "properties": {"hs_object_id": "3"}}
        ]);
        let page = parse_document(&array.to_string()).unwrap();
        assert_eq!(page.contacts.len(), 1);
        assert_eq!(page.rejected.len(), 1);
        assert_eq!(page.rejected[0].contact_id, "2");
    }

    #[test]
    fn empty_document_is_an_empty_page() {
        let page = parse_document("  \n").unwrap();
        assert!(page.contacts.is_empty());
    }

    #[tokio::test]
    async fn sink_output_reads_back_as_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.ndjson");

        let contact = NormalizedContact {
            id: "7".into(),
            email: Some("jane@example.com".into()),
            display_name: Some("Jane Doe".into()),
            country: Some("France".into()),
            city: Some("Paris".into()),
            phone_international: Some("(+33) 6 12 34 56 78".into()),
            create_date: None,
            industry: Some("Retail".into()),
            address: None,
            extra: BTreeMap::new(),
        };

        let sink = NdjsonFileSink::create(&path).await.unwrap();
        let ack = sink.persist(&contact).await.unwrap();
        assert_eq!(ack.contact_id, "7");
        sink.persist(&NormalizedContact { id: "8".into(), ..contact.clone() }).await.unwrap();

        let source = JsonFileSource::open(&path).await.unwrap();
        let page = source.fetch_page(&criteria(), None).await.unwrap();
        assert_eq!(page.contacts.len(), 2);
        assert_eq!(page.contacts[0], contact.to_raw());
    }

    #[tokio::test]
    async fn raw_dump_round_trips_through_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.json");

        let mut raw = RawContact::new("11");
        raw.object_id = Some("11".into());
        raw.raw_email = Some("Sam <sam@x.com>".into());
        raw.extra.insert("lifecyclestage".into(), "lead".into());
        write_raw_contacts(&path, &[raw.clone()]).await.unwrap();

        let source = JsonFileSource::open(&path).await.unwrap();
        let page = source.fetch_page(&criteria(), None).await.unwrap();
        assert_eq!(page.contacts, vec![raw]);
    }

    #[tokio::test]
    async fn missing_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let result = JsonFileSource::open(&dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
