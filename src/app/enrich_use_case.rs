use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::app::ports::GeocoderPort;
use crate::domain::{EnrichedContact, FailureKind, RawContact, RecordFailure, RecordSet};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::extract::{extract_display_name, extract_email};
use crate::pipeline::processing::{CountryResolver, PhoneNormalizer, Resolution};

#[derive(Debug, Default)]
pub struct EnrichOutcome {
    /// Same order as the input record set
    pub contacts: Vec<EnrichedContact>,
    pub failures: Vec<RecordFailure>,
}

/// Derives email, name, location and phone for every fetched contact.
///
/// Records are processed one at a time in input order; a failure on one field
/// of one record never stops the batch.
pub struct EnrichUseCase {
    resolver: CountryResolver,
}

impl EnrichUseCase {
    pub fn new(geocoder: Arc<dyn GeocoderPort>) -> Self {
        Self {
            resolver: CountryResolver::new(geocoder),
        }
    }

    /// Fails only when `records` is empty, since phones cannot be normalized
    /// without a fetched set.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn enrich(&mut self, records: &RecordSet) -> Result<EnrichOutcome> {
        let phones = PhoneNormalizer::for_records(records)?;
        let mut outcome = EnrichOutcome::default();

        for raw in records.contacts() {
            let contact = self.enrich_one(raw, &phones, &mut outcome.failures).await;
            outcome.contacts.push(contact);
        }
        Ok(outcome)
    }

    async fn enrich_one(
        &mut self,
        raw: &RawContact,
        phones: &PhoneNormalizer<'_>,
        failures: &mut Vec<RecordFailure>,
    ) -> EnrichedContact {
        let mut contact = EnrichedContact::unenriched(raw.clone());

        // 1. Location
        let locality = raw.country.as_deref().map(str::trim).filter(|c| !c.is_empty());
        if let Some(locality) = locality {
            match self.resolver.resolve(Some(locality)).await {
                Resolution::Resolved(location) => {
                    contact.city = if location.city.is_empty() {
                        Some(raw.city.clone().unwrap_or_default())
                    } else {
                        Some(location.city)
                    };
                    contact.country = Some(location.country);
                }
                Resolution::Unresolved { reason } => {
                    debug!(contact_id = %raw.id, "Location unresolved: {}", reason);
                    failures.push(RecordFailure::new(
                        raw.id.as_str(),
                        FailureKind::ResolutionAmbiguous,
                        reason,
                    ));
                }
                Resolution::GeocodeFailed { city, reason } => {
                    failures.push(RecordFailure::new(
                        raw.id.as_str(),
                        FailureKind::GeocodeFailure,
                        format!("{}: {}", city, reason),
                    ));
                }
            }
        }

        // 2. Identity
        if let Some(raw_email) = raw.raw_email.as_deref() {
            contact.email = extract_email(raw_email);
            contact.display_name = extract_display_name(raw_email);
        }

        // 3. Phone, under the country resolved above
        match phones.normalize(raw.phone.as_deref(), contact.country.as_deref()) {
            Ok(Some(phone)) => {
                metrics::phone::normalized();
                contact.phone_international = Some(phone);
            }
            Ok(None) => {}
            Err(skip) => {
                metrics::phone::skipped();
                warn!(contact_id = %raw.id, "Phone left blank: {}", skip);
                failures.push(RecordFailure::new(
                    raw.id.as_str(),
                    FailureKind::PhoneParseError,
                    skip.to_string(),
                ));
            }
        }

        contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::infra::offline_geocoder::OfflineGeocoder;

    fn raw(id: &str, raw_email: &str, country: &str, phone: &str) -> RawContact {
        let mut contact = RawContact::new(id);
        contact.raw_email = Some(raw_email.to_string());
        contact.country = Some(country.to_string());
        contact.phone = Some(phone.to_string());
        contact
    }

    #[tokio::test]
    async fn derives_fields_in_order() {
        let set = RecordSet::from_contacts(vec![
            raw("1", "Jane Doe <jane@example.com>", "Paris", "0612345678"),
            raw("2", "Sam <sam@example.com>", "Madrid, Spain", "612 345 678"),
        ]);
        let outcome = EnrichUseCase::new(Arc::new(OfflineGeocoder)).enrich(&set).await.unwrap();

        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        let jane = &outcome.contacts[0];
        assert_eq!(jane.email.as_deref(), Some("jane@example.com"));
        assert_eq!(jane.display_name.as_deref(), Some("Jane Doe"));
        assert_eq!(jane.country.as_deref(), Some("France"));
        assert_eq!(jane.city.as_deref(), Some("Paris"));
        assert_eq!(jane.phone_international.as_deref(), Some("(+33) 6 12 34 56 78"));

        let sam = &outcome.contacts[1];
        assert_eq!(sam.country.as_deref(), Some("Spain"));
        assert_eq!(sam.city.as_deref(), Some(""));
        assert!(sam
            .phone_international
            .as_deref()
            .map_or(false, |p| p.starts_with("(+34) 612")));
    }

    #[tokio::test]
    async fn failures_are_collected_not_fatal() {
        let mut no_phone_country = raw("2", "<b@x.com>", "Unknownplace123", "0612345678");
        no_phone_country.phone = None;
        let set = RecordSet::from_contacts(vec![
            raw("1", "A <a@x.com>", "France", "not a phone"),
            no_phone_country,
            raw("3", "C <c@x.com>", "Gotham City", "0612345678"),
        ]);
        let outcome = EnrichUseCase::new(Arc::new(OfflineGeocoder)).enrich(&set).await.unwrap();

        assert_eq!(outcome.contacts.len(), 3);
        let kinds: Vec<(&str, FailureKind)> = outcome
            .failures
            .iter()
            .map(|f| (f.contact_id.as_str(), f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("1", FailureKind::PhoneParseError),
                ("2", FailureKind::ResolutionAmbiguous),
                ("3", FailureKind::ResolutionAmbiguous),
            ]
        );
        assert_eq!(outcome.contacts[0].phone_international, None);
        assert_eq!(outcome.contacts[2].country, None);
    }

    #[tokio::test]
    async fn empty_record_set_is_a_missing_prerequisite() {
        let set = RecordSet::from_contacts(Vec::new());
        let err = EnrichUseCase::new(Arc::new(OfflineGeocoder)).enrich(&set).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingPrerequisite(_)));
    }

    #[tokio::test]
    async fn keeps_existing_city_when_country_is_named() {
        let mut contact = raw("1", "A <a@x.com>", "France", "0612345678");
        contact.city = Some("Lyon".into());
        let set = RecordSet::from_contacts(vec![contact]);
        let outcome = EnrichUseCase::new(Arc::new(OfflineGeocoder)).enrich(&set).await.unwrap();
        assert_eq!(outcome.contacts[0].city.as_deref(), Some("Lyon"));
    }
}
