use async_trait::async_trait;
use std::sync::Arc;

use contact_pipeline::app::ports::{GeocodedPlace, GeocoderPort};
use contact_pipeline::domain::{RawContact, RecordSet, ResolvedLocation};
use contact_pipeline::infra::offline_geocoder::OfflineGeocoder;
use contact_pipeline::pipeline::processing::extract::{extract_display_name, extract_email};
use contact_pipeline::pipeline::processing::{CountryResolver, PhoneNormalizer, PhoneSkip, Resolution};

/// Always answers with Paris, France.
struct StaticGeocoder;

#[async_trait]
impl GeocoderPort for StaticGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Option<GeocodedPlace>, String> {
        Ok(Some(GeocodedPlace {
            display_name: "Paris, Île-de-France, France".to_string(),
            country_code: Some("FR".to_string()),
        }))
    }
}

#[tokio::test]
async fn resolver_tiers() {
    let mut resolver = CountryResolver::new(Arc::new(StaticGeocoder));

    assert_eq!(
        resolver.resolve(Some("Paris, France")).await,
        Resolution::Resolved(ResolvedLocation::country_only("France"))
    );
    assert_eq!(
        resolver.resolve(Some("Paris")).await,
        Resolution::Resolved(ResolvedLocation::with_city("France", "Paris"))
    );
    assert!(matches!(
        resolver.resolve(Some("Unknownplace123")).await,
        Resolution::Unresolved { .. }
    ));
}

#[tokio::test]
async fn resolver_handles_aliases_and_case() {
    let mut resolver = CountryResolver::new(Arc::new(OfflineGeocoder));

    let cases = [
        ("usa", "United States", ""),
        ("Berlin, Deutschland", "Germany", ""),
        ("  sao paulo ", "Brazil", "Sao Paulo"),
        ("NEW YORK", "United States", "New York"),
        ("Mexico City", "Mexico", "Mexico City"),
    ];
    for (input, country, city) in cases {
        assert_eq!(
            resolver.resolve(Some(input)).await,
            Resolution::Resolved(ResolvedLocation::with_city(country, city)),
            "input {:?}",
            input
        );
    }
}

#[test]
fn phone_normalization_examples() {
    let records = RecordSet::from_contacts(vec![RawContact::new("1")]);
    let phones = PhoneNormalizer::for_records(&records).unwrap();

    assert_eq!(
        phones.normalize(Some("0612345678"), Some("France")).unwrap().as_deref(),
        Some("(+33) 6 12 34 56 78")
    );
    assert!(matches!(
        phones.normalize(Some("0612345678"), Some("Narnia")),
        Err(PhoneSkip::UnmappedCountry(_))
    ));
    assert_eq!(phones.normalize(Some("0612345678"), None), Ok(None));
}

#[test]
fn email_extraction_examples() {
    assert_eq!(
        extract_email("Jane Doe <jane@example.com>").as_deref(),
        Some("jane@example.com")
    );
    assert_eq!(extract_email("Jane Doe jane@example.com"), None);
    assert_eq!(
        extract_display_name("Jane Doe <jane@example.com>").as_deref(),
        Some("Jane Doe")
    );
}
