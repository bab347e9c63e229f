//! Country resolution from free-text locality strings.
//!
//! Three tiers: a country named in the text wins outright, otherwise the first
//! recognized city is geocoded, otherwise the locality is unresolved.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::ports::{GeocodedPlace, GeocoderPort};
use crate::domain::ResolvedLocation;
use crate::observability::metrics;
use crate::pipeline::processing::gazetteer::Gazetteer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedLocation),
    /// Nothing recognizable in the text, or the geocoder knows no such city
    Unresolved { reason: String },
    /// A city was recognized but its lookup failed or named no country
    GeocodeFailed { city: String, reason: String },
}

impl Resolution {
    pub fn location(&self) -> Option<&ResolvedLocation> {
        match self {
            Resolution::Resolved(location) => Some(location),
            _ => None,
        }
    }
}

type Lookup = Result<Option<GeocodedPlace>, String>;

pub struct CountryResolver {
    gazetteer: &'static Gazetteer,
    geocoder: Arc<dyn GeocoderPort>,
    /// Per-run lookup cache keyed by city name; errors are cached too
    cache: HashMap<String, Lookup>,
}

impl CountryResolver {
    pub fn new(geocoder: Arc<dyn GeocoderPort>) -> Self {
        Self {
            gazetteer: Gazetteer::global(),
            geocoder,
            cache: HashMap::new(),
        }
    }

    pub async fn resolve(&mut self, locality: Option<&str>) -> Resolution {
        let text = match locality.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => text,
            None => {
                return Resolution::Unresolved {
                    reason: "no locality".to_string(),
                }
            }
        };

        let matches = self.gazetteer.recognize(text);
        if let Some(country) = matches.countries.first() {
            debug!("'{}' names country {}", text, country.name);
            return Resolution::Resolved(ResolvedLocation::country_only(country.name));
        }

        let city = match matches.cities.first() {
            Some(city) => city.name,
            None => {
                metrics::resolve::unresolved();
                return Resolution::Unresolved {
                    reason: format!("no country or city recognized in '{}'", text),
                };
            }
        };

        match self.lookup(city).await {
            Ok(Some(place)) => match self.country_of(&place) {
                Some(country) => Resolution::Resolved(ResolvedLocation::with_city(country, city)),
                None => {
                    metrics::resolve::geocode_failure();
                    Resolution::GeocodeFailed {
                        city: city.to_string(),
                        reason: format!("no country in geocoded address '{}'", place.display_name),
                    }
                }
            },
            Ok(None) => {
                metrics::resolve::unresolved();
                Resolution::Unresolved {
                    reason: format!("geocoder has no result for city '{}'", city),
                }
            }
            Err(e) => {
                metrics::resolve::geocode_failure();
                warn!("Geocode lookup for '{}' failed: {}", city, e);
                Resolution::GeocodeFailed {
                    city: city.to_string(),
                    reason: e,
                }
            }
        }
    }

    async fn lookup(&mut self, city: &str) -> Lookup {
        if let Some(cached) = self.cache.get(city) {
            metrics::resolve::cache_hit();
            return cached.clone();
        }
        metrics::resolve::lookup();
        let result = self.geocoder.geocode(city).await;
        self.cache.insert(city.to_string(), result.clone());
        result
    }

    fn country_of(&self, place: &GeocodedPlace) -> Option<&'static str> {
        place
            .country_code
            .as_deref()
            .and_then(|code| self.gazetteer.country_by_code(code))
            .or_else(|| self.gazetteer.recognize(&place.display_name).countries.first().copied())
            .map(|country| country.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        answer: Lookup,
        calls: AtomicUsize,
    }

    impl CountingGeocoder {
        fn new(answer: Lookup) -> Arc<Self> {
            Arc::new(Self { answer, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl GeocoderPort for CountingGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<GeocodedPlace>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn paris() -> Lookup {
        Ok(Some(GeocodedPlace {
            display_name: "Paris, Île-de-France, France métropolitaine, France".to_string(),
            country_code: Some("fr".to_string()),
        }))
    }

    #[tokio::test]
    async fn country_in_text_wins_without_lookup() {
        let geocoder = CountingGeocoder::new(paris());
        let mut resolver = CountryResolver::new(geocoder.clone());

        let resolution = resolver.resolve(Some("Paris, France")).await;
        assert_eq!(resolution, Resolution::Resolved(ResolvedLocation::country_only("France")));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn city_is_geocoded_once_per_run() {
        let geocoder = CountingGeocoder::new(paris());
        let mut resolver = CountryResolver::new(geocoder.clone());

        for _ in 0..3 {
            let resolution = resolver.resolve(Some("Paris")).await;
            assert_eq!(
                resolution,
                Resolution::Resolved(ResolvedLocation::with_city("France", "Paris"))
            );
        }
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn country_falls_back_to_address_text() {
        let geocoder = CountingGeocoder::new(Ok(Some(GeocodedPlace {
            display_name: "Lyon, Auvergne-Rhône-Alpes, France".to_string(),
            country_code: None,
        })));
        let mut resolver = CountryResolver::new(geocoder);
        let resolution = resolver.resolve(Some("lyon")).await;
        assert_eq!(resolution.location().map(|l| l.country.as_str()), Some("France"));
        assert_eq!(resolution.location().map(|l| l.city.as_str()), Some("Lyon"));
    }

    #[tokio::test]
    async fn noise_is_unresolved() {
        let geocoder = CountingGeocoder::new(paris());
        let mut resolver = CountryResolver::new(geocoder.clone());

        assert!(matches!(
            resolver.resolve(Some("Unknownplace123")).await,
            Resolution::Unresolved { .. }
        ));
        assert!(matches!(resolver.resolve(None).await, Resolution::Unresolved { .. }));
        assert!(matches!(resolver.resolve(Some("   ")).await, Resolution::Unresolved { .. }));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn geocoder_errors_and_misses_do_not_escape() {
        let mut resolver = CountryResolver::new(CountingGeocoder::new(Err("timeout".to_string())));
        match resolver.resolve(Some("Berlin")).await {
            Resolution::GeocodeFailed { city, reason } => {
                assert_eq!(city, "Berlin");
                assert_eq!(reason, "timeout");
            }
            other => panic!("unexpected resolution: {:?}", other),
        }

        let mut resolver = CountryResolver::new(CountingGeocoder::new(Ok(None)));
        assert!(matches!(
            resolver.resolve(Some("Berlin")).await,
            Resolution::Unresolved { .. }
        ));
    }

    #[tokio::test]
    async fn city_containing_a_country_name_goes_through_the_geocoder() {
        let geocoder = CountingGeocoder::new(Ok(Some(GeocodedPlace {
            display_name: "Ciudad de México, México".to_string(),
            country_code: Some("mx".to_string()),
        })));
        let mut resolver = CountryResolver::new(geocoder.clone());
        assert_eq!(
            resolver.resolve(Some("Mexico City")).await,
            Resolution::Resolved(ResolvedLocation::with_city("Mexico", "Mexico City"))
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }
}
