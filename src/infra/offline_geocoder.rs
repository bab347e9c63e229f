use async_trait::async_trait;

use crate::app::ports::{GeocodedPlace, GeocoderPort};
use crate::pipeline::processing::gazetteer::Gazetteer;

/// Answers city lookups from the embedded gazetteer. No network.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGeocoder;

#[async_trait]
impl GeocoderPort for OfflineGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedPlace>, String> {
        let gazetteer = Gazetteer::global();
        let place = gazetteer.city(query).and_then(|city| {
            gazetteer.country_by_code(city.alpha2).map(|country| GeocodedPlace {
                display_name: format!("{}, {}", city.name, country.name),
                country_code: Some(country.alpha2.to_string()),
            })
        });
        Ok(place)
    }
}
