// Adapters behind the application ports

pub mod hubspot;
pub mod json_file;
pub mod nominatim;
pub mod offline_geocoder;
pub mod rate_limiter;
