pub mod config;
pub mod constants;
pub mod error;

// Record shapes shared across layers
pub mod domain;

// Extraction, resolution, normalization and dedup
pub mod pipeline;

// Use cases and the ports they depend on
pub mod app;

// Adapters: HubSpot, Nominatim, files
pub mod infra;

pub mod observability;
