//! Metrics for the contact pipeline
//!
//! Thin wrappers over the `metrics` facade, grouped by pipeline phase. Nothing
//! is exported unless `init_metrics` installed the Prometheus listener.

use std::fmt;
use std::net::SocketAddr;

pub const METRICS_PORT_ENV: &str = "CONTACTS_METRICS_PORT";

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Fetch metrics
    FetchPages,
    FetchContacts,
    FetchRejected,
    FetchErrors,
    FetchDuration,

    // Resolution metrics
    GeocodeLookups,
    GeocodeCacheHits,
    GeocodeFailures,
    ResolutionUnresolved,

    // Phone metrics
    PhonesNormalized,
    PhonesSkipped,

    // Dedup metrics
    DedupGroups,
    DedupMerges,
    DedupMissingIdentity,

    // Upload metrics
    UploadSuccess,
    UploadFailure,
    UploadDuration,

    // Run metrics
    RunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::FetchPages => "contacts_fetch_pages_total",
            MetricName::FetchContacts => "contacts_fetch_contacts_total",
            MetricName::FetchRejected => "contacts_fetch_rejected_total",
            MetricName::FetchErrors => "contacts_fetch_errors_total",
            MetricName::FetchDuration => "contacts_fetch_duration_seconds",

            MetricName::GeocodeLookups => "contacts_geocode_lookups_total",
            MetricName::GeocodeCacheHits => "contacts_geocode_cache_hits_total",
            MetricName::GeocodeFailures => "contacts_geocode_failures_total",
            MetricName::ResolutionUnresolved => "contacts_resolution_unresolved_total",

            MetricName::PhonesNormalized => "contacts_phones_normalized_total",
            MetricName::PhonesSkipped => "contacts_phones_skipped_total",

            MetricName::DedupGroups => "contacts_dedup_groups",
            MetricName::DedupMerges => "contacts_dedup_merges_total",
            MetricName::DedupMissingIdentity => "contacts_dedup_missing_identity_total",

            MetricName::UploadSuccess => "contacts_upload_success_total",
            MetricName::UploadFailure => "contacts_upload_failure_total",
            MetricName::UploadDuration => "contacts_upload_duration_seconds",

            MetricName::RunDuration => "contacts_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn emit_counter(name: MetricName, value: u64) {
    ::metrics::counter!(name.as_str()).increment(value);
}

pub fn emit_histogram(name: MetricName, value: f64) {
    ::metrics::histogram!(name.as_str()).record(value);
}

pub fn emit_gauge(name: MetricName, value: f64) {
    ::metrics::gauge!(name.as_str()).set(value);
}

/// Install the Prometheus exporter when `CONTACTS_METRICS_PORT` is set.
pub fn init_metrics() {
    let port: u16 = match std::env::var(METRICS_PORT_ENV).ok().and_then(|s| s.parse().ok()) {
        Some(port) => port,
        None => return,
    };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => tracing::warn!("Prometheus exporter install failed: {}", e),
    }
}

// ============================================================================
// Phase helpers
// ============================================================================

pub mod fetch {
    use super::{emit_counter, emit_histogram, MetricName};

    pub fn page(contacts: usize, rejected: usize) {
        emit_counter(MetricName::FetchPages, 1);
        emit_counter(MetricName::FetchContacts, contacts as u64);
        if rejected > 0 {
            emit_counter(MetricName::FetchRejected, rejected as u64);
        }
    }

    pub fn error() {
        emit_counter(MetricName::FetchErrors, 1);
    }

    pub fn duration(secs: f64) {
        emit_histogram(MetricName::FetchDuration, secs);
    }
}

pub mod resolve {
    use super::{emit_counter, MetricName};

    pub fn lookup() {
        emit_counter(MetricName::GeocodeLookups, 1);
    }

    pub fn cache_hit() {
        emit_counter(MetricName::GeocodeCacheHits, 1);
    }

    pub fn geocode_failure() {
        emit_counter(MetricName::GeocodeFailures, 1);
    }

    pub fn unresolved() {
        emit_counter(MetricName::ResolutionUnresolved, 1);
    }
}

pub mod phone {
    use super::{emit_counter, MetricName};

    pub fn normalized() {
        emit_counter(MetricName::PhonesNormalized, 1);
    }

    pub fn skipped() {
        emit_counter(MetricName::PhonesSkipped, 1);
    }
}

pub mod dedup {
    use super::{emit_counter, emit_gauge, MetricName};

    pub fn outcome(groups: usize, merges: usize, missing_identity: usize) {
        emit_gauge(MetricName::DedupGroups, groups as f64);
        emit_counter(MetricName::DedupMerges, merges as u64);
        emit_counter(MetricName::DedupMissingIdentity, missing_identity as u64);
    }
}

pub mod upload {
    use super::{emit_counter, emit_histogram, MetricName};

    pub fn success() {
        emit_counter(MetricName::UploadSuccess, 1);
    }

    pub fn failure() {
        emit_counter(MetricName::UploadFailure, 1);
    }

    pub fn duration(secs: f64) {
        emit_histogram(MetricName::UploadDuration, secs);
    }
}

pub fn run_duration(secs: f64) {
    emit_histogram(MetricName::RunDuration, secs);
}
