use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::app::enrich_use_case::EnrichUseCase;
use crate::app::fetch_use_case::FetchUseCase;
use crate::app::ports::{ContactSinkPort, ContactSourcePort, FetchCriteria, GeocoderPort};
use crate::app::report::RunReport;
use crate::app::upload_use_case::UploadUseCase;
use crate::config::{DedupConfig, UploadConfig};
use crate::domain::{NormalizedContact, RecordSet};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::assemble::assemble;
use crate::pipeline::processing::Deduplicator;

/// Cleaned contacts plus the report describing how they were produced.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    /// Output order follows first appearance of each email in the input
    pub contacts: Vec<NormalizedContact>,
}

/// fetch → enrich → dedup → assemble → persist
pub struct RunUseCase {
    source: Arc<dyn ContactSourcePort>,
    geocoder: Arc<dyn GeocoderPort>,
    sink: Arc<dyn ContactSinkPort>,
    criteria: FetchCriteria,
    dedup: DedupConfig,
    upload: UploadConfig,
}

impl RunUseCase {
    pub fn new(
        source: Arc<dyn ContactSourcePort>,
        geocoder: Arc<dyn GeocoderPort>,
        sink: Arc<dyn ContactSinkPort>,
        criteria: FetchCriteria,
        dedup: DedupConfig,
        upload: UploadConfig,
    ) -> Self {
        Self {
            source,
            geocoder,
            sink,
            criteria,
            dedup,
            upload,
        }
    }

    /// Only an unrecoverable fetch error aborts; every per-record problem
    /// ends up in the report.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunOutput> {
        let started = Instant::now();
        let mut report = RunReport::new();
        info!(run_id = %report.run_id, "Starting contact pipeline run");

        let stage = Instant::now();
        let records = FetchUseCase::new(Arc::clone(&self.source), self.criteria.clone())
            .fetch_all()
            .await?;
        report.record_stage("fetch", stage.elapsed());

        let output = self.process(records, report).await;
        metrics::run_duration(started.elapsed().as_secs_f64());
        output
    }

    /// Clean an already materialized record set and persist the result.
    pub async fn process(&self, records: RecordSet, mut report: RunReport) -> Result<RunOutput> {
        report.pages = records.pages();
        report.fetched = records.len();
        report.rejected = records.rejected().len();
        report.fetch_interrupted_by = records.interrupted_by().map(str::to_string);
        report.failures.extend(records.rejected().iter().cloned());

        if records.is_empty() {
            warn!("No eligible contacts fetched, nothing to clean");
            return Ok(RunOutput {
                report,
                contacts: Vec::new(),
            });
        }

        let stage = Instant::now();
        let enriched = EnrichUseCase::new(Arc::clone(&self.geocoder)).enrich(&records).await?;
        report.enriched = enriched.contacts.len();
        report.failures.extend(enriched.failures);
        report.record_stage("enrich", stage.elapsed());

        let stage = Instant::now();
        let outcome = Deduplicator::new(self.dedup.clone()).deduplicate(enriched.contacts);
        metrics::dedup::outcome(outcome.canonical.len(), outcome.merges.len(), outcome.skipped.len());
        report.canonical = outcome.canonical.len();
        report.merged = outcome.merges.len();
        report.failures.extend(outcome.skipped);
        let contacts: Vec<NormalizedContact> = outcome.canonical.into_iter().map(assemble).collect();
        report.record_stage("dedup", stage.elapsed());
        info!(
            "Deduplicated {} records into {} contacts ({} merges)",
            report.enriched, report.canonical, report.merged
        );

        let stage = Instant::now();
        let uploaded = UploadUseCase::new(Arc::clone(&self.sink), self.upload.concurrency)
            .upload(&contacts)
            .await;
        report.persisted = uploaded.acks.len();
        report.failures.extend(uploaded.failures);
        report.record_stage("persist", stage.elapsed());

        info!(
            run_id = %report.run_id,
            persisted = report.persisted,
            failures = report.failures.len(),
            "Contact pipeline run finished"
        );
        Ok(RunOutput { report, contacts })
    }
}
