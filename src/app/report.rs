use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{FailureKind, RecordFailure};

#[derive(Debug, Clone, Serialize)]
pub struct StageDuration {
    pub stage: &'static str,
    pub seconds: f64,
}

/// Batch-level summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub pages: usize,
    pub fetched: usize,
    pub rejected: usize,
    pub fetch_interrupted_by: Option<String>,
    pub enriched: usize,
    pub canonical: usize,
    pub merged: usize,
    pub persisted: usize,
    pub failures: Vec<RecordFailure>,
    pub stages: Vec<StageDuration>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            pages: 0,
            fetched: 0,
            rejected: 0,
            fetch_interrupted_by: None,
            enriched: 0,
            canonical: 0,
            merged: 0,
            persisted: 0,
            failures: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn record_stage(&mut self, stage: &'static str, elapsed: Duration) {
        self.stages.push(StageDuration {
            stage,
            seconds: elapsed.as_secs_f64(),
        });
    }

    pub fn failures_by_kind(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    pub fn print_summary(&self) {
        println!("\n📊 Contact pipeline run {}", self.run_id);
        println!("   Pages fetched: {}", self.pages);
        println!("   Contacts fetched: {}", self.fetched);
        println!("   Rejected at fetch: {}", self.rejected);
        println!("   Enriched: {}", self.enriched);
        println!("   Canonical after dedup: {}", self.canonical);
        println!("   Merged away: {}", self.merged);
        println!("   Persisted: {}", self.persisted);
        if let Some(reason) = &self.fetch_interrupted_by {
            println!("\n⚠️  Fetch interrupted ({}), results are partial", reason);
        }

        let by_kind = self.failures_by_kind();
        if !by_kind.is_empty() {
            println!("\n⚠️  Skipped fields and records:");
            for (kind, count) in &by_kind {
                println!("   - {}: {}", kind, count);
            }
        }

        for stage in &self.stages {
            println!("   ⏱  {}: {:.2}s", stage.stage, stage.seconds);
        }
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
