use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::app::ports::{ContactSourcePort, FetchCriteria};
use crate::domain::RecordSet;
use crate::error::{PipelineError, Result};
use crate::observability::metrics;

/// Reads every eligible contact, following the source's cursor until it
/// reports no next page.
pub struct FetchUseCase {
    source: Arc<dyn ContactSourcePort>,
    criteria: FetchCriteria,
}

impl FetchUseCase {
    pub fn new(source: Arc<dyn ContactSourcePort>, criteria: FetchCriteria) -> Self {
        Self { source, criteria }
    }

    /// A failure on the first page aborts. A later failure keeps the pages
    /// already read and marks the set as interrupted.
    #[instrument(skip(self), fields(filter = %self.criteria.filter_property))]
    pub async fn fetch_all(&self) -> Result<RecordSet> {
        let started = Instant::now();
        let mut contacts = Vec::new();
        let mut rejected = Vec::new();
        let mut pages = 0usize;
        let mut after: Option<String> = None;
        let mut interrupted_by = None;
        let mut seen_cursors: HashSet<String> = HashSet::new();

        loop {
            let page_number = pages + 1;
            let page = match self.source.fetch_page(&self.criteria, after.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    metrics::fetch::error();
                    if pages == 0 {
                        return Err(PipelineError::Fetch {
                            page: page_number,
                            message: e,
                        });
                    }
                    warn!("Fetch interrupted on page {}: {}", page_number, e);
                    interrupted_by = Some(format!("page {}: {}", page_number, e));
                    break;
                }
            };

            pages = page_number;
            metrics::fetch::page(page.contacts.len(), page.rejected.len());
            info!(
                "Fetched page {} ({} contacts, {} rejected)",
                page_number,
                page.contacts.len(),
                page.rejected.len()
            );
            contacts.extend(page.contacts);
            rejected.extend(page.rejected);

            match page.next_after {
                Some(next) if seen_cursors.contains(&next) => {
                    warn!("Source repeated cursor '{}', stopping pagination", next);
                    break;
                }
                Some(next) => {
                    seen_cursors.insert(next.clone());
                    after = Some(next);
                }
                None => break,
            }
        }

        metrics::fetch::duration(started.elapsed().as_secs_f64());
        info!(
            "Fetch complete: {} contacts over {} pages in {:.2?}",
            contacts.len(),
            pages,
            started.elapsed()
        );
        Ok(RecordSet::materialized(contacts, rejected, pages, interrupted_by))
    }
}
