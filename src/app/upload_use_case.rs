use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use crate::app::ports::{Ack, ContactSinkPort};
use crate::domain::{FailureKind, NormalizedContact, RecordFailure};
use crate::observability::metrics;

#[derive(Debug, Default)]
pub struct UploadOutcome {
    /// Input order
    pub acks: Vec<Ack>,
    /// Input order
    pub failures: Vec<RecordFailure>,
}

/// Hands each cleaned contact to the sink with at most `concurrency` calls
/// in flight. One failed persist never stops the others.
pub struct UploadUseCase {
    sink: Arc<dyn ContactSinkPort>,
    concurrency: usize,
}

impl UploadUseCase {
    pub fn new(sink: Arc<dyn ContactSinkPort>, concurrency: usize) -> Self {
        Self {
            sink,
            concurrency: concurrency.max(1),
        }
    }

    #[instrument(skip_all, fields(contacts = contacts.len(), concurrency = self.concurrency))]
    pub async fn upload(&self, contacts: &[NormalizedContact]) -> UploadOutcome {
        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, contact) in contacts.iter().cloned().enumerate() {
            let sink = Arc::clone(&self.sink);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let result = sink.persist(&contact).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<Ack, String>>> = (0..contacts.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if let Some(slot) = results.get_mut(index) {
                        *slot = Some(result.map_err(|e| e.to_string()));
                    }
                }
                Err(e) => error!("Upload task failed: {}", e),
            }
        }

        let mut outcome = UploadOutcome::default();
        for (contact, result) in contacts.iter().zip(results) {
            match result {
                Some(Ok(ack)) => {
                    metrics::upload::success();
                    outcome.acks.push(ack);
                }
                Some(Err(message)) => {
                    metrics::upload::failure();
                    warn!(contact_id = %contact.id, "Persist failed: {}", message);
                    outcome.failures.push(RecordFailure::new(
                        contact.id.as_str(),
                        FailureKind::PersistError,
                        message,
                    ));
                }
                None => {
                    metrics::upload::failure();
                    outcome.failures.push(RecordFailure::new(
                        contact.id.as_str(),
                        FailureKind::PersistError,
                        "upload task did not complete",
                    ));
                }
            }
        }

        metrics::upload::duration(started.elapsed().as_secs_f64());
        info!(
            "Upload finished: {} persisted, {} failed in {:.2?}",
            outcome.acks.len(),
            outcome.failures.len(),
            started.elapsed()
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistError;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Rejects ids listed in `reject`, sleeps longer for lower ids so
    /// completion order differs from input order.
    struct SlowSink {
        reject: Vec<&'static str>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ContactSinkPort for SlowSink {
        async fn persist(&self, contact: &NormalizedContact) -> Result<Ack, PersistError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let delay = 40u64.saturating_sub(contact.id.parse::<u64>().unwrap_or(0) * 10);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.reject.contains(&contact.id.as_str()) {
                return Err(PersistError::Rejected { status: 409, body: "conflict".into() });
            }
            Ok(Ack { contact_id: contact.id.clone(), remote_id: Some(format!("hs-{}", contact.id)) })
        }
    }

    fn contact(id: &str) -> NormalizedContact {
        NormalizedContact {
            id: id.into(),
            email: Some(format!("{}@x.com", id)),
            display_name: None,
            country: None,
            city: None,
            phone_international: None,
            create_date: None,
            industry: None,
            address: None,
            extra: BTreeMap::new(),
        }
    }

    fn slow_sink(reject: Vec<&'static str>) -> Arc<SlowSink> {
        Arc::new(SlowSink {
            reject,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn results_keep_input_order_and_failures_do_not_stop_batch() {
        let sink = slow_sink(vec!["2"]);
        let contacts: Vec<_> = ["1", "2", "3"].iter().map(|id| contact(id)).collect();
        let outcome = UploadUseCase::new(sink.clone(), 3).upload(&contacts).await;

        let acked: Vec<&str> = outcome.acks.iter().map(|a| a.contact_id.as_str()).collect();
        assert_eq!(acked, vec!["1", "3"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].contact_id, "2");
        assert_eq!(outcome.failures[0].kind, FailureKind::PersistError);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let sink = slow_sink(Vec::new());
        let contacts: Vec<_> = ["1", "2", "3", "4"].iter().map(|id| contact(id)).collect();
        UploadUseCase::new(sink.clone(), 2).upload(&contacts).await;
        assert!(sink.max_in_flight.load(Ordering::SeqCst) <= 2);

        let sink = slow_sink(Vec::new());
        UploadUseCase::new(sink.clone(), 0).upload(&contacts).await;
        assert_eq!(sink.max_in_flight.load(Ordering::SeqCst), 1);
    }
}
