//! Retry coordinator for transiently failed page fetches
//!
//! Runs after the orchestrator's join point, sequentially. Each round
//! attempts every URL in the failure set exactly once; URLs that fail
//! again form the next round's set. The loop stops when the set empties,
//! when a round resolves nothing (no progress), or at the configured
//! round bound - an unbounded failure set must never keep the run alive
//! forever.

use crate::scrape::adapter::SourceAdapter;
use crate::scrape::RecordSink;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One page fetch that failed transiently and is pending retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    /// Store whose adapter must refetch the URL
    pub store: String,

    /// Self-contained page URL
    pub url: String,
}

/// The evolving set of URLs pending retry
pub type FailureSet = Vec<FailedFetch>;

/// Result of running the retry coordinator
#[derive(Debug, Default)]
pub struct RetryOutcome {
    /// Rounds actually executed
    pub rounds: u32,

    /// URLs that eventually succeeded
    pub recovered: u64,

    /// URLs still failing when the coordinator stopped
    pub unresolved: FailureSet,
}

/// Retries every failed fetch until the set drains, progress stops, or
/// the round bound is hit
pub async fn drain_failures(
    client: &Client,
    adapters: &HashMap<String, Arc<dyn SourceAdapter>>,
    sink: &RecordSink,
    mut pending: FailureSet,
    max_rounds: u32,
    cancel: &CancellationToken,
) -> RetryOutcome {
    let mut outcome = RetryOutcome::default();

    while !pending.is_empty() && outcome.rounds < max_rounds {
        if cancel.is_cancelled() {
            break;
        }
        outcome.rounds += 1;

        let attempted = pending.len();
        let mut next_round = FailureSet::new();

        for failure in pending.drain(..) {
            if cancel.is_cancelled() {
                next_round.push(failure);
                continue;
            }

            let Some(adapter) = adapters.get(&failure.store) else {
                tracing::warn!("no adapter for store {}, dropping {}", failure.store, failure.url);
                continue;
            };

            match adapter.fetch_url(client, &failure.url).await {
                Ok(page) => {
                    outcome.recovered += 1;
                    sink.add_skips(&failure.store, page.skipped);
                    for record in page.records {
                        sink.put(record);
                    }
                }
                Err(error) => {
                    tracing::debug!("retry failed: {}", error);
                    next_round.push(failure);
                }
            }
        }

        tracing::info!(
            "retry round {}: {} attempted, {} still failing",
            outcome.rounds,
            attempted,
            next_round.len()
        );

        if next_round.len() == attempted {
            tracing::warn!(
                "retry round {} made no progress, giving up on {} URLs",
                outcome.rounds,
                next_round.len()
            );
            pending = next_round;
            break;
        }

        pending = next_round;
    }

    outcome.unresolved = pending;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryDescriptor, ProductRecord};
    use crate::scrape::adapter::PageFetch;
    use crate::scrape::fetcher::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Adapter whose fetches fail a fixed number of times per URL before
    /// succeeding (`u32::MAX` = always fail)
    struct FlakyAdapter {
        failures_before_success: u32,
        attempts: AtomicU32,
    }

    impl FlakyAdapter {
        fn new(failures_before_success: u32) -> Self {
            Self {
                failures_before_success,
                attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for FlakyAdapter {
        fn store_name(&self) -> &str {
            "Flaky"
        }

        async fn discover_categories(
            &self,
            _client: &Client,
        ) -> Result<Vec<CategoryDescriptor>, FetchError> {
            Ok(vec![])
        }

        fn page_url(&self, _category: &CategoryDescriptor, _page: u32) -> String {
            String::new()
        }

        async fn fetch_url(&self, _client: &Client, url: &str) -> Result<PageFetch, FetchError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures_before_success {
                return Err(FetchError::Transient {
                    url: url.to_string(),
                    message: "still down".to_string(),
                });
            }
            Ok(PageFetch {
                records: vec![ProductRecord::new(
                    None,
                    "Flaky",
                    url.to_string(),
                    "Recovered Product",
                    1.0,
                    1.0,
                    None,
                    None,
                )],
                skipped: 0,
            })
        }
    }

    fn adapters(adapter: FlakyAdapter) -> HashMap<String, Arc<dyn SourceAdapter>> {
        let mut map: HashMap<String, Arc<dyn SourceAdapter>> = HashMap::new();
        map.insert("Flaky".to_string(), Arc::new(adapter));
        map
    }

    fn failures(count: usize) -> FailureSet {
        (0..count)
            .map(|i| FailedFetch {
                store: "Flaky".to_string(),
                url: format!("https://flaky.example/page-{}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_recover_in_one_round() {
        let sink = RecordSink::new();
        let outcome = drain_failures(
            &Client::new(),
            &adapters(FlakyAdapter::new(0)),
            &sink,
            failures(3),
            5,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.recovered, 3);
        assert!(outcome.unresolved.is_empty());
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_progress_per_round_terminates_within_set_size() {
        // 3 URLs, the first 2 attempts fail: round 1 recovers one URL
        // (attempts 0,1 fail, attempt 2 succeeds), later rounds drain the
        // rest. Termination must come from progress, not the bound.
        let sink = RecordSink::new();
        let outcome = drain_failures(
            &Client::new(),
            &adapters(FlakyAdapter::new(2)),
            &sink,
            failures(3),
            10,
            &CancellationToken::new(),
        )
        .await;

        assert!(outcome.rounds <= 3);
        assert_eq!(outcome.recovered, 3);
        assert!(outcome.unresolved.is_empty());
    }

    #[tokio::test]
    async fn test_no_progress_stops_immediately() {
        let sink = RecordSink::new();
        let outcome = drain_failures(
            &Client::new(),
            &adapters(FlakyAdapter::new(u32::MAX)),
            &sink,
            failures(4),
            10,
            &CancellationToken::new(),
        )
        .await;

        // A round that resolves nothing ends the loop without burning the
        // remaining rounds
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.recovered, 0);
        assert_eq!(outcome.unresolved.len(), 4);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_round_bound_is_respected() {
        // One URL succeeding on its 100th attempt: each round makes no
        // progress, so the coordinator stops after round 1; with a
        // pathological adapter alternating progress this bound would cap
        // at max_rounds. Verify the bound with a 1-round budget.
        let sink = RecordSink::new();
        let outcome = drain_failures(
            &Client::new(),
            &adapters(FlakyAdapter::new(u32::MAX)),
            &sink,
            failures(1),
            1,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.unresolved.len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_preserves_pending() {
        let sink = RecordSink::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = drain_failures(
            &Client::new(),
            &adapters(FlakyAdapter::new(0)),
            &sink,
            failures(2),
            5,
            &cancel,
        )
        .await;

        assert_eq!(outcome.rounds, 0);
        assert_eq!(outcome.unresolved.len(), 2);
    }
}
