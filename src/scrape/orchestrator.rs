//! Crawl orchestration across all configured stores
//!
//! The HTML path fans out one worker task per category, bounded by a
//! semaphore sized from `crawler.max-workers`, and joins every worker
//! before returning. The API path is strictly sequential with a
//! randomized pacing sleep after each page fetch - a self-imposed rate
//! limit on the remote endpoint.
//!
//! Transient fetch failures never abort the run: both paths convert them
//! into failure-set entries for the retry coordinator.

use crate::config::{Config, StoreConfig};
use crate::model::CategoryDescriptor;
use crate::scrape::adapter::SourceAdapter;
use crate::scrape::api::ApiAdapter;
use crate::scrape::fetcher::build_http_client;
use crate::scrape::html::HtmlAdapter;
use crate::scrape::retry::{FailedFetch, FailureSet};
use crate::scrape::RecordSink;
use crate::{AgoraError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Counters accumulated over the scrape phase
#[derive(Debug, Default, Clone)]
pub struct ScrapeStats {
    /// Pages fetched successfully across all stores
    pub pages_fetched: u64,

    /// Records enqueued into the sink (before retries)
    pub records: u64,

    /// Page fetches routed into the failure set
    pub failed_fetches: u64,
}

impl ScrapeStats {
    fn merge(&mut self, other: &ScrapeStats) {
        self.pages_fetched += other.pages_fetched;
        self.records += other.records;
        self.failed_fetches += other.failed_fetches;
    }
}

/// What one category worker produced
#[derive(Debug, Default)]
struct WorkerReport {
    stats: ScrapeStats,
    failures: FailureSet,
}

/// Drives all configured source adapters and owns the collection sink
pub struct Orchestrator {
    config: Arc<Config>,
    client: Client,
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
    sink: RecordSink,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Builds the HTTP client and one adapter per configured store
    pub fn new(config: Arc<Config>, sink: RecordSink, cancel: CancellationToken) -> Result<Self> {
        let client = build_http_client(&config.crawler)?;
        let adapters = build_adapters(&config)?;

        Ok(Self {
            config,
            client,
            adapters,
            sink,
            cancel,
        })
    }

    /// Adapters by store name (shared with the retry coordinator)
    pub fn adapters(&self) -> &HashMap<String, Arc<dyn SourceAdapter>> {
        &self.adapters
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Scrapes every store; returns counters and the transient failures
    /// pending retry
    pub async fn run(&self) -> Result<(ScrapeStats, FailureSet)> {
        let mut stats = ScrapeStats::default();
        let mut failures = FailureSet::new();

        for store in &self.config.stores {
            if self.cancel.is_cancelled() {
                tracing::info!("scrape cancelled, skipping remaining stores");
                break;
            }

            let adapter = Arc::clone(
                self.adapters
                    .get(store.name())
                    .expect("adapter exists for every configured store"),
            );

            let report = match store {
                StoreConfig::Html(_) => self.run_html_store(adapter).await?,
                StoreConfig::Api(_) => self.run_api_store(adapter).await?,
            };

            stats.merge(&report.stats);
            failures.extend(report.failures);
        }

        Ok((stats, failures))
    }

    /// Parallel path: one worker per category, semaphore-bounded, joined
    /// before returning
    async fn run_html_store(&self, adapter: Arc<dyn SourceAdapter>) -> Result<WorkerReport> {
        let store = adapter.store_name().to_string();
        let categories = self.discover(&adapter).await?;
        let semaphore = Arc::new(Semaphore::new(self.config.crawler.max_workers as usize));
        let mut workers = JoinSet::new();

        for category in categories {
            let adapter = Arc::clone(&adapter);
            let client = self.client.clone();
            let sink = self.sink.clone();
            let cancel = self.cancel.clone();
            let semaphore = Arc::clone(&semaphore);

            workers.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                page_through_category(&adapter, &client, &sink, &cancel, category).await
            });
        }

        let mut report = WorkerReport::default();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(worker) => {
                    report.stats.merge(&worker.stats);
                    report.failures.extend(worker.failures);
                }
                Err(e) => tracing::error!("{}: category worker panicked: {}", store, e),
            }
        }

        tracing::info!(
            "{}: {} pages, {} records, {} failed fetches",
            store,
            report.stats.pages_fetched,
            report.stats.records,
            report.stats.failed_fetches
        );
        Ok(report)
    }

    /// Sequential path: category-major page iteration with pacing sleeps
    async fn run_api_store(&self, adapter: Arc<dyn SourceAdapter>) -> Result<WorkerReport> {
        let store = adapter.store_name().to_string();
        let categories = self.discover(&adapter).await?;
        let mut report = WorkerReport::default();
        let start = Instant::now();

        'categories: for category in categories {
            let page_count = match &category {
                CategoryDescriptor::Paged { page_count, .. } => *page_count,
                CategoryDescriptor::Listing { .. } => {
                    tracing::warn!("{}: unexpected listing category on API path", store);
                    continue;
                }
            };

            for page in 0..page_count {
                if self.cancel.is_cancelled() {
                    break 'categories;
                }

                match adapter.fetch_page(&self.client, &category, page).await {
                    Ok(fetch) => {
                        report.stats.pages_fetched += 1;
                        report.stats.records += fetch.records.len() as u64;
                        self.sink.add_skips(&store, fetch.skipped);
                        for record in fetch.records {
                            self.sink.put(record);
                        }
                    }
                    Err(error) => {
                        tracing::debug!("{}: {}", store, error);
                        report.stats.failed_fetches += 1;
                        report.failures.push(FailedFetch {
                            store: store.clone(),
                            url: error.url().to_string(),
                        });
                    }
                }

                if report.stats.pages_fetched % 10 == 0 && report.stats.pages_fetched > 0 {
                    let rate = report.stats.pages_fetched as f64 / start.elapsed().as_secs_f64();
                    tracing::info!(
                        "{}: {} pages fetched, {:.2} pages/sec",
                        store,
                        report.stats.pages_fetched,
                        rate
                    );
                }

                self.pace().await;
            }
        }

        Ok(report)
    }

    async fn discover(
        &self,
        adapter: &Arc<dyn SourceAdapter>,
    ) -> Result<Vec<CategoryDescriptor>> {
        adapter
            .discover_categories(&self.client)
            .await
            .map_err(|e| AgoraError::Discovery {
                store: adapter.store_name().to_string(),
                message: e.to_string(),
            })
    }

    /// Sleeps a random duration within the configured pacing range, or
    /// returns immediately on cancellation
    async fn pace(&self) {
        let pacing = &self.config.pacing;
        if pacing.max_millis == 0 {
            return;
        }

        let millis = if pacing.min_millis == pacing.max_millis {
            pacing.max_millis
        } else {
            fastrand::u64(pacing.min_millis..=pacing.max_millis)
        };

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(millis)) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

/// One HTML worker: pages through a category until the empty-page
/// termination signal, pushing records straight into the sink
async fn page_through_category(
    adapter: &Arc<dyn SourceAdapter>,
    client: &Client,
    sink: &RecordSink,
    cancel: &CancellationToken,
    category: CategoryDescriptor,
) -> WorkerReport {
    let store = adapter.store_name().to_string();
    let mut report = WorkerReport::default();
    let mut page = 1;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match adapter.fetch_page(client, &category, page).await {
            Ok(fetch) => {
                if fetch.is_empty() {
                    // Normal end of pagination, not an error
                    break;
                }
                report.stats.pages_fetched += 1;
                report.stats.records += fetch.records.len() as u64;
                sink.add_skips(&store, fetch.skipped);
                for record in fetch.records {
                    sink.put(record);
                }
                page += 1;
            }
            Err(error) => {
                tracing::debug!("{} [{}]: {}", store, category.id(), error);
                report.stats.failed_fetches += 1;
                report.failures.push(FailedFetch {
                    store: store.clone(),
                    url: error.url().to_string(),
                });
                break;
            }
        }
    }

    report
}

/// Builds one adapter per configured store
pub fn build_adapters(config: &Config) -> Result<HashMap<String, Arc<dyn SourceAdapter>>> {
    let mut adapters: HashMap<String, Arc<dyn SourceAdapter>> = HashMap::new();

    for store in &config.stores {
        let adapter: Arc<dyn SourceAdapter> = match store {
            StoreConfig::Html(cfg) => Arc::new(HtmlAdapter::new(cfg.clone())?),
            StoreConfig::Api(cfg) => Arc::new(ApiAdapter::new(cfg.clone())),
        };
        adapters.insert(store.name().to_string(), adapter);
    }

    Ok(adapters)
}
