//! Source adapter trait - the seam between retailers and the orchestrator
//!
//! An adapter knows how to discover a store's categories and how to turn
//! one page of one category into normalized product records. The
//! orchestrator drives adapters without knowing which retrieval pattern
//! (paginated HTML or JSON search API) sits behind the trait.

use crate::model::{CategoryDescriptor, ProductRecord};
use crate::scrape::fetcher::FetchError;
use async_trait::async_trait;
use reqwest::Client;

/// Parsed content of one page of one category
#[derive(Debug, Default)]
pub struct PageFetch {
    /// Successfully extracted records
    pub records: Vec<ProductRecord>,

    /// Products present on the page that failed extraction and were skipped
    pub skipped: u64,
}

impl PageFetch {
    /// True when the page held no products at all
    ///
    /// For the HTML path this is the normal end-of-pagination signal. A
    /// page whose products all failed extraction is NOT empty in this
    /// sense and does not terminate pagination.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.skipped == 0
    }
}

/// Retailer-specific retrieval strategy
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Retailer name, recorded on every product
    fn store_name(&self) -> &str;

    /// Discovers every category of this store
    async fn discover_categories(&self, client: &Client)
        -> Result<Vec<CategoryDescriptor>, FetchError>;

    /// The URL that fetches one page of one category
    ///
    /// Page numbering is adapter-specific: the HTML pattern counts from 1,
    /// the API pattern from 0.
    fn page_url(&self, category: &CategoryDescriptor, page: u32) -> String;

    /// Fetches and parses an explicit page URL
    ///
    /// Every page URL produced by `page_url` is self-contained, which is
    /// what lets the retry coordinator refetch failures without knowing
    /// their category.
    async fn fetch_url(&self, client: &Client, url: &str) -> Result<PageFetch, FetchError>;

    /// Fetches and parses one page of a category
    async fn fetch_page(
        &self,
        client: &Client,
        category: &CategoryDescriptor,
        page: u32,
    ) -> Result<PageFetch, FetchError> {
        self.fetch_url(client, &self.page_url(category, page)).await
    }
}
