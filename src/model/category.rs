//! Category descriptors - units of crawl work
//!
//! Each descriptor names one category of one store. The two variants
//! mirror the two retrieval patterns: an HTML listing page that is paged
//! until it comes back empty, and an API category with a page count known
//! up front.

/// One category of one store, as discovered by its source adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryDescriptor {
    /// HTML listing page, paginated via a query parameter
    Listing {
        /// Owning store name
        store: String,
        /// Absolute listing URL
        url: String,
    },

    /// API category addressed by code, with `ceil(product_count / page_size)`
    /// pages
    Paged {
        /// Owning store name
        store: String,
        /// Store-assigned category code
        code: String,
        /// Number of search pages to fetch
        page_count: u32,
    },
}

impl CategoryDescriptor {
    /// The store this category belongs to
    pub fn store(&self) -> &str {
        match self {
            Self::Listing { store, .. } => store,
            Self::Paged { store, .. } => store,
        }
    }

    /// Identifier used in logs: the listing URL or the category code
    pub fn id(&self) -> &str {
        match self {
            Self::Listing { url, .. } => url,
            Self::Paged { code, .. } => code,
        }
    }
}
