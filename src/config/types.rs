use serde::Deserialize;

/// Main configuration structure for Agora
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub pacing: PacingConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent category workers (HTML path)
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User agent string sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Inter-request pacing for the sequential API path
///
/// A sleep of a random duration within `[min-millis, max-millis]` follows
/// every API page fetch. This is a self-imposed rate limit, not a
/// correctness requirement.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    #[serde(rename = "min-millis", default = "default_pacing_min")]
    pub min_millis: u64,

    #[serde(rename = "max-millis", default = "default_pacing_max")]
    pub max_millis: u64,
}

/// Retry behavior for transiently failed fetches
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry rounds over the failure set
    #[serde(rename = "max-rounds", default = "default_max_rounds")]
    pub max_rounds: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Per-retailer source configuration
///
/// The `kind` field selects the retrieval pattern: `"html"` for paginated
/// listing pages, `"api"` for the JSON category-search API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum StoreConfig {
    #[serde(rename = "html")]
    Html(HtmlStoreConfig),

    #[serde(rename = "api")]
    Api(ApiStoreConfig),
}

impl StoreConfig {
    /// The retailer name recorded on every scraped product
    pub fn name(&self) -> &str {
        match self {
            Self::Html(cfg) => &cfg.name,
            Self::Api(cfg) => &cfg.name,
        }
    }
}

/// Configuration for an HTML-paginated retailer
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlStoreConfig {
    /// Retailer name (recorded on products)
    pub name: String,

    /// Site root; relative product and category links resolve against it
    #[serde(rename = "landing-url")]
    pub landing_url: String,

    /// Page holding the two-level category navigation menu
    #[serde(rename = "categories-url")]
    pub categories_url: String,

    /// Query parameter used for pagination (page numbers start at 1)
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// CSS selectors for the navigation menu and product tiles
    #[serde(default)]
    pub selectors: HtmlSelectors,
}

/// CSS selectors for the HTML adapter
///
/// Defaults match the reference retailer's markup; override per store when
/// a site uses different class names.
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlSelectors {
    #[serde(rename = "nav-menu", default = "default_nav_menu")]
    pub nav_menu: String,

    #[serde(rename = "nav-submenu", default = "default_nav_submenu")]
    pub nav_submenu: String,

    #[serde(rename = "tile", default = "default_tile")]
    pub tile: String,

    #[serde(rename = "link", default = "default_link")]
    pub link: String,

    #[serde(rename = "title", default = "default_title")]
    pub title: String,

    #[serde(rename = "price", default = "default_price")]
    pub price: String,

    #[serde(rename = "promo-unit-price", default = "default_promo_unit_price")]
    pub promo_unit_price: String,

    #[serde(rename = "unit-price", default = "default_unit_price")]
    pub unit_price: String,
}

impl Default for HtmlSelectors {
    fn default() -> Self {
        Self {
            nav_menu: default_nav_menu(),
            nav_submenu: default_nav_submenu(),
            tile: default_tile(),
            link: default_link(),
            title: default_title(),
            price: default_price(),
            promo_unit_price: default_promo_unit_price(),
            unit_price: default_unit_price(),
        }
    }
}

/// Configuration for a JSON-API retailer
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStoreConfig {
    /// Retailer name (recorded on products)
    pub name: String,

    /// Site root; relative product links resolve against it
    #[serde(rename = "landing-url")]
    pub landing_url: String,

    /// Endpoint returning the category navigation tree
    #[serde(rename = "navigation-url")]
    pub navigation_url: String,

    /// Category-search endpoint template; `{category}` and `{page}` are
    /// substituted per request
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Products per search page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Navigation entries whose name contains any of these substrings are
    /// skipped (promotional and non-product sections)
    #[serde(default)]
    pub blocklist: Vec<String>,
}

fn default_max_workers() -> u32 {
    8
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("agora/{}", env!("CARGO_PKG_VERSION"))
}

fn default_pacing_min() -> u64 {
    2000
}

fn default_pacing_max() -> u64 {
    3000
}

fn default_max_rounds() -> u32 {
    5
}

fn default_page_param() -> String {
    "pg".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_nav_menu() -> String {
    "ul.mainNav_ul".to_string()
}

fn default_nav_submenu() -> String {
    "ul.mainNav_sub".to_string()
}

fn default_tile() -> String {
    r#"div[class^="product prGa_"]"#.to_string()
}

fn default_link() -> String {
    "a.absLink".to_string()
}

fn default_title() -> String {
    "h4.product__title".to_string()
}

fn default_price() -> String {
    "div.price".to_string()
}

fn default_promo_unit_price() -> String {
    "div.hightlight".to_string()
}

fn default_unit_price() -> String {
    "div.priceKil".to_string()
}
