//! HTML-paginated source adapter
//!
//! Categories come from a two-level navigation menu on the store's
//! categories page: each top-level item holds a sub-list whose links are
//! the category listing URLs. Listing pages are paged through a query
//! parameter starting at 1; a page without product tiles is the normal
//! end-of-pagination signal.
//!
//! Extraction is per-tile: a tile missing its link, name, or price is
//! skipped with a counted reason and never aborts the page.

use crate::config::HtmlStoreConfig;
use crate::model::{parse_price, parse_unit_price, CategoryDescriptor, ProductRecord};
use crate::scrape::adapter::{PageFetch, SourceAdapter};
use crate::scrape::fetcher::{fetch_text, FetchError};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Adapter for stores exposing paginated HTML listing pages
pub struct HtmlAdapter {
    config: HtmlStoreConfig,
    landing: Url,
    nav_menu: Selector,
    nav_submenu: Selector,
    anchor: Selector,
    tile: Selector,
    link: Selector,
    title: Selector,
    price: Selector,
    promo_unit_price: Selector,
    unit_price: Selector,
}

impl HtmlAdapter {
    /// Compiles the configured selectors; invalid CSS is a config error
    pub fn new(config: HtmlStoreConfig) -> Result<Self, ConfigError> {
        let landing = Url::parse(&config.landing_url)
            .map_err(|_| ConfigError::InvalidUrl(config.landing_url.clone()))?;

        let sel = &config.selectors;
        let nav_menu = compile(&config.name, &sel.nav_menu)?;
        let nav_submenu = compile(&config.name, &sel.nav_submenu)?;
        let anchor = compile(&config.name, "a[href]")?;
        let tile = compile(&config.name, &sel.tile)?;
        let link = compile(&config.name, &sel.link)?;
        let title = compile(&config.name, &sel.title)?;
        let price = compile(&config.name, &sel.price)?;
        let promo_unit_price = compile(&config.name, &sel.promo_unit_price)?;
        let unit_price = compile(&config.name, &sel.unit_price)?;

        Ok(Self {
            config,
            landing,
            nav_menu,
            nav_submenu,
            anchor,
            tile,
            link,
            title,
            price,
            promo_unit_price,
            unit_price,
        })
    }

    /// Parses the categories page into listing-URL descriptors
    fn parse_categories(&self, body: &str) -> Vec<CategoryDescriptor> {
        let document = Html::parse_document(body);
        let mut categories = Vec::new();

        for menu in document.select(&self.nav_menu) {
            for submenu in menu.select(&self.nav_submenu) {
                for anchor in submenu.select(&self.anchor) {
                    let Some(href) = anchor.value().attr("href") else {
                        continue;
                    };
                    match self.landing.join(href) {
                        Ok(url) => categories.push(CategoryDescriptor::Listing {
                            store: self.config.name.clone(),
                            url: url.to_string(),
                        }),
                        Err(_) => {
                            tracing::debug!(
                                "{}: unresolvable category href {}",
                                self.config.name,
                                href
                            );
                        }
                    }
                }
            }
        }

        categories
    }

    /// Parses one listing page into records, counting skipped tiles
    fn parse_listing(&self, body: &str) -> PageFetch {
        let document = Html::parse_document(body);
        let mut page = PageFetch::default();

        for tile in document.select(&self.tile) {
            match self.extract_tile(&tile) {
                Ok(record) => page.records.push(record),
                Err(reason) => {
                    tracing::debug!("{}: skipping tile: {}", self.config.name, reason);
                    page.skipped += 1;
                }
            }
        }

        page
    }

    /// Extracts one product tile, or the reason it must be skipped
    fn extract_tile(&self, tile: &ElementRef) -> Result<ProductRecord, &'static str> {
        let href = tile
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or("missing product link")?;
        let link = self
            .landing
            .join(href)
            .map_err(|_| "unresolvable product link")?
            .to_string();

        let name = tile
            .select(&self.title)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .ok_or("missing product name")?;

        let final_price = tile
            .select(&self.price)
            .next()
            .map(element_text)
            .and_then(|t| parse_price(&t))
            .ok_or("missing or unparseable price")?;

        // Unit price priority: promotional element, then the per-kilogram
        // element when non-empty, then the flat price.
        let unit = tile
            .select(&self.promo_unit_price)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                tile.select(&self.unit_price)
                    .next()
                    .map(element_text)
                    .filter(|t| !t.is_empty())
            })
            .and_then(|t| parse_unit_price(&t));

        let (price_per_unit, metric_unit) = match unit {
            Some((value, unit)) => (Some(value), unit),
            None => (None, None),
        };

        Ok(ProductRecord::new(
            None,
            &self.config.name,
            link,
            &name,
            final_price,
            final_price,
            price_per_unit,
            metric_unit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for HtmlAdapter {
    fn store_name(&self) -> &str {
        &self.config.name
    }

    async fn discover_categories(
        &self,
        client: &Client,
    ) -> Result<Vec<CategoryDescriptor>, FetchError> {
        let body = fetch_text(client, &self.config.categories_url).await?;
        let categories = self.parse_categories(&body);

        if categories.is_empty() {
            return Err(FetchError::Malformed {
                url: self.config.categories_url.clone(),
                message: "no categories found in navigation menu".to_string(),
            });
        }

        tracing::info!(
            "{}: discovered {} categories",
            self.config.name,
            categories.len()
        );
        Ok(categories)
    }

    fn page_url(&self, category: &CategoryDescriptor, page: u32) -> String {
        let base = match category {
            CategoryDescriptor::Listing { url, .. } => url.as_str(),
            CategoryDescriptor::Paged { code, .. } => code.as_str(),
        };

        match Url::parse(base) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair(&self.config.page_param, &page.to_string());
                url.to_string()
            }
            Err(_) => format!("{}?{}={}", base, self.config.page_param, page),
        }
    }

    async fn fetch_url(&self, client: &Client, url: &str) -> Result<PageFetch, FetchError> {
        let body = fetch_text(client, url).await?;
        Ok(self.parse_listing(&body))
    }
}

fn compile(store: &str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css)
        .map_err(|_| ConfigError::Validation(format!("store {}: invalid selector {:?}", store, css)))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
