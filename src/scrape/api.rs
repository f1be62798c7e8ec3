//! JSON-API source adapter
//!
//! Category discovery is a single navigation query; entries whose name
//! matches the configured blocklist (promotional and non-product
//! sections) are dropped, and the remaining entries become paged
//! categories with `ceil(product_count / page_size)` search pages each.
//!
//! Network failures never cross the orchestrator boundary as errors:
//! the orchestrator records the failing URL in the failure set and the
//! run continues.

use crate::config::ApiStoreConfig;
use crate::model::{parse_price, parse_unit_price, CategoryDescriptor, ProductRecord};
use crate::scrape::adapter::{PageFetch, SourceAdapter};
use crate::scrape::fetcher::{fetch_text, FetchError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Adapter for stores exposing a JSON category-search API
pub struct ApiAdapter {
    config: ApiStoreConfig,
}

#[derive(Debug, Deserialize)]
struct NavigationResponse {
    data: NavigationData,
}

#[derive(Debug, Deserialize)]
struct NavigationData {
    #[serde(rename = "leftHandNavigationBar")]
    navigation_bar: NavigationBar,
}

#[derive(Debug, Deserialize)]
struct NavigationBar {
    #[serde(rename = "levelInfo")]
    level_info: Vec<NavigationEntry>,
}

#[derive(Debug, Deserialize)]
struct NavigationEntry {
    code: String,
    name: String,
    #[serde(rename = "productCount", default)]
    product_count: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(rename = "categoryProductSearch")]
    category_product_search: CategorySearch,
}

#[derive(Debug, Deserialize)]
struct CategorySearch {
    products: Vec<ApiProduct>,
}

#[derive(Debug, Deserialize)]
struct ApiProduct {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    price: Option<ApiPrice>,
}

#[derive(Debug, Deserialize)]
struct ApiPrice {
    /// List price, formatted ("2,49 €")
    #[serde(rename = "unitPriceFormatted", default)]
    unit_price: Option<String>,

    /// Current price after any discount, formatted
    #[serde(rename = "discountedPriceFormatted", default)]
    discounted_price: Option<String>,

    /// Per-unit price while discounted, formatted ("4,99 €/κιλό")
    #[serde(rename = "discountedUnitPriceFormatted", default)]
    discounted_unit_price: Option<String>,

    /// Per-unit price label shown when not discounted
    #[serde(rename = "supplementaryPriceLabel1", default)]
    supplementary_label: Option<String>,
}

impl ApiAdapter {
    pub fn new(config: ApiStoreConfig) -> Self {
        Self { config }
    }

    fn is_blocklisted(&self, name: &str) -> bool {
        self.config
            .blocklist
            .iter()
            .any(|word| name.contains(word.as_str()))
    }

    fn parse_navigation(&self, body: &str, url: &str) -> Result<Vec<CategoryDescriptor>, FetchError> {
        let response: NavigationResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Transient {
                url: url.to_string(),
                message: format!("malformed navigation JSON: {}", e),
            })?;

        let page_size = self.config.page_size;
        let categories = response
            .data
            .navigation_bar
            .level_info
            .into_iter()
            .filter(|entry| !self.is_blocklisted(&entry.name))
            .filter(|entry| entry.product_count > 0)
            .map(|entry| CategoryDescriptor::Paged {
                store: self.config.name.clone(),
                code: entry.code,
                page_count: entry.product_count.div_ceil(page_size),
            })
            .collect();

        Ok(categories)
    }

    fn parse_search(&self, body: &str, url: &str) -> Result<PageFetch, FetchError> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|e| FetchError::Transient {
                url: url.to_string(),
                message: format!("malformed search JSON: {}", e),
            })?;

        let mut page = PageFetch::default();
        for product in response.data.category_product_search.products {
            match self.extract_product(product) {
                Ok(record) => page.records.push(record),
                Err(reason) => {
                    tracing::debug!("{}: skipping product: {}", self.config.name, reason);
                    page.skipped += 1;
                }
            }
        }

        Ok(page)
    }

    /// Extracts one API product, or the reason it must be skipped
    fn extract_product(&self, product: ApiProduct) -> Result<ProductRecord, &'static str> {
        let name = product.name.filter(|n| !n.is_empty()).ok_or("missing name")?;
        let path = product.url.filter(|u| !u.is_empty()).ok_or("missing link")?;
        let price = product.price.ok_or("missing price block")?;

        let starting = price
            .unit_price
            .as_deref()
            .and_then(parse_price)
            .ok_or("missing list price")?;
        let fin = price
            .discounted_price
            .as_deref()
            .and_then(parse_price)
            .ok_or("missing current price")?;

        // The discounted unit price only applies while a discount is
        // active; otherwise the supplementary label carries the per-unit
        // price.
        let unit_label = if fin != starting {
            price.discounted_unit_price
        } else {
            price.supplementary_label
        };
        let (price_per_unit, metric_unit) = match unit_label.as_deref().and_then(parse_unit_price) {
            Some((value, unit)) => (Some(value), unit),
            None => (None, None),
        };

        let link = format!(
            "{}{}",
            self.config.landing_url.trim_end_matches('/'),
            path
        );

        Ok(ProductRecord::new(
            product.code.filter(|c| !c.is_empty()),
            &self.config.name,
            link,
            &name,
            starting,
            fin,
            price_per_unit,
            metric_unit,
        ))
    }
}

#[async_trait]
impl SourceAdapter for ApiAdapter {
    fn store_name(&self) -> &str {
        &self.config.name
    }

    async fn discover_categories(
        &self,
        client: &Client,
    ) -> Result<Vec<CategoryDescriptor>, FetchError> {
        let url = &self.config.navigation_url;
        let body = fetch_text(client, url).await?;
        let categories = self.parse_navigation(&body, url)?;

        tracing::info!(
            "{}: discovered {} categories",
            self.config.name,
            categories.len()
        );
        Ok(categories)
    }

    fn page_url(&self, category: &CategoryDescriptor, page: u32) -> String {
        let code = match category {
            CategoryDescriptor::Paged { code, .. } => code.as_str(),
            CategoryDescriptor::Listing { url, .. } => url.as_str(),
        };

        self.config
            .search_url
            .replace("{category}", code)
            .replace("{page}", &page.to_string())
    }

    async fn fetch_url(&self, client: &Client, url: &str) -> Result<PageFetch, FetchError> {
        let body = fetch_text(client, url).await?;
        self.parse_search(&body, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ApiAdapter {
        ApiAdapter::new(ApiStoreConfig {
            name: "Beta Foods".to_string(),
            landing_url: "https://beta.example".to_string(),
            navigation_url: "https://api.beta.example/nav".to_string(),
            search_url: "https://api.beta.example/search?c={category}&p={page}".to_string(),
            page_size: 50,
            blocklist: vec!["New Products".to_string(), "Offers".to_string()],
        })
    }

    const NAV_JSON: &str = r#"{
        "data": {
            "leftHandNavigationBar": {
                "levelInfo": [
                    {"code": "dairy", "name": "Dairy", "productCount": 120},
                    {"code": "offers", "name": "Weekly Offers", "productCount": 400},
                    {"code": "bakery", "name": "Bakery", "productCount": 50},
                    {"code": "empty", "name": "Seasonal", "productCount": 0}
                ]
            }
        }
    }"#;

    #[test]
    fn test_navigation_filters_blocklist_and_empty() {
        let categories = adapter()
            .parse_navigation(NAV_JSON, "https://api.beta.example/nav")
            .unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(
            categories[0],
            CategoryDescriptor::Paged {
                store: "Beta Foods".to_string(),
                code: "dairy".to_string(),
                page_count: 3,
            }
        );
        // Exactly one full page
        assert_eq!(
            categories[1],
            CategoryDescriptor::Paged {
                store: "Beta Foods".to_string(),
                code: "bakery".to_string(),
                page_count: 1,
            }
        );
    }

    #[test]
    fn test_search_extracts_discounted_product() {
        let body = r#"{
            "data": {"categoryProductSearch": {"products": [{
                "code": "feta-400",
                "name": "Φέτα ΠΟΠ 400g",
                "url": "/products/feta-400",
                "price": {
                    "unitPriceFormatted": "4,99 €",
                    "discountedPriceFormatted": "3,99 €",
                    "discountedUnitPriceFormatted": "9,98 €/κιλό",
                    "supplementaryPriceLabel1": "12,48 €/κιλό"
                }
            }]}}
        }"#;

        let page = adapter().parse_search(body, "u").unwrap();
        let record = &page.records[0];

        assert_eq!(record.code, "feta-400");
        assert_eq!(record.link, "https://beta.example/products/feta-400");
        assert_eq!(record.starting_price, 4.99);
        assert_eq!(record.final_price, 3.99);
        assert!(record.discounted);
        // Discounted unit price wins while the prices differ
        assert_eq!(record.price_per_unit, 9.98);
        assert_eq!(record.metric_unit, "κιλό");
    }

    #[test]
    fn test_search_uses_supplementary_label_when_not_discounted() {
        let body = r#"{
            "data": {"categoryProductSearch": {"products": [{
                "name": "Γάλα 1L",
                "url": "/products/milk-1l",
                "price": {
                    "unitPriceFormatted": "1,49 €",
                    "discountedPriceFormatted": "1,49 €",
                    "discountedUnitPriceFormatted": "1,49 €/λίτρο",
                    "supplementaryPriceLabel1": "1,49 €/λίτρο"
                }
            }]}}
        }"#;

        let page = adapter().parse_search(body, "u").unwrap();
        let record = &page.records[0];

        assert!(!record.discounted);
        assert_eq!(record.price_per_unit, 1.49);
        // No store code: synthesized from the link
        assert_eq!(record.code.len(), 16);
    }

    #[test]
    fn test_product_missing_price_is_skipped() {
        let body = r#"{
            "data": {"categoryProductSearch": {"products": [
                {"name": "No price", "url": "/p/none"},
                {"name": "Γάλα 1L", "url": "/p/milk", "price": {
                    "unitPriceFormatted": "1,49 €",
                    "discountedPriceFormatted": "1,49 €"
                }}
            ]}}
        }"#;

        let page = adapter().parse_search(body, "u").unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.skipped, 1);
    }

    #[test]
    fn test_malformed_json_is_transient() {
        let result = adapter().parse_search("{not json", "https://api.beta.example/search");
        assert!(matches!(result, Err(FetchError::Transient { .. })));
    }

    #[test]
    fn test_page_url_substitutes_placeholders() {
        let category = CategoryDescriptor::Paged {
            store: "Beta Foods".to_string(),
            code: "dairy".to_string(),
            page_count: 3,
        };
        assert_eq!(
            adapter().page_url(&category, 2),
            "https://api.beta.example/search?c=dairy&p=2"
        );
    }
}
