//! CSS selectors for the listing and detail pages (WooCommerce defaults).

use serde::{Deserialize, Serialize};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Where tiles and their fields live on the listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSelectors {
    pub item: String,
    pub link: String,
    /// Structured title node; its inner link text is preferred.
    pub title: String,
    pub title_link: String,
    /// Used when the structured title node is missing.
    pub title_fallback: String,
    pub image: String,
    /// Image attributes checked in order, lazy-load sources first.
    pub image_attrs: Vec<String>,
}

impl Default for TileSelectors {
    fn default() -> Self {
        Self {
            item: "div.content-products-list ul li".to_string(),
            link: "a[href]".to_string(),
            title: "h2.woo-loop-product__title".to_string(),
            title_link: "a".to_string(),
            title_fallback: "h2, h3".to_string(),
            image: "img".to_string(),
            image_attrs: strings(&["data-src", "data-lazy-src", "src", "data-srcset", "srcset"]),
        }
    }
}

/// Where enrichment fields live on a detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub price: String,
    /// Struck-through original price inside the price block.
    pub price_original: String,
    /// Replacement (sale) price inside the price block.
    pub price_current: String,
    /// Structured numeric rating.
    pub rating_value: String,
    /// Rating container whose label carries the rating in prose.
    pub rating: String,
    pub attributes_table: String,
    pub attribute_row: String,
    pub attribute_label: String,
    pub attribute_value: String,
    pub gallery_image: String,
    pub image_attrs: Vec<String>,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            price: ".price".to_string(),
            price_original: "del".to_string(),
            price_current: "ins".to_string(),
            rating_value: ".star-rating strong.rating".to_string(),
            rating: ".star-rating".to_string(),
            attributes_table: "#tab-additional_information table.shop_attributes".to_string(),
            attribute_row: "tr".to_string(),
            attribute_label: "th".to_string(),
            attribute_value: "td".to_string(),
            gallery_image:
                ".woocommerce-product-gallery img, .woocommerce-main-image img, .product img"
                    .to_string(),
            image_attrs: strings(&["data-src", "data-lazy-src", "src", "srcset"]),
        }
    }
}
