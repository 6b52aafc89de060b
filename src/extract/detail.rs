//! Detail page → enrichment fields.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{compile, parse_base, DetailSelectors, ExtractError};
use crate::models::EnrichedRecord;
use crate::utils::{first_asset_url, non_empty, text_of};

static RATING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").unwrap());

/// Fields read from a single detail page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub price: Option<String>,
    pub discount_price: Option<String>,
    pub rating: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub asset_url: Option<String>,
}

impl DetailFields {
    /// Copy the parsed fields onto `record`, leaving its errors untouched.
    pub fn apply_to(self, record: &mut EnrichedRecord) {
        record.price = self.price;
        record.discount_price = self.discount_price;
        record.rating = self.rating;
        record.attributes = self.attributes;
        record.asset_url = self.asset_url;
    }
}

/// Compiled detail-page selectors.
pub struct DetailParser {
    price: Selector,
    price_original: Selector,
    price_current: Selector,
    rating_value: Selector,
    rating: Selector,
    attributes_table: Selector,
    attribute_row: Selector,
    attribute_label: Selector,
    attribute_value: Selector,
    gallery_image: Selector,
    image_attrs: Vec<String>,
}

impl DetailParser {
    pub fn new(selectors: &DetailSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            price: compile(&selectors.price)?,
            price_original: compile(&selectors.price_original)?,
            price_current: compile(&selectors.price_current)?,
            rating_value: compile(&selectors.rating_value)?,
            rating: compile(&selectors.rating)?,
            attributes_table: compile(&selectors.attributes_table)?,
            attribute_row: compile(&selectors.attribute_row)?,
            attribute_label: compile(&selectors.attribute_label)?,
            attribute_value: compile(&selectors.attribute_value)?,
            gallery_image: compile(&selectors.gallery_image)?,
            image_attrs: selectors.image_attrs.clone(),
        })
    }

    /// Parse `markup` fetched from `page_url`. Relative asset URLs resolve
    /// against the page URL.
    pub fn parse(&self, markup: &str, page_url: &str) -> Result<DetailFields, ExtractError> {
        let base = parse_base(page_url)?;
        let document = Html::parse_document(markup);
        let root = document.root_element();

        let (price, discount_price) = self.prices(root);
        Ok(DetailFields {
            price,
            discount_price,
            rating: self.rating(root),
            attributes: self.attributes(root),
            asset_url: self.asset(root, &base),
        })
    }

    /// A struck-through price paired with a replacement means a sale;
    /// otherwise the whole block is the price.
    fn prices(&self, root: ElementRef<'_>) -> (Option<String>, Option<String>) {
        let Some(block) = root.select(&self.price).next() else {
            return (None, None);
        };
        let original = block.select(&self.price_original).next();
        let current = block.select(&self.price_current).next();
        match (original, current) {
            (Some(original), Some(current)) => (
                non_empty(text_of(original)),
                non_empty(text_of(current)),
            ),
            _ => (non_empty(text_of(block)), None),
        }
    }

    fn rating(&self, root: ElementRef<'_>) -> Option<String> {
        if let Some(value) = root.select(&self.rating_value).next() {
            return non_empty(text_of(value));
        }

        let container = root.select(&self.rating).next()?;
        let label = ["aria-label", "title"]
            .iter()
            .filter_map(|attr| container.value().attr(attr))
            .find(|v| !v.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| text_of(container));

        RATING_NUMBER
            .captures(&label)
            .map(|caps| caps[1].replace(',', "."))
    }

    fn attributes(&self, root: ElementRef<'_>) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        let Some(table) = root.select(&self.attributes_table).next() else {
            return attributes;
        };
        for row in table.select(&self.attribute_row) {
            let label = row.select(&self.attribute_label).next();
            let value = row.select(&self.attribute_value).next();
            if let (Some(label), Some(value)) = (label, value) {
                attributes.insert(text_of(label), text_of(value));
            }
        }
        attributes
    }

    fn asset(&self, root: ElementRef<'_>, base: &Url) -> Option<String> {
        let image = root.select(&self.gallery_image).next()?;
        first_asset_url(image, &self.image_attrs, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateItem;

    const PAGE_URL: &str = "https://shop.test/product/desk-lamp/";

    fn parser() -> DetailParser {
        DetailParser::new(&DetailSelectors::default()).unwrap()
    }

    #[test]
    fn test_sale_price_splits_original_and_discount() {
        let html = r#"<p class="price"><del><span>1.200 ₺</span></del> <ins><span>950 ₺</span></ins></p>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(fields.price.as_deref(), Some("1.200 ₺"));
        assert_eq!(fields.discount_price.as_deref(), Some("950 ₺"));
    }

    #[test]
    fn test_plain_price_block() {
        let html = r#"<p class="price"><span>750</span> <span>₺</span></p>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(fields.price.as_deref(), Some("750 ₺"));
        assert_eq!(fields.discount_price, None);
    }

    #[test]
    fn test_rating_from_label_normalizes_decimal_comma() {
        let html = r#"<div class="star-rating" aria-label="Rated 4,5 out of 5"></div>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(fields.rating.as_deref(), Some("4.5"));
    }

    #[test]
    fn test_structured_rating_wins() {
        let html = r#"<div class="star-rating" title="Rated 2 out of 5"><strong class="rating">4.75</strong></div>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(fields.rating.as_deref(), Some("4.75"));
    }

    #[test]
    fn test_rating_without_number_is_absent() {
        let html = r#"<div class="star-rating" aria-label="Not yet rated"></div>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(fields.rating, None);
    }

    #[test]
    fn test_attribute_rows_skip_incomplete() {
        let html = r#"
            <div id="tab-additional_information">
              <table class="shop_attributes">
                <tr><th>Color</th><td><p>Brass</p></td></tr>
                <tr><th>Orphan label</th></tr>
                <tr><th>Height</th><td>45 cm</td></tr>
              </table>
            </div>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(fields.attributes.len(), 2);
        assert_eq!(fields.attributes["Color"], "Brass");
        assert_eq!(fields.attributes["Height"], "45 cm");
    }

    #[test]
    fn test_gallery_image_resolves_against_page() {
        let html = r#"
            <div class="woocommerce-product-gallery">
              <img src="" srcset="images/lamp-800.jpg 800w, images/lamp-400.jpg 400w">
            </div>"#;
        let fields = parser().parse(html, PAGE_URL).unwrap();
        assert_eq!(
            fields.asset_url.as_deref(),
            Some("https://shop.test/product/desk-lamp/images/lamp-800.jpg")
        );
    }

    #[test]
    fn test_empty_page_has_no_fields() {
        let fields = parser().parse("<html></html>", PAGE_URL).unwrap();
        assert_eq!(fields, DetailFields::default());
    }

    #[test]
    fn test_apply_keeps_errors() {
        let mut record = EnrichedRecord::failed(CandidateItem::new(PAGE_URL), "earlier");
        DetailFields {
            price: Some("10".to_string()),
            ..Default::default()
        }
        .apply_to(&mut record);
        assert_eq!(record.price.as_deref(), Some("10"));
        assert_eq!(record.errors, vec!["earlier".to_string()]);
    }
}
