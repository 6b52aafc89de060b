//! Listing tiles → candidate items.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::{compile, parse_base, ExtractError, TileSelectors};
use crate::models::CandidateItem;
use crate::utils::{first_asset_url, non_empty, resolve_url, text_of};

/// Compiled tile selectors.
pub struct TileExtractor {
    item: Selector,
    link: Selector,
    title: Selector,
    title_link: Selector,
    title_fallback: Selector,
    image: Selector,
    image_attrs: Vec<String>,
}

impl TileExtractor {
    pub fn new(selectors: &TileSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            item: compile(&selectors.item)?,
            link: compile(&selectors.link)?,
            title: compile(&selectors.title)?,
            title_link: compile(&selectors.title_link)?,
            title_fallback: compile(&selectors.title_fallback)?,
            image: compile(&selectors.image)?,
            image_attrs: selectors.image_attrs.clone(),
        })
    }

    /// Candidates in document order; duplicates are kept.
    ///
    /// Tiles without a usable link are dropped. Relative URLs resolve
    /// against `listing_url`.
    pub fn extract(&self, markup: &str, listing_url: &str) -> Result<Vec<CandidateItem>, ExtractError> {
        let base = parse_base(listing_url)?;
        let document = Html::parse_document(markup);

        let mut tiles = 0usize;
        let candidates: Vec<CandidateItem> = document
            .select(&self.item)
            .inspect(|_| tiles += 1)
            .filter_map(|tile| self.extract_tile(tile, &base))
            .collect();

        debug!(
            "Extracted {} candidates from {} listing tiles",
            candidates.len(),
            tiles
        );
        Ok(candidates)
    }

    fn extract_tile(&self, tile: ElementRef<'_>, base: &Url) -> Option<CandidateItem> {
        let href = tile.select(&self.link).next()?.value().attr("href")?;
        let detail_url = resolve_url(base, href)?;

        let preview_asset = tile
            .select(&self.image)
            .next()
            .and_then(|img| first_asset_url(img, &self.image_attrs, base));

        Some(
            CandidateItem::new(detail_url)
                .with_title(self.title(tile))
                .with_preview_asset(preview_asset),
        )
    }

    fn title(&self, tile: ElementRef<'_>) -> Option<String> {
        if let Some(node) = tile.select(&self.title).next() {
            let text = match node.select(&self.title_link).next() {
                Some(link) => text_of(link),
                None => text_of(node),
            };
            return non_empty(text);
        }
        tile.select(&self.title_fallback)
            .next()
            .map(text_of)
            .and_then(non_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_URL: &str = "https://shop.test/catalog/lamps/";

    const LISTING: &str = r#"
        <html><body>
        <div class="content-products-list"><ul>
          <li>
            <a href="/product/desk-lamp/"><img data-src="/img/desk.jpg" src="/placeholder.gif"></a>
            <h2 class="woo-loop-product__title"><a href="/product/desk-lamp/">
              Desk Lamp
            </a></h2>
          </li>
          <li>
            <a href="floor-lamp/"><img data-srcset="/img/floor-300.jpg 300w, /img/floor-600.jpg 600w"></a>
            <h3>Floor Lamp</h3>
          </li>
          <li><span>Sold out, no link</span></li>
          <li>
            <a href="https://shop.test/product/desk-lamp/#reviews">again</a>
          </li>
        </ul></div>
        </body></html>
    "#;

    fn extractor() -> TileExtractor {
        TileExtractor::new(&TileSelectors::default()).unwrap()
    }

    #[test]
    fn test_extracts_tiles_in_document_order() {
        let items = extractor().extract(LISTING, LISTING_URL).unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].detail_url, "https://shop.test/product/desk-lamp/");
        assert_eq!(items[0].preview_title.as_deref(), Some("Desk Lamp"));
        assert_eq!(
            items[0].preview_asset_url.as_deref(),
            Some("https://shop.test/img/desk.jpg")
        );

        assert_eq!(
            items[1].detail_url,
            "https://shop.test/catalog/lamps/floor-lamp/"
        );
        assert_eq!(items[1].preview_title.as_deref(), Some("Floor Lamp"));
        assert_eq!(
            items[1].preview_asset_url.as_deref(),
            Some("https://shop.test/img/floor-300.jpg")
        );
    }

    #[test]
    fn test_duplicates_are_kept_with_shared_key() {
        let items = extractor().extract(LISTING, LISTING_URL).unwrap();
        assert_eq!(items[2].dedup_key, items[0].dedup_key);
        assert_eq!(items[2].preview_title, None);
        assert_eq!(items[2].preview_asset_url, None);
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let extractor = extractor();
        let first = extractor.extract(LISTING, LISTING_URL).unwrap();
        let second = extractor.extract(LISTING, LISTING_URL).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_tiles() {
        let items = extractor()
            .extract("<html><body><p>empty</p></body></html>", LISTING_URL)
            .unwrap();
        assert!(items.is_empty());
    }
}
