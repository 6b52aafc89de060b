//! Helpers over `scraper` element references.

use scraper::ElementRef;
use url::Url;

/// Whitespace-normalized text of an element: trimmed text nodes joined by a space.
pub fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Some(text)` unless the text is empty.
pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Resolve `href` against `base`, returning `None` for empty or unusable references.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// First URL found by probing `attrs` in priority order.
///
/// Empty attributes are skipped. Set-valued attributes (`srcset`,
/// `data-srcset`) contribute the URL of their first candidate.
pub fn first_asset_url(element: ElementRef<'_>, attrs: &[String], base: &Url) -> Option<String> {
    attrs.iter().find_map(|attr| {
        let value = element.value().attr(attr)?.trim();
        if value.is_empty() {
            return None;
        }
        let candidate = if attr.ends_with("srcset") {
            value.split(',').next().unwrap_or(value)
        } else {
            value
        };
        let url = candidate.split_whitespace().next()?;
        resolve_url(base, url)
    })
}
