//! HTML parser for search-result listing pages
//!
//! This module handles parsing one page of search results to extract:
//! - Links to the product pages of each result entry
//! - The number of result entries on the page

use crate::url::resolve_item_link;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// One result entry on a listing page
static RESULT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-component-type="s-search-result"]"#).expect("valid result selector")
});

/// The title link inside a result entry
static RESULT_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2 a[href]").expect("valid result link selector"));

/// Extracted information from a listing page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Absolute item URLs, in document order
    pub item_links: Vec<String>,

    /// Number of result entries on the page, with or without a usable link
    pub result_count: usize,
}

/// Parses a listing page and extracts the item links of its result entries
///
/// # Link Extraction Rules
///
/// **Include:**
/// - Every `<a href>` inside the `<h2>` of each result entry, in document order
///
/// **Exclude:**
/// - Sponsored widgets and navigation outside result entries
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only links
///
/// Relative links resolve against `base_url`; query strings and fragments are
/// stripped from the resolved item URL.
///
/// # Example
///
/// ```
/// use catalog_scout::crawler::parse_listing;
/// use url::Url;
///
/// let html = r#"<div data-component-type="s-search-result">
///     <h2><a href="/Mouse/dp/B08N5WRWNW/ref=sr_1_1?keywords=mouse">Mouse</a></h2>
/// </div>"#;
/// let base = Url::parse("https://www.amazon.com").unwrap();
/// let page = parse_listing(html, &base);
/// assert_eq!(page.item_links, vec!["https://www.amazon.com/Mouse/dp/B08N5WRWNW/ref=sr_1_1"]);
/// ```
pub fn parse_listing(html: &str, base_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();

    for entry in document.select(&RESULT_SELECTOR) {
        page.result_count += 1;

        let links: Vec<String> = entry
            .select(&RESULT_LINK_SELECTOR)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(|href| resolve_item_link(href, base_url))
            .collect();

        if links.is_empty() {
            tracing::debug!("Result entry without a usable item link");
        }
        page.item_links.extend(links);
    }

    page
}
