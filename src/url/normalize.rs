use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a user-supplied target URL
///
/// Only absolute HTTP(S) URLs with a host can be fetched.
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The URL is malformed, has another scheme, or no host
pub fn parse_target(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    Ok(url)
}

/// Builds the search-results URL for one page of a keyword search
///
/// The keyword is form-encoded into the `k` parameter and the 1-based page
/// number into `page`, on the `/s` path of the catalog root.
///
/// # Examples
///
/// ```
/// use catalog_scout::url::build_search_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.amazon.com").unwrap();
/// let url = build_search_url(&base, "wireless mouse", 2).unwrap();
/// assert_eq!(url.as_str(), "https://www.amazon.com/s?k=wireless+mouse&page=2");
/// ```
pub fn build_search_url(base: &Url, keyword: &str, page: u32) -> UrlResult<Url> {
    let mut url = base
        .join("/s")
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    url.query_pairs_mut()
        .clear()
        .append_pair("k", keyword.trim())
        .append_pair("page", &page.to_string());

    Ok(url)
}

/// Resolves a search-result link to a clean absolute item URL
///
/// Relative links are resolved against the catalog root; the query string
/// and fragment are stripped so that tracking parameters do not leak into
/// the item URL.
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: links
/// - non-HTTP(S) URLs after resolution
pub fn resolve_item_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_query(None);
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
