use regex::Regex;
use std::sync::LazyLock;

/// Ten-character alphanumeric item token following a `/dp/` path segment
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Za-z0-9]{10})").expect("valid identifier regex"));

/// Extracts the catalog item identifier from a product URL
///
/// The identifier is the 10-character alphanumeric token that follows the
/// first `/dp/` segment. Anything after those ten characters is ignored.
///
/// # Examples
///
/// ```
/// use catalog_scout::url::extract_identifier;
///
/// let id = extract_identifier("https://www.amazon.com/Some-Mouse/dp/B08N5WRWNW/ref=sr_1_1");
/// assert_eq!(id.as_deref(), Some("B08N5WRWNW"));
///
/// assert_eq!(extract_identifier("https://www.amazon.com/s?k=mouse"), None);
/// ```
pub fn extract_identifier(url: &str) -> Option<String> {
    IDENTIFIER_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
