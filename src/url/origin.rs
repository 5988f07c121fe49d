use url::Url;

/// Extracts the origin (scheme, host and port) of a URL
///
/// The origin is the unit of request pacing: two requests to the same origin
/// must always be separated by a scheduled delay. Hosts are compared in
/// lowercase, and default ports are left implicit.
///
/// # Returns
///
/// * `Some(String)` - The serialized origin, e.g. `https://www.amazon.com`
/// * `None` - If the URL cannot be parsed or has an opaque origin
///
/// # Examples
///
/// ```
/// use catalog_scout::url::origin_of;
///
/// assert_eq!(
///     origin_of("https://WWW.Amazon.com/dp/B08N5WRWNW").as_deref(),
///     Some("https://www.amazon.com")
/// );
/// assert_eq!(origin_of("not a url"), None);
/// ```
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    if origin.is_tuple() {
        Some(origin.ascii_serialization())
    } else {
        None
    }
}
