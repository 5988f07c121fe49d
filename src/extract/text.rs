use scraper::ElementRef;

/// Collects the visible text of an element
///
/// Every descendant text node is trimmed, empty nodes are dropped and the rest
/// are joined with single spaces, so markup-induced whitespace never reaches
/// a record.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trims a candidate value, returning None if nothing is left
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
