//! Listing walker for keyword searches
//!
//! Walks the search-result pages of one keyword in order and yields the item
//! URLs it finds as a lazy stream. Pages that cannot be fetched are skipped;
//! every page, fetched or not, is followed by one scheduled delay.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_listing;
use crate::url::build_search_url;
use futures::stream::{self, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Paginates keyword searches against one catalog
pub struct ListingWalker<'a> {
    fetcher: &'a Fetcher,
    base_url: Url,
    cancel: CancellationToken,
}

/// Progress of one walk, threaded through the stream
struct WalkState<'a> {
    fetcher: &'a Fetcher,
    base_url: Url,
    keyword: String,
    cancel: CancellationToken,
    page: u32,
    page_count: u32,
}

impl<'a> ListingWalker<'a> {
    /// Creates a walker that searches the catalog rooted at `base_url`
    pub fn new(fetcher: &'a Fetcher, base_url: Url) -> Self {
        Self {
            fetcher,
            base_url,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops the walk once `cancel` is raised
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Walks pages `1..=page_count` of the results for `keyword`
    ///
    /// Item URLs are yielded in page order and document order within a page.
    /// Duplicates across pages are not removed. The stream is lazy: no page is
    /// requested before the consumer polls for it, and dropping the stream
    /// stops the walk.
    pub fn walk(&self, keyword: &str, page_count: u32) -> impl Stream<Item = String> + 'a {
        let state = WalkState {
            fetcher: self.fetcher,
            base_url: self.base_url.clone(),
            keyword: keyword.to_string(),
            cancel: self.cancel.clone(),
            page: 1,
            page_count,
        };

        stream::unfold(state, |mut state| async move {
            if state.page > state.page_count || state.cancel.is_cancelled() {
                return None;
            }

            let links = walk_page(&state).await?;
            state.page += 1;
            Some((stream::iter(links), state))
        })
        .flatten()
    }
}

/// Fetches and parses the current page of a walk
///
/// # Returns
///
/// * `Some(links)` - Item links of the page, empty if the page failed
/// * `None` - The walk was cancelled during the fetch
async fn walk_page(state: &WalkState<'_>) -> Option<Vec<String>> {
    let url = match build_search_url(&state.base_url, &state.keyword, state.page) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(page = state.page, "Skipping search page: {}", e);
            return Some(Vec::new());
        }
    };

    tracing::info!(
        keyword = %state.keyword,
        page = state.page,
        "Searching page {}/{}",
        state.page,
        state.page_count
    );

    let result = state
        .fetcher
        .fetch_with_cancel(url.as_str(), &state.cancel)
        .await;

    let links = match result.body() {
        Some(body) => {
            let listing = parse_listing(body, &state.base_url);
            tracing::info!(
                page = state.page,
                results = listing.result_count,
                "Found {} products on page {}",
                listing.item_links.len(),
                state.page
            );
            listing.item_links
        }
        None if state.cancel.is_cancelled() => return None,
        None => {
            tracing::warn!(
                page = state.page,
                status = ?result.status(),
                "Failed to fetch search page {}",
                state.page
            );
            Vec::new()
        }
    };

    state.fetcher.pause(url.as_str(), &state.cancel).await;
    Some(links)
}
