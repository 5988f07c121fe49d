//! Scrape coordinator - run orchestration logic
//!
//! This module contains the loop that drives a scraping run:
//! - Walking search listings to collect product URLs
//! - Fetching product pages one at a time, paced per origin
//! - Assembling records and collecting run statistics
//! - Stopping cleanly on cancellation with the records gathered so far

use crate::config::Config;
use crate::crawler::fetcher::{FetchStatus, Fetcher};
use crate::crawler::walker::ListingWalker;
use crate::extract::{ProductRecord, RecordAssembler};
use crate::output::RunStatistics;
use crate::url::parse_target;
use futures::StreamExt;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of a multi-product run
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// Assembled records, in input order
    pub records: Vec<ProductRecord>,

    /// Counters collected during the run
    pub stats: RunStatistics,

    /// The run stopped early because cancellation was raised
    pub cancelled: bool,
}

/// Main scraper structure
pub struct Scraper {
    fetcher: Fetcher,
    assembler: RecordAssembler,
    base_url: Url,
}

impl Scraper {
    /// Creates a scraper from the run configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Scraper)` - Ready to scrape
    /// * `Err(ScoutError)` - Invalid catalog URL or fetch configuration
    pub fn new(config: &Config) -> crate::Result<Self> {
        let base_url = parse_target(&config.catalog.base_url)?;
        let fetcher = Fetcher::new(&config.fetch)?;
        Ok(Self::with_fetcher(fetcher, base_url))
    }

    /// Creates a scraper around an existing fetcher
    pub fn with_fetcher(fetcher: Fetcher, base_url: Url) -> Self {
        Self {
            fetcher,
            assembler: RecordAssembler::new(),
            base_url,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// The catalog root used for searches
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Scrapes a single product page
    ///
    /// # Returns
    ///
    /// * `Some(ProductRecord)` - The page was fetched and assembled
    /// * `None` - The page could not be fetched
    pub async fn scrape_product(&self, url: &str) -> Option<ProductRecord> {
        tracing::info!("Scraping product: {}", url);
        let fetch = self.fetcher.fetch(url).await;
        self.assembler.assemble(url, &fetch)
    }

    /// Scrapes several product pages in order
    ///
    /// Products are fetched one after another with one scheduled delay
    /// between consecutive products. A product that cannot be fetched is
    /// counted and skipped. Once `cancel` is raised no further product is
    /// requested and the records assembled so far are returned.
    pub async fn scrape_all(&self, urls: &[String], cancel: &CancellationToken) -> ScrapeReport {
        let mut report = ScrapeReport::default();
        let start_time = Instant::now();

        for (index, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if index > 0 && !self.fetcher.pause(&urls[index - 1], cancel).await {
                report.cancelled = true;
                break;
            }

            tracing::info!(
                "Processing product {}/{}: {}",
                index + 1,
                urls.len(),
                url
            );

            let fetch = self.fetcher.fetch_with_cancel(url, cancel).await;
            if fetch.status() == FetchStatus::Cancelled {
                report.cancelled = true;
                break;
            }
            report.stats.record_fetch(&fetch);

            match self.assembler.assemble(url, &fetch) {
                Some(record) => {
                    report.stats.record_product(&record);
                    report.records.push(record);
                }
                None => {
                    tracing::warn!(
                        status = ?fetch.status(),
                        attempts = fetch.attempts_used(),
                        "Failed to scrape {}",
                        url
                    );
                }
            }
        }

        if report.cancelled {
            tracing::warn!(
                "Run cancelled: returning {} records gathered so far",
                report.records.len()
            );
        }

        tracing::info!(
            "Scraped {} of {} products in {:?}",
            report.records.len(),
            urls.len(),
            start_time.elapsed()
        );

        report
    }

    /// Collects product URLs from `pages` pages of search results
    pub async fn search(&self, keyword: &str, pages: u32, cancel: &CancellationToken) -> Vec<String> {
        tracing::info!("Searching for '{}' across {} pages", keyword, pages);

        let urls: Vec<String> = ListingWalker::new(&self.fetcher, self.base_url.clone())
            .with_cancellation(cancel.clone())
            .walk(keyword, pages)
            .collect()
            .await;

        tracing::info!("Total products found: {}", urls.len());
        urls
    }

    /// Searches for `keyword` and scrapes up to `limit` of the products found
    pub async fn search_and_scrape(
        &self,
        keyword: &str,
        pages: u32,
        limit: usize,
        cancel: &CancellationToken,
    ) -> ScrapeReport {
        let mut urls = self.search(keyword, pages, cancel).await;

        if cancel.is_cancelled() {
            return ScrapeReport {
                cancelled: true,
                ..ScrapeReport::default()
            };
        }

        urls.truncate(limit);
        self.scrape_all(&urls, cancel).await
    }
}
