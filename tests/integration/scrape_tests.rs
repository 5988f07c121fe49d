use crate::support::{fast_config, fetcher, listing_page, product_page};
use catalog_scout::config::ExportFormat;
use catalog_scout::crawler::ListingWalker;
use catalog_scout::output::export_records;
use catalog_scout::Scraper;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_product(server: &MockServer, product_path: &str, title: &str, price: &str) {
    Mock::given(method("GET"))
        .and(path(product_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page(title, price)))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, page: &str, paths: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(paths)))
        .mount(server)
        .await;
}

fn scraper(server: &MockServer, max_retries: u32) -> Scraper {
    let base_url = Url::parse(&server.uri()).unwrap();
    Scraper::with_fetcher(fetcher(&fast_config(max_retries)), base_url)
}

#[tokio::test]
async fn test_scrape_product_end_to_end() {
    let server = MockServer::start().await;
    mount_product(&server, "/Wireless-Mouse/dp/B08N5WRWNW", "Wireless Mouse", "$19.99").await;

    let scraper = scraper(&server, 3);
    let record = scraper
        .scrape_product(&format!("{}/Wireless-Mouse/dp/B08N5WRWNW", server.uri()))
        .await
        .unwrap();

    assert_eq!(record.identifier(), Some("B08N5WRWNW"));
    assert_eq!(record.title(), Some("Wireless Mouse"));
    assert_eq!(record.price(), Some("$19.99"));
    assert_eq!(record.features().len(), 3);
    assert_eq!(record.rating(), None);
    assert_eq!(record.images().len(), 1);
}

#[tokio::test]
async fn test_scrape_all_isolates_failures() {
    let server = MockServer::start().await;
    mount_product(&server, "/dp/B000000001", "First Mouse", "$10.00").await;
    mount_product(&server, "/dp/B000000003", "Third Mouse", "£12.50").await;

    Mock::given(method("GET"))
        .and(path("/dp/B000000002"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let urls: Vec<String> = ["B000000001", "B000000002", "B000000003"]
        .iter()
        .map(|asin| format!("{}/dp/{}", server.uri(), asin))
        .collect();

    let report = scraper(&server, 2)
        .scrape_all(&urls, &CancellationToken::new())
        .await;

    assert!(!report.cancelled);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].title(), Some("First Mouse"));
    assert_eq!(report.records[1].title(), Some("Third Mouse"));
    assert_eq!(report.records[1].price(), Some("£12.50"));

    assert_eq!(report.stats.urls_attempted, 3);
    assert_eq!(report.stats.records_assembled, 2);
    assert_eq!(report.stats.fetches_exhausted, 1);
    assert_eq!(report.stats.total_attempts, 4);
}

#[tokio::test]
async fn test_walker_skips_failed_pages() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &["/A/dp/B000000001", "/B/dp/B000000002"]).await;
    mount_listing(&server, "3", &["/C/dp/B000000003"]).await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(1));
    let base_url = Url::parse(&server.uri()).unwrap();
    let links: Vec<String> = ListingWalker::new(&fetcher, base_url)
        .walk("wireless mouse", 3)
        .collect()
        .await;

    assert_eq!(
        links,
        vec![
            format!("{}/A/dp/B000000001", server.uri()),
            format!("{}/B/dp/B000000002", server.uri()),
            format!("{}/C/dp/B000000003", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_walker_sends_keyword() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "wireless mouse"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&["/A/dp/B000000001"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(1));
    let base_url = Url::parse(&server.uri()).unwrap();
    let links: Vec<String> = ListingWalker::new(&fetcher, base_url)
        .walk("wireless mouse", 1)
        .collect()
        .await;

    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_walker_is_lazy() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &["/A/dp/B000000001"]).await;
    mount_listing(&server, "2", &["/B/dp/B000000002"]).await;

    let fetcher = fetcher(&fast_config(1));
    let base_url = Url::parse(&server.uri()).unwrap();
    let walker = ListingWalker::new(&fetcher, base_url);
    let stream = walker.walk("mouse", 2);
    futures::pin_mut!(stream);

    let first = stream.next().await;
    assert_eq!(first, Some(format!("{}/A/dp/B000000001", server.uri())));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_search_and_scrape_with_limit() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        &["/A/dp/B000000001", "/B/dp/B000000002", "/C/dp/B000000003"],
    )
    .await;
    mount_product(&server, "/A/dp/B000000001", "Mouse A", "$10.00").await;
    mount_product(&server, "/B/dp/B000000002", "Mouse B", "$11.00").await;
    mount_product(&server, "/C/dp/B000000003", "Mouse C", "$12.00").await;

    let report = scraper(&server, 1)
        .search_and_scrape("mouse", 1, 2, &CancellationToken::new())
        .await;

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].identifier(), Some("B000000001"));
    assert_eq!(report.records[1].identifier(), Some("B000000002"));
    assert_eq!(report.stats.urls_attempted, 2);
}

#[tokio::test]
async fn test_cancellation_returns_partial_results() {
    let server = MockServer::start().await;
    mount_product(&server, "/dp/B000000001", "First Mouse", "$10.00").await;
    mount_product(&server, "/dp/B000000002", "Second Mouse", "$11.00").await;

    let mut config = fast_config(1);
    config.delay_min_secs = 30.0;
    config.delay_max_secs = 30.0;
    let scraper = Scraper::with_fetcher(fetcher(&config), Url::parse(&server.uri()).unwrap());

    let urls = vec![
        format!("{}/dp/B000000001", server.uri()),
        format!("{}/dp/B000000002", server.uri()),
    ];

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let report = scraper.scrape_all(&urls, &cancel).await;

    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(report.cancelled);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title(), Some("First Mouse"));
}

#[tokio::test]
async fn test_scraped_records_export() {
    let server = MockServer::start().await;
    mount_product(&server, "/dp/B08N5WRWNW", "Wireless Mouse", "$19.99").await;

    let report = scraper(&server, 1)
        .scrape_all(
            &[format!("{}/dp/B08N5WRWNW", server.uri())],
            &CancellationToken::new(),
        )
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let written = export_records(
        &report.records,
        dir.path(),
        &[ExportFormat::Csv, ExportFormat::Json],
    )
    .unwrap();

    let csv = std::fs::read_to_string(&written[0]).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("asin,url,title,price,availability,images,features,scraped_at")
    );
    let row = lines.next().unwrap();
    assert!(row.starts_with("B08N5WRWNW,"));
    assert!(row.contains("Ergonomic shape for all-day comfort | Up to 18 months of battery life"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
    assert_eq!(json[0]["title"], "Wireless Mouse");
    assert!(json[0].get("rating").is_none());
}

#[tokio::test]
async fn test_walker_delays_once_per_page() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &["/A/dp/B000000001"]).await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = fast_config(1);
    config.delay_min_secs = 0.25;
    config.delay_max_secs = 0.25;
    let fetcher = fetcher(&config);
    let base_url = Url::parse(&server.uri()).unwrap();

    let start = Instant::now();
    let links: Vec<String> = ListingWalker::new(&fetcher, base_url)
        .walk("mouse", 2)
        .collect()
        .await;
    let elapsed = start.elapsed();

    assert_eq!(links.len(), 1);
    // one delay after each page, the failed one included
    assert!(elapsed >= Duration::from_millis(500), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(750), "{:?}", elapsed);
}

#[tokio::test]
async fn test_scrape_all_delays_between_products() {
    let server = MockServer::start().await;
    mount_product(&server, "/dp/B000000001", "Mouse A", "$10.00").await;
    mount_product(&server, "/dp/B000000002", "Mouse B", "$11.00").await;
    mount_product(&server, "/dp/B000000003", "Mouse C", "$12.00").await;

    let mut config = fast_config(1);
    config.delay_min_secs = 0.25;
    config.delay_max_secs = 0.25;
    let scraper = Scraper::with_fetcher(fetcher(&config), Url::parse(&server.uri()).unwrap());

    let urls: Vec<String> = ["B000000001", "B000000002", "B000000003"]
        .iter()
        .map(|asin| format!("{}/dp/{}", server.uri(), asin))
        .collect();

    let start = Instant::now();
    let report = scraper.scrape_all(&urls, &CancellationToken::new()).await;
    let elapsed = start.elapsed();

    assert_eq!(report.records.len(), 3);
    // one delay between consecutive products, none after the last
    assert!(elapsed >= Duration::from_millis(500), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(750), "{:?}", elapsed);
}
