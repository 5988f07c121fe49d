use crate::support::{fast_config, fetcher, product_page, CAPTCHA_PAGE};
use catalog_scout::{origin_of, FetchError, FetchStatus};
use std::time::{Duration, Instant};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_PATH: &str = "/Wireless-Mouse/dp/B08N5WRWNW";

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_clean_page_on_second_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("Wireless Mouse", "$19.99")),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(3));
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert_eq!(result.status(), FetchStatus::Success);
    assert_eq!(result.attempts_used(), 2);
    assert!(result.body().unwrap().contains("Wireless Mouse"));
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_always_unavailable_exhausts_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(3));
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert_eq!(result.status(), FetchStatus::Exhausted);
    assert_eq!(result.attempts_used(), 3);
    assert!(result.body().is_none());
    assert!(matches!(
        result.last_error(),
        Some(FetchError::Http { status: 503, .. })
    ));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_other_http_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(2));
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert_eq!(result.status(), FetchStatus::Exhausted);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_blocked_page_never_returned() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(3));
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert_eq!(result.status(), FetchStatus::Exhausted);
    assert!(result.body().is_none());
    assert!(result.last_error().is_some_and(FetchError::is_blocked));
    assert_eq!(request_count(&server).await, 3);

    let origin = origin_of(&server.uri()).unwrap();
    assert_eq!(fetcher.origin_state(&origin).unwrap().blocked_count, 3);
}

#[tokio::test]
async fn test_block_then_clean_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("Wireless Mouse", "$19.99")),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(3));
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert!(result.is_success());
    assert_eq!(result.attempts_used(), 2);
    assert!(!result.body().unwrap().to_lowercase().contains("captcha"));
}

#[tokio::test]
async fn test_consecutive_block_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .mount(&server)
        .await;

    let mut config = fast_config(5);
    config.max_consecutive_blocks = Some(2);
    let fetcher = fetcher(&config);
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert_eq!(result.status(), FetchStatus::Blocked);
    assert_eq!(result.attempts_used(), 2);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_block_streak_resets_on_other_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_PAGE))
        .mount(&server)
        .await;

    let mut config = fast_config(3);
    config.max_consecutive_blocks = Some(2);
    let fetcher = fetcher(&config);
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert_eq!(result.status(), FetchStatus::Exhausted);
    assert_eq!(result.attempts_used(), 3);
}

#[tokio::test]
async fn test_browser_identity_headers_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .and(header_exists("upgrade-insecure-requests"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("Wireless Mouse", "$19.99")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(1));
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;

    assert!(result.is_success());
}

#[tokio::test]
async fn test_same_origin_requests_are_paced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("Wireless Mouse", "$19.99")),
        )
        .mount(&server)
        .await;

    let mut config = fast_config(1);
    config.delay_min_secs = 0.2;
    config.delay_max_secs = 0.2;
    let fetcher = fetcher(&config);

    let first = fetcher.fetch(&format!("{}/dp/B000000001", server.uri())).await;
    assert!(first.is_success());

    let start = Instant::now();
    let second = fetcher.fetch(&format!("{}/dp/B000000002", server.uri())).await;
    assert!(second.is_success());
    assert!(start.elapsed() >= Duration::from_millis(200));

    let origin = origin_of(&server.uri()).unwrap();
    let state = fetcher.origin_state(&origin).unwrap();
    assert_eq!(state.request_count, 2);
}

#[tokio::test]
async fn test_pause_clears_pacing_debt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("Wireless Mouse", "$19.99")),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(&fast_config(1));
    let url = format!("{}{}", server.uri(), PRODUCT_PATH);
    let origin = origin_of(&url).unwrap();

    fetcher.fetch(&url).await;
    assert!(fetcher.origin_state(&origin).unwrap().needs_delay());

    assert!(fetcher.pause(&url, &Default::default()).await);
    assert!(!fetcher.origin_state(&origin).unwrap().needs_delay());
}

#[tokio::test]
async fn test_delays_only_between_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = fast_config(3);
    config.delay_min_secs = 0.25;
    config.delay_max_secs = 0.25;
    let fetcher = fetcher(&config);

    let start = Instant::now();
    let result = fetcher
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH))
        .await;
    let elapsed = start.elapsed();

    assert_eq!(result.attempts_used(), 3);
    // two delays between three attempts, none after the last
    assert!(elapsed >= Duration::from_millis(500), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(750), "{:?}", elapsed);
}

#[tokio::test]
async fn test_concurrent_fetches_to_one_origin_take_turns() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(product_page("Wireless Mouse", "$19.99")),
        )
        .mount(&server)
        .await;

    let mut config = fast_config(1);
    config.delay_min_secs = 0.3;
    config.delay_max_secs = 0.3;
    let fetcher = fetcher(&config);

    let first = fetcher.fetch(&format!("{}/dp/B000000001", server.uri())).await;
    assert!(first.is_success());

    let second_url = format!("{}/dp/B000000002", server.uri());
    let third_url = format!("{}/dp/B000000003", server.uri());
    let start = Instant::now();
    let (second, third) = tokio::join!(fetcher.fetch(&second_url), fetcher.fetch(&third_url));
    let elapsed = start.elapsed();

    assert!(second.is_success());
    assert!(third.is_success());
    // each of the two requests waits out its own delay
    assert!(elapsed >= Duration::from_millis(600), "{:?}", elapsed);

    let origin = origin_of(&server.uri()).unwrap();
    assert_eq!(fetcher.origin_state(&origin).unwrap().request_count, 3);
    assert_eq!(request_count(&server).await, 3);
}
