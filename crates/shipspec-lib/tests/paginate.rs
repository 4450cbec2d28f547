mod common;

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use common::{page_envelope, ship_records, FakeApi, Reply};
use shipspec_lib::{
    ApiConfig, Catalog, CatalogQuery, Error, FixedCooldown, MissingPagePolicy, NoProgress,
    PaginatedCollector, RateLimitedFetcher, Unthrottled,
};

fn config() -> ApiConfig {
    ApiConfig {
        base_url: "https://api.example.test/wows".to_string(),
        application_id: Some("test-key".to_string()),
        ..ApiConfig::default()
    }
}

/// 250 ships over three pages of 100, 100 and 50 records.
fn three_page_api() -> FakeApi {
    FakeApi::new().pages(
        "ships",
        vec![
            page_envelope(ship_records(0..100), 1, 3, 250),
            page_envelope(ship_records(100..200), 2, 3, 250),
            page_envelope(ship_records(200..250), 3, 3, 250),
        ],
    )
}

fn collector(api: &FakeApi) -> PaginatedCollector<&FakeApi, Unthrottled> {
    PaginatedCollector::new(RateLimitedFetcher::new(api, Unthrottled))
}

#[test]
fn collects_every_page_and_reports_progress() {
    let api = three_page_api();
    let query = CatalogQuery::ships(&config()).unwrap();
    let mut updates = Vec::new();
    let mut sink = |total: u64, count: u64| updates.push((total, count));

    let catalog: Catalog<Value> = collector(&api).collect(&query, &mut sink).unwrap();

    assert_eq!(catalog.len(), 250);
    assert_eq!(updates, vec![(250, 0), (250, 100), (250, 200), (250, 250)]);
    assert_eq!(updates.last(), Some(&(250, 250)));
}

#[test]
fn pages_are_requested_once_each_in_order() {
    let api = three_page_api();
    let query = CatalogQuery::ships(&config()).unwrap();

    let _: Catalog<Value> = collector(&api).collect(&query, &mut NoProgress).unwrap();

    assert_eq!(api.requested_pages("ships"), vec![1, 2, 3]);
    let first = &api.requests()[0];
    let params: Vec<(String, String)> = first.query_pairs().into_owned().collect();
    assert!(params.contains(&("application_id".to_string(), "test-key".to_string())));
    assert!(params.contains(&("limit".to_string(), "100".to_string())));
    assert!(params.contains(&("language".to_string(), "en".to_string())));
}

#[test]
fn single_page_catalog_needs_one_request() {
    let api = FakeApi::new().pages("ships", vec![page_envelope(ship_records(0..3), 1, 1, 3)]);
    let query = CatalogQuery::ships(&config()).unwrap();

    let catalog: Catalog<Value> = collector(&api).collect(&query, &mut NoProgress).unwrap();

    assert_eq!(catalog.len(), 3);
    assert_eq!(api.requested_pages("ships"), vec![1]);
}

#[test]
fn unavailable_page_aborts_with_page_index() {
    let api = three_page_api().reply("ships", 2, Reply::Status(503));
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    match err {
        Error::FetchFailed { page, status } => {
            assert_eq!(page, 2);
            assert_eq!(status, 503);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // no request after the failing page
    assert_eq!(api.requested_pages("ships"), vec![1, 2]);
}

#[test]
fn skip_policy_merges_the_remaining_pages() {
    let api = three_page_api().reply("ships", 2, Reply::Status(503));
    let query = CatalogQuery::ships(&config()).unwrap();
    let mut updates = Vec::new();
    let mut sink = |total: u64, count: u64| updates.push((total, count));

    let catalog: Catalog<Value> = collector(&api)
        .with_policy(MissingPagePolicy::Skip)
        .collect(&query, &mut sink)
        .unwrap();

    assert_eq!(catalog.len(), 150);
    assert!(catalog.contains_key(&0) && catalog.contains_key(&249));
    assert!(!catalog.contains_key(&150));
    assert_eq!(updates, vec![(250, 0), (250, 100), (250, 100), (250, 150)]);
}

#[test]
fn skip_policy_still_requires_the_first_page() {
    let api = three_page_api().reply("ships", 1, Reply::Status(500));
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .with_policy(MissingPagePolicy::Skip)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, Error::FetchFailed { page: 1, status: 500 }));
}

#[test]
fn network_error_aborts_the_collection() {
    let api = three_page_api().reply("ships", 3, Reply::NetworkError);
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .with_policy(MissingPagePolicy::Skip)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    assert!(err.to_string().starts_with("page 3 could not be fetched"), "{err}");
    match err {
        Error::Transport { page, source } => {
            assert_eq!(page, 3);
            assert!(matches!(*source, Error::Io(_)), "got {source:?}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_page_names_the_page() {
    let api = three_page_api().reply("ships", 3, Reply::Page(json!({"data": {}})));
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { page: 3, .. }), "got {err:?}");
}

#[test]
fn non_json_body_names_the_page() {
    let api = three_page_api().reply(
        "ships",
        2,
        Reply::Text("<html><body>Down for maintenance</body></html>".to_string()),
    );
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { page: 2, .. }), "got {err:?}");
}

#[test]
fn api_error_status_is_surfaced() {
    let api = FakeApi::new().reply(
        "ships",
        1,
        Reply::Page(json!({
            "status": "error",
            "error": {"field": "application_id", "message": "INVALID_APPLICATION_ID", "code": 407, "value": "test-key"}
        })),
    );
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, Error::Api { page: 1, code: 407, .. }), "got {err:?}");
}

#[test]
fn short_counts_are_reported_as_incomplete() {
    let api = FakeApi::new().pages(
        "ships",
        vec![
            page_envelope(ship_records(0..100), 1, 2, 250),
            page_envelope(ship_records(100..200), 2, 2, 250),
        ],
    );
    let query = CatalogQuery::ships(&config()).unwrap();

    let err = collector(&api)
        .collect::<Value>(&query, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::IncompleteCatalog {
            expected: 250,
            received: 200
        }
    ));
}

#[test]
fn later_pages_overwrite_colliding_ids() {
    let api = FakeApi::new().pages(
        "ships",
        vec![
            page_envelope(vec![(7, json!({"name": "old"}))], 1, 2, 2),
            page_envelope(vec![(7, json!({"name": "new"}))], 2, 2, 2),
        ],
    );
    let query = CatalogQuery::ships(&config()).unwrap();

    let catalog: Catalog<Value> = collector(&api).collect(&query, &mut NoProgress).unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[&7]["name"], json!("new"));
}

#[test]
fn cooldown_spaces_consecutive_requests() {
    let api = three_page_api();
    let query = CatalogQuery::ships(&config()).unwrap();
    let collector = PaginatedCollector::new(RateLimitedFetcher::new(
        &api,
        FixedCooldown::new(Duration::from_millis(40)),
    ));

    let started = Instant::now();
    let catalog: Catalog<Value> = collector.collect(&query, &mut NoProgress).unwrap();

    assert_eq!(catalog.len(), 250);
    assert!(started.elapsed() >= Duration::from_millis(120));
}
