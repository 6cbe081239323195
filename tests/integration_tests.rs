//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → HTTP requests → singer messages

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tap_rockgympro::cli::{Cli, Runner};
use tap_rockgympro::state::StateManager;
use tempfile::tempdir;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn config(server: &MockServer) -> String {
    json!({
        "api_user": "user",
        "api_key": "key",
        "base_url": server.uri(),
        "facilities": {
            "ABC": { "timezone": "America/Denver" }
        }
    })
    .to_string()
}

fn messages(out: Vec<u8>) -> Vec<Value> {
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn records<'a>(messages: &'a [Value], stream: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter(|m| m["type"] == "RECORD" && m["stream"] == stream)
        .map(|m| &m["record"])
        .collect()
}

fn types(messages: &[Value]) -> Vec<String> {
    messages
        .iter()
        .map(|m| match m["type"].as_str().unwrap() {
            "RECORD" => format!("RECORD:{}", m["stream"].as_str().unwrap()),
            other => other.to_string(),
        })
        .collect()
}

async fn mount_rgp(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/bookings/facility/ABC"))
        .and(basic_auth("user", "key"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookings": [{
                "bookingId": 10,
                "customerGuid": "g1",
                "bookingDate": "2025-03-01 10:00:00",
                "originalBookedTime": "2025-02-28 09:00:00",
                "cancelledOn": "2025-03-05 09:00:00"
            }],
            "rgpApiPaging": { "page": 1, "pageTotal": 1, "itemTotal": 1 }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/customers/facility/ABC"))
        .and(query_param("customerGuid", "g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customers": [{
                "customerGuid": "g1",
                "lastRecordEdit": "2025-02-01 00:00:00",
                "customerCreated": "2024-01-01 00:00:00"
            }],
            "rgpApiPaging": { "page": 1, "pageTotal": 1, "itemTotal": 1 }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/invoices/facility/ABC"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [
                {
                    "invoiceId": 1,
                    "customerGuid": "g1",
                    "invoicePostDate": "2025-06-01 12:00:00",
                    "payment": { "postdate": "2025-06-01 12:05:00" }
                },
                { "invoiceId": 2, "invoicePostDate": "2025-06-02 12:00:00" }
            ],
            "rgpApiPaging": { "page": 1, "pageTotal": 1, "itemTotal": 2 }
        })))
        .mount(server)
        .await;
}

async fn run(args: &[&str]) -> Vec<Value> {
    let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
    let out = Runner::new(cli).run_with(Vec::new()).await.unwrap();
    messages(out)
}

// ============================================================================
// Read Tests
// ============================================================================

#[tokio::test]
async fn test_read_emits_singer_messages() {
    let server = MockServer::start().await;
    mount_rgp(&server).await;
    let config = config(&server);

    let messages = run(&["tap-rockgympro", "--config-json", &config, "read"]).await;

    assert_eq!(
        types(&messages),
        vec![
            "SCHEMA",
            "SCHEMA",
            "SCHEMA",
            "RECORD:customers",
            "RECORD:bookings",
            "STATE",
            "RECORD:invoices",
            "STATE",
        ]
    );

    let booking = records(&messages, "bookings")[0];
    assert_eq!(booking["bookingDate"], "2025-03-01T10:00:00+00:00");
    assert_eq!(booking["cancelledOn"], "2025-03-05T09:00:00+00:00");
    assert_eq!(booking["facilityCode"], "ABC");

    let invoices = records(&messages, "invoices");
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0]["invoicePostDate"], "2025-06-01T12:00:00-06:00");
    assert_eq!(invoices[0]["payment"]["postdate"], "2025-06-01T12:05:00-06:00");

    let state = &messages.last().unwrap()["value"];
    assert_eq!(
        state,
        &json!({
            "bookmarks": {
                "bookings": { "ABC": "2025-03-05T09:00:00Z" },
                "invoices": { "ABC": "2025-06-01T18:00:00Z" }
            }
        })
    );
}

#[tokio::test]
async fn test_read_with_state_is_incremental() {
    let server = MockServer::start().await;
    mount_rgp(&server).await;
    let config = config(&server);
    let state = json!({
        "bookmarks": {
            "bookings": { "ABC": "2025-03-05T09:00:00Z" },
            "invoices": { "ABC": "2025-06-01T18:00:00Z" }
        }
    })
    .to_string();

    let messages = run(&[
        "tap-rockgympro",
        "--config-json",
        &config,
        "--state-json",
        &state,
        "read",
    ])
    .await;

    assert!(records(&messages, "bookings").is_empty());
    assert!(records(&messages, "invoices").is_empty());
    assert!(records(&messages, "customers").is_empty());
}

#[tokio::test]
async fn test_read_selected_streams() {
    let server = MockServer::start().await;
    mount_rgp(&server).await;
    let config = config(&server);

    let messages = run(&[
        "tap-rockgympro",
        "--config-json",
        &config,
        "read",
        "--streams",
        "invoices",
    ])
    .await;

    assert_eq!(types(&messages), vec!["SCHEMA", "RECORD:invoices", "STATE"]);
}

#[tokio::test]
async fn test_read_bookings_without_customers() {
    let server = MockServer::start().await;
    mount_rgp(&server).await;
    let config = config(&server);

    let messages = run(&[
        "tap-rockgympro",
        "--config-json",
        &config,
        "read",
        "--streams",
        "bookings",
    ])
    .await;

    assert_eq!(types(&messages), vec!["SCHEMA", "RECORD:bookings", "STATE"]);
}

#[tokio::test]
async fn test_read_persists_state_file() {
    let server = MockServer::start().await;
    mount_rgp(&server).await;

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let state_path = dir.path().join("state.json");
    std::fs::write(&config_path, config(&server)).unwrap();

    run(&[
        "tap-rockgympro",
        "-C",
        config_path.to_str().unwrap(),
        "-s",
        state_path.to_str().unwrap(),
        "read",
        "--persist-state",
    ])
    .await;

    let manager = StateManager::from_file(&state_path, false).unwrap();
    assert_eq!(
        manager
            .get_bookmark("invoices", "ABC")
            .await
            .map(|ts| ts.to_rfc3339()),
        Some("2025-06-01T18:00:00+00:00".to_string())
    );

    // second run starts from the saved bookmarks
    let messages = run(&[
        "tap-rockgympro",
        "-C",
        config_path.to_str().unwrap(),
        "-s",
        state_path.to_str().unwrap(),
        "read",
    ])
    .await;
    assert!(records(&messages, "invoices").is_empty());
}

#[tokio::test]
async fn test_read_retries_rate_limited_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/invoices/facility/ABC"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("retry-after", "1")
                .set_body_json(json!({"status": 429})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoices/facility/ABC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [{
                "invoiceId": 5,
                "customerGuid": "g5",
                "invoicePostDate": "2025-06-01 12:00:00",
                "payment": null
            }]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoices/facility/ABC"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"invoices": []})))
        .mount(&server)
        .await;

    let config = config(&server);
    let messages = run(&[
        "tap-rockgympro",
        "--config-json",
        &config,
        "read",
        "--streams",
        "invoices",
    ])
    .await;

    assert_eq!(records(&messages, "invoices").len(), 1);
}

#[tokio::test]
async fn test_read_fails_on_missing_timezone() {
    let config = json!({
        "api_user": "user",
        "api_key": "key",
        "facilities": { "ABC": {} }
    })
    .to_string();

    let cli = Cli::try_parse_from(["tap-rockgympro", "--config-json", &config, "read"]).unwrap();
    let err = Runner::new(cli).run_with(Vec::new()).await.unwrap_err();
    assert!(err.to_string().contains("ABC"));
}

#[tokio::test]
async fn test_read_with_unreadable_config_file_names_it() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    let cli = Cli::try_parse_from(["tap-rockgympro", "-C", missing.to_str().unwrap(), "read"])
        .unwrap();
    let err = Runner::new(cli).run_with(Vec::new()).await.unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Failed to read config file"));
    assert!(message.contains("missing.json"));
}

#[tokio::test]
async fn test_read_without_config_fails() {
    let cli = Cli::try_parse_from(["tap-rockgympro", "read"]).unwrap();
    assert!(Runner::new(cli).run_with(Vec::new()).await.is_err());
}

// ============================================================================
// Discover / Streams Tests
// ============================================================================

#[tokio::test]
async fn test_discover_prints_catalog() {
    let cli = Cli::try_parse_from(["tap-rockgympro", "discover"]).unwrap();
    let out = Runner::new(cli).run_with(Vec::new()).await.unwrap();
    let catalog: Value = serde_json::from_slice(&out).unwrap();

    let names: Vec<&str> = catalog["streams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stream"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["customers", "bookings", "invoices"]);
}

#[tokio::test]
async fn test_streams_lists_names() {
    let messages = run(&["tap-rockgympro", "streams"]).await;
    assert_eq!(
        messages,
        vec![json!({"type": "STREAMS", "streams": ["customers", "bookings", "invoices"]})]
    );
}
