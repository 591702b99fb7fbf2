//! Integration tests for API routes.
//!
//! Uses `tower::ServiceExt` to test Axum routes without a real HTTP server.
//! Etherscan is replaced by a local axum app bound to an ephemeral port.
//!
//! ```bash
//! cargo test -p ledgerlens-api --test integration
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::extract::Query;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use serde_json::{Value, json};
use tower::ServiceExt;

use ledgerlens_api::routes::create_router;
use ledgerlens_api::state::AppState;
use ledgerlens_common::config::AppConfig;

// ============================================================
// Helpers
// ============================================================

const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
const COUNTERPARTY: &str = "0x4444444444444444444444444444444444444444";

/// Serve fixed `txlist` / `tokentx` bodies and count requests.
async fn spawn_etherscan(txlist: Value, tokentx: Value) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let app = Router::new().route(
        "/api",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let txlist = txlist.clone();
            let tokentx = tokentx.clone();
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                match params.get("action").map(String::as_str) {
                    Some("txlist") => axum::Json(txlist),
                    _ => axum::Json(tokentx),
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), calls)
}

fn test_config(api_url: String, api_key: Option<&str>) -> AppConfig {
    AppConfig {
        etherscan_api_key: api_key.map(str::to_string),
        etherscan_api_url: api_url,
        explorer_url: "https://etherscan.io".to_string(),
        upstream_timeout_secs: 5,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_json: false,
    }
}

fn build_app(api_url: String, api_key: Option<&str>) -> Router {
    let state = AppState::new(&test_config(api_url, api_key)).unwrap();
    create_router(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn no_transactions() -> Value {
    json!({"status": "0", "message": "No transactions found", "result": []})
}

// ============================================================
// Liveness
// ============================================================

#[tokio::test]
async fn test_ping_endpoint() {
    let app = build_app("http://127.0.0.1:9/api".to_string(), None);
    let (status, json) = get_json(app, "/api/ping").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"ok": true}));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_app("http://127.0.0.1:9/api".to_string(), None);
    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "ledgerlens-api");
}

// ============================================================
// Validation
// ============================================================

#[tokio::test]
async fn test_invalid_requests_never_reach_etherscan() {
    let (url, calls) = spawn_etherscan(no_transactions(), no_transactions()).await;

    let bad_uris = [
        // missing 0x prefix
        "/api/transactions?address=742d35Cc6634C0532925a3b844Bc454e4438f44e00",
        // wrong length
        "/api/transactions?address=0x742d35Cc6634C0532925a3b844Bc454e4438f4",
        // non-hex characters
        "/api/transactions?address=0x742d35Cc6634C0532925a3b844Bc454e4438fxyz",
        // missing address
        "/api/transactions",
        "/api/transactions?limit=10",
    ];

    for uri in bad_uris {
        let (status, json) = get_json(build_app(url.clone(), Some("key")), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
        assert!(json["error"].is_string());
    }

    for limit in ["0", "201", "-1", "ten"] {
        let uri = format!("/api/transactions?address={ADDRESS}&limit={limit}");
        let (status, _) = get_json(build_app(url.clone(), Some("key")), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "limit: {limit}");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================
// Feed
// ============================================================

#[tokio::test]
async fn test_zero_activity_returns_empty_feed() {
    let (url, calls) = spawn_etherscan(no_transactions(), no_transactions()).await;
    let app = build_app(url, Some("key"));

    let (status, json) = get_json(app, &format!("/api/transactions?address={ADDRESS}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "address": ADDRESS,
            "returned": 0,
            "counts": {"ETH": 0, "ERC20": 0},
            "items": []
        })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_feed_document_shape() {
    let txlist = json!({
        "status": "1",
        "message": "OK",
        "result": [{
            "timeStamp": "1700000100",
            "hash": "0xaaa",
            "from": ADDRESS.to_lowercase(),
            "to": COUNTERPARTY,
            "value": "1500000000000000000",
            "isError": "1",
            "txreceipt_status": "0",
            "functionName": "swapExactETHForTokens(uint256 amountOutMin, address[] path)"
        }]
    });
    let tokentx = json!({
        "status": "1",
        "message": "OK",
        "result": [{
            "timeStamp": "1700000200",
            "hash": "0xbbb",
            "from": COUNTERPARTY,
            "to": ADDRESS,
            "value": "1000000000000000000000",
            "contractAddress": "0x6b175474e89094c44da98b954eedeac495271d0f",
            "tokenSymbol": "DAI",
            "tokenDecimal": "18"
        }]
    });
    let (url, _) = spawn_etherscan(txlist, tokentx).await;
    let app = build_app(url, Some("key"));

    let (status, json) =
        get_json(app, &format!("/api/transactions?address={ADDRESS}&limit=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["returned"], 1);
    assert_eq!(json["counts"], json!({"ETH": 0, "ERC20": 1}));

    let item = &json["items"][0];
    assert_eq!(item["type"], "ERC20");
    assert_eq!(item["hash"], "0xbbb");
    assert_eq!(item["direction"], "in");
    assert_eq!(item["amount"], "1000");
    assert_eq!(item["symbol"], "DAI");
    assert_eq!(item["time_utc"], "2023-11-14T22:16:40Z");
    assert_eq!(item["link"], "https://etherscan.io/tx/0xbbb");
}

#[tokio::test]
async fn test_native_item_fields() {
    let txlist = json!({
        "status": "1",
        "message": "OK",
        "result": [{
            "timeStamp": "1700000100",
            "hash": "0xaaa",
            "from": ADDRESS.to_lowercase(),
            "to": COUNTERPARTY,
            "value": "1500000000000000000",
            "isError": "1",
            "txreceipt_status": "0",
            "functionName": "swapExactETHForTokens(uint256 amountOutMin, address[] path)"
        }]
    });
    let (url, _) = spawn_etherscan(txlist, no_transactions()).await;
    let app = build_app(url, Some("key"));

    let (status, json) = get_json(app, &format!("/api/transactions?address={ADDRESS}")).await;

    assert_eq!(status, StatusCode::OK);
    let item = &json["items"][0];
    assert_eq!(item["type"], "ETH");
    assert_eq!(item["direction"], "out");
    assert_eq!(item["amount"], "1.5");
    assert_eq!(item["status"], "failed");
    assert_eq!(item["functionName"], "swapExactETHForTokens");
    assert!(item.get("tokenContract").is_none());
}

// ============================================================
// Error translation
// ============================================================

#[tokio::test]
async fn test_rate_limit_maps_to_429() {
    let (url, _) = spawn_etherscan(
        json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"}),
        no_transactions(),
    )
    .await;
    let app = build_app(url, Some("key"));

    let (status, json) = get_json(app, &format!("/api/transactions?address={ADDRESS}")).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "Etherscan: Max rate limit reached");
}

#[tokio::test]
async fn test_notok_maps_to_502() {
    let (url, _) = spawn_etherscan(
        no_transactions(),
        json!({"status": "0", "message": "NOTOK", "result": "Invalid API Key"}),
    )
    .await;
    let app = build_app(url, Some("key"));

    let (status, json) = get_json(app, &format!("/api/transactions?address={ADDRESS}")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Etherscan error: Invalid API Key");
}

#[tokio::test]
async fn test_unreachable_upstream_maps_to_502() {
    // Nothing listens on the discard port
    let app = build_app("http://127.0.0.1:9/api".to_string(), Some("key"));

    let (status, json) = get_json(app, &format!("/api/transactions?address={ADDRESS}")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(!json["error"].as_str().unwrap().contains("apikey"));
}

#[tokio::test]
async fn test_missing_api_key_maps_to_500() {
    let (url, calls) = spawn_etherscan(no_transactions(), no_transactions()).await;

    for key in [None, Some("PASTE_YOUR_KEY_HERE")] {
        let app = build_app(url.clone(), key);
        let (status, json) =
            get_json(app, &format!("/api/transactions?address={ADDRESS}")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("API key"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
