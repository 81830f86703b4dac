use analytics_infra::config::Config;
use chrono::{Duration as ChronoDuration, Local, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

const API_KEY: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let config = Config::from_lookup(|name| match name {
            "API_AUTH" => Some(API_KEY.to_string()),
            "MAX_AGE" => Some("30".to_string()),
            "REDIS_KEY" => Some("blackBox".to_string()),
            _ => None,
        })
        .expect("valid test config");

        let app = analytics_api::app::build_app(&config)
            .await
            .expect("in-memory services never fail");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn daily_label(created_at: i64) -> String {
    Local
        .timestamp_millis_opt(created_at)
        .unwrap()
        .format("%Y-%m-%d")
        .to_string()
}

async fn post_event(client: &reqwest::Client, srv: &TestServer, body: Value) -> reqwest::Response {
    client
        .post(srv.url("/event"))
        .header("Authorization", API_KEY)
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn get_analytics(client: &reqwest::Client, srv: &TestServer, query: &str) -> (StatusCode, Value) {
    let res = client
        .get(srv.url(&format!("/analytics?{query}")))
        .header("Authorization", API_KEY)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn info_endpoint_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"], "Analytics Engine is running.");
}

#[tokio::test]
async fn protected_endpoints_require_the_exact_key() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/stats", "/analytics?type=auth"] {
        let res = client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");

        let res = client
            .get(srv.url(path))
            .header("Authorization", format!("Bearer {API_KEY}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = client
        .post(srv.url("/event"))
        .json(&json!({"name": "login", "createdAt": 1, "type": "auth"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized.");
}

#[tokio::test]
async fn submitted_event_is_aggregated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created_at = Utc::now().timestamp_millis();

    let res = post_event(
        &client,
        &srv,
        json!({"name": "login", "createdAt": created_at, "type": "auth", "uniqueId": "alice"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"], "Event stored successfully!");

    let (status, body) = get_analytics(&client, &srv, "type=auth").await;
    assert_eq!(status, StatusCode::OK);

    let label = daily_label(created_at);
    assert_eq!(body["data"]["global"]["daily"][&label], 1);
    assert_eq!(body["data"]["usages"]["login"]["daily"][&label], 1);
    assert_eq!(body["data"]["global"]["weekly"].as_object().unwrap().len(), 1);
    assert_eq!(body["data"]["global"]["monthly"].as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn unique_id_filter_and_lookback_are_applied() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let now = Utc::now();
    let old = (now - ChronoDuration::days(10)).timestamp_millis();

    for (uid, created_at) in [("alice", now.timestamp_millis()), ("bob", now.timestamp_millis()), ("alice", old)] {
        let res = post_event(
            &client,
            &srv,
            json!({"name": "login", "createdAt": created_at, "type": "auth", "uniqueId": uid}),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let (_, body) = get_analytics(&client, &srv, "type=auth&uniqueId=alice").await;
    let daily = body["data"]["usages"]["login"]["daily"].as_object().unwrap();
    assert_eq!(daily.values().map(|v| v.as_u64().unwrap()).sum::<u64>(), 1);

    let (_, body) = get_analytics(&client, &srv, "type=auth&uniqueId=alice&lookback=30").await;
    let daily = body["data"]["global"]["daily"].as_object().unwrap();
    assert_eq!(daily.values().map(|v| v.as_u64().unwrap()).sum::<u64>(), 2);

    // Unparsable lookback falls back to the default instead of failing.
    let (status, _) = get_analytics(&client, &srv, "type=auth&lookback=soon").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_events_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_event(&client, &srv, json!({"createdAt": 1_700_000_000_000i64, "type": "auth"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("name"));

    let res = post_event(&client, &srv, json!({"name": "login", "createdAt": 1_700_000_000_000i64})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/event"))
        .header("Authorization", API_KEY)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
}

#[tokio::test]
async fn never_written_type_returns_empty_tables() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = get_analytics(&client, &srv, "type=nothing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({"global": {"daily": {}, "weekly": {}, "monthly": {}}, "usages": {}})
    );

    let (status, _) = get_analytics(&client, &srv, "lookback=7").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn flush_is_idempotent_and_clears_the_partition() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_event(
        &client,
        &srv,
        json!({"name": "login", "createdAt": Utc::now().timestamp_millis(), "type": "auth"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    for _ in 0..2 {
        let res = client
            .delete(srv.url("/analytics?type=auth"))
            .header("Authorization", API_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"], "Data flushed successfully!");
    }

    let (_, body) = get_analytics(&client, &srv, "type=auth").await;
    assert_eq!(body["data"]["usages"], json!({}));
}

#[tokio::test]
async fn stats_report_keys_and_uptime() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for event_type in ["auth", "billing"] {
        post_event(
            &client,
            &srv,
            json!({"name": "x", "createdAt": Utc::now().timestamp_millis(), "type": event_type}),
        )
        .await;
    }

    let res = client
        .get(srv.url("/stats"))
        .header("Authorization", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["total_keys"], 2);
    assert!(body["data"]["uptime_seconds"].is_u64());
    assert!(body["data"]["uptime"].is_string());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Route not found.");
}
