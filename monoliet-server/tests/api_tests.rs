//! Management API tests against a mock n8n upstream

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use monoliet_core::{Config, N8nClient, RetryPolicy};
use monoliet_server::ManagementServer;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "Bearer portal-token-123";
const PORTAL: &str = "https://portal.example.com";

fn app_for(server: &MockServer) -> Router {
    let config = Config::builder(server.uri(), "test-api-key")
        .timeout_secs(1)
        .mcp_port(9001)
        .management_port(9002)
        .portal_url(format!("{}/", PORTAL))
        .build()
        .unwrap();
    let client = N8nClient::new(&config)
        .unwrap()
        .with_retry_policy(RetryPolicy::none());
    ManagementServer::new(config, Arc::new(client)).router()
}

async fn send(app: &Router, method: Method, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(TOKEN)).await
}

fn workflows_json() -> Value {
    json!({
        "data": [
            {"id": "1", "name": "Lead Intake", "active": true, "tags": []},
            {"id": "2", "name": "Invoice Sync", "active": true, "tags": []},
            {"id": "3", "name": "Lead Cleanup", "active": false, "tags": []}
        ],
        "nextCursor": null
    })
}

async fn mount_workflows(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workflows_json()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_root_and_health_need_no_auth() {
    let server = MockServer::start().await;
    mount_workflows(&server).await;
    let app = app_for(&server);

    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "Monoliet MCP Management API");

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"healthy": true, "n8n_reachable": true, "database_connected": true, "errors": []})
    );
}

#[tokio::test]
async fn test_health_reports_unreachable_n8n() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad key"})))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["healthy"], false);
    assert_eq!(body["n8n_reachable"], false);
    assert_eq!(
        body["errors"][0],
        "n8n unreachable: Health check failed: Authentication failed: bad key"
    );
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let protected = [
        (Method::GET, "/status"),
        (Method::GET, "/workflows"),
        (Method::GET, "/workflows/stats"),
        (Method::GET, "/workflows/1"),
        (Method::POST, "/workflows/1/activate"),
        (Method::POST, "/workflows/1/deactivate"),
        (Method::POST, "/workflows/1/execute"),
        (Method::GET, "/config"),
        (Method::PUT, "/config"),
    ];

    for (method, uri) in protected {
        let (status, body) = send(&app, method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body, json!({"detail": "Missing authorization header"}));
    }

    // n8n must never be contacted without a valid token
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_auth_rejections() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    let cases = [
        ("Basic dXNlcjpwYXNzd29yZA==", "Invalid authentication scheme. Use 'Bearer <token>'"),
        ("Bearer", "Invalid authorization header format. Use 'Bearer <token>'"),
        ("Bearer short", "Invalid token"),
    ];

    for (header_value, detail) in cases {
        let (status, body) = send(&app, Method::GET, "/config", Some(header_value)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], detail);
    }
}

#[tokio::test]
async fn test_status_and_config() {
    let server = MockServer::start().await;
    mount_workflows(&server).await;
    let app = app_for(&server);

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
    assert_eq!(body["n8n_connected"], true);
    assert_eq!(body["n8n_url"], server.uri());
    assert_eq!(body["mcp_port"], 9001);
    assert_eq!(body["management_port"], 9002);
    assert!(body["uptime_seconds"].as_f64().unwrap() >= 0.0);
    assert!(body["timestamp"].is_string());

    let (status, body) = get(&app, "/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "n8n_url": server.uri(),
            "n8n_api_key_set": true,
            "mcp_server_port": 9001,
            "management_api_port": 9002,
            "log_level": "INFO"
        })
    );
    assert!(!body.to_string().contains("test-api-key"));

    let (status, body) = send(&app, Method::PUT, "/config", Some(TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert!(body["detail"].as_str().unwrap().contains("restart"));
}

#[tokio::test]
async fn test_status_degraded_when_n8n_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["n8n_connected"], false);
}

#[tokio::test]
async fn test_list_workflows_filters() {
    let server = MockServer::start().await;
    mount_workflows(&server).await;
    let app = app_for(&server);

    let (status, body) = get(&app, "/workflows").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let (_, body) = get(&app, "/workflows?active_only=true").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get(&app, "/workflows?search=LEAD").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get(&app, "/workflows?active_only=true&search=lead").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["workflows"][0]["name"], "Lead Intake");
}

#[tokio::test]
async fn test_workflow_stats() {
    let server = MockServer::start().await;
    mount_workflows(&server).await;

    let today = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
    Mock::given(method("GET"))
        .and(path("/api/v1/executions"))
        .and(query_param("limit", "250"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "workflowId": "1", "finished": true, "startedAt": today},
                {"id": 2, "workflowId": "2", "finished": true, "startedAt": today, "stoppedAt": today},
                {"id": 3, "workflowId": "2", "finished": true, "startedAt": "2020-01-01T00:00:00.000Z"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server);

    let (status, body) = get(&app, "/workflows/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "total_workflows": 3,
            "active_workflows": 2,
            "paused_workflows": 1,
            "error_workflows": 1,
            "total_executions_today": 2,
            "success_rate": 50.0
        })
    );
}

#[tokio::test]
async fn test_get_workflow_maps_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"id": "1", "name": "Lead Intake", "active": true, "versionId": "v1"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Workflow not found"})),
        )
        .mount(&server)
        .await;
    let app = app_for(&server);

    let (status, body) = get(&app, "/workflows/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["workflow"]["versionId"], "v1");

    let (status, body) = get(&app, "/workflows/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        "Failed to get workflow: Resource not found: Workflow not found"
    );
}

#[tokio::test]
async fn test_upstream_failure_is_500_with_action() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;
    let app = app_for(&server);

    let (status, body) = get(&app, "/workflows").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Failed to list workflows: n8n API error: boom");
}

#[tokio::test]
async fn test_activate_and_execute() {
    let server = MockServer::start().await;
    let stored = json!({
        "id": "3",
        "name": "Lead Cleanup",
        "active": false,
        "tags": [],
        "nodes": [],
        "connections": {},
        "settings": {}
    });
    let mut activated = stored.clone();
    activated["active"] = json!(true);

    Mock::given(method("GET"))
        .and(path("/api/v1/workflows/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/workflows/3"))
        .and(body_json(activated.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(activated))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/3/execute"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 77, "finished": false})),
        )
        .mount(&server)
        .await;
    let app = app_for(&server);

    let (status, body) = send(&app, Method::POST, "/workflows/3/activate", Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["workflow_id"], "3");
    assert_eq!(body["data"]["active"], true);

    let (status, body) = send(&app, Method::POST, "/workflows/3/execute", Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "workflow_id": "3", "execution_id": "77"})
    );
}

#[tokio::test]
async fn test_cors_allows_portal_origins() {
    let server = MockServer::start().await;
    let app = app_for(&server);

    for origin in ["http://localhost:8000", PORTAL] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/status")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            origin
        );
    }

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/status")
        .header(header::ORIGIN, "https://evil.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
