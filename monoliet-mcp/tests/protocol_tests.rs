//! MCP front end tests: JSON-RPC over stdio, the HTTP transport and `check`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use monoliet_core::{Config, N8nClient, RetryPolicy, ToolRegistry, WorkflowBackend};
use monoliet_mcp::check::{all_passed, run_checks};
use monoliet_mcp::server::MCPResponse;
use monoliet_mcp::{HttpServer, McpServer};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_n8n() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "1", "name": "Lead Intake", "active": true, "tags": ["sales"]},
                {"id": "2", "name": "Cleanup", "active": false}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;
    server
}

async fn unauthorized_n8n() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer) -> Config {
    Config::builder(server.uri(), "test-api-key")
        .timeout_secs(1)
        .build()
        .unwrap()
}

fn backend_for(server: &MockServer) -> Arc<dyn WorkflowBackend> {
    let client = N8nClient::new(&config_for(server))
        .unwrap()
        .with_retry_policy(RetryPolicy::none());
    Arc::new(client)
}

fn mcp_for(server: &MockServer) -> McpServer {
    McpServer::new(ToolRegistry::with_default_tools(backend_for(server)))
}

async fn rpc(server: &McpServer, request: Value) -> MCPResponse {
    server
        .handle_line(&request.to_string())
        .await
        .expect("request with id gets a response")
}

fn tool_text(response: &MCPResponse) -> (&str, bool) {
    let result = response.result.as_ref().unwrap();
    (
        result["content"][0]["text"].as_str().unwrap(),
        result["isError"].as_bool().unwrap(),
    )
}

#[tokio::test]
async fn test_initialize_and_ping() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let response = rpc(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await;
    let result = response.result.unwrap();
    assert_eq!(response.id, json!(1));
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "monoliet-n8n-mcp");
    assert!(result["capabilities"]["tools"].is_object());

    let response = rpc(&server, json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
    assert_eq!(response.result, Some(json!({})));
}

#[tokio::test]
async fn test_tools_list() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let response = rpc(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 11);
    assert_eq!(tools[0]["name"], "list_workflows");
    assert_eq!(tools[10]["name"], "get_workflow_health");
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn test_tools_call_success_is_pretty_json() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let response = rpc(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "list_workflows", "arguments": {"status": "all"}}
        }),
    )
    .await;

    let (text, is_error) = tool_text(&response);
    assert!(!is_error);
    assert!(text.contains('\n'));
    let data: Value = serde_json::from_str(text).unwrap();
    assert_eq!(data["total_count"], 2);
    assert_eq!(data["workflows"][0]["tags"], json!(["sales"]));
}

#[tokio::test]
async fn test_tools_call_failures() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let response = rpc(
        &server,
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "get_workflow_details"}}),
    )
    .await;
    assert_eq!(
        tool_text(&response),
        ("Error (validation_error): Missing required arguments: workflow_id", true)
    );

    let response = rpc(
        &server,
        json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "nope", "arguments": {}}}),
    )
    .await;
    assert_eq!(tool_text(&response), ("Error: Unknown tool: nope", true));
}

#[tokio::test]
async fn test_tools_call_remote_failure() {
    let n8n = unauthorized_n8n().await;
    let server = mcp_for(&n8n);

    let response = rpc(
        &server,
        json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "list_workflows"}}),
    )
    .await;
    assert_eq!(
        tool_text(&response),
        ("Error (n8n_error): Authentication failed: Unauthorized", true)
    );
}

#[tokio::test]
async fn test_protocol_errors() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let response = rpc(&server, json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {}})).await;
    assert_eq!(response.error.unwrap().code, -32602);

    let response = rpc(&server, json!({"jsonrpc": "2.0", "id": 8, "method": "resources/list"})).await;
    let error = response.error.unwrap();
    assert_eq!(error.code, -32601);
    assert_eq!(error.message, "Method not found: resources/list");

    let response = server.handle_line("{not json").await.unwrap();
    assert_eq!(response.id, Value::Null);
    assert_eq!(response.error.unwrap().code, -32700);

    let response = server.handle_line(r#"{"jsonrpc": "2.0", "id": 9}"#).await.unwrap();
    assert_eq!(response.id, json!(9));
    assert_eq!(response.error.unwrap().code, -32600);
}

#[tokio::test]
async fn test_serve_answers_requests_only() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}).to_string(),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        String::new(),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}).to_string(),
        json!({"jsonrpc": "2.0", "method": "tools/call", "params": {"name": "list_workflows"}}).to_string(),
        json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}).to_string(),
    ]
    .join("\n");

    let mut output = Vec::new();
    server
        .serve(input.as_bytes(), &mut output, CancellationToken::new())
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let ids: Vec<Value> = responses.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
    assert!(responses.iter().all(|r| r["jsonrpc"] == "2.0"));
}

#[tokio::test]
async fn test_serve_stops_on_shutdown() {
    let n8n = mock_n8n().await;
    let server = mcp_for(&n8n);

    let (_client, transport) = tokio::io::duplex(64);
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let mut output = Vec::new();
    server
        .serve(tokio::io::BufReader::new(transport), &mut output, shutdown)
        .await
        .unwrap();
    assert!(output.is_empty());
}

fn http_for(n8n: &MockServer, auth_token: Option<&str>) -> axum::Router {
    let backend = backend_for(n8n);
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    HttpServer::new(
        ToolRegistry::with_default_tools(Arc::clone(&backend)),
        backend,
        auth_token.map(String::from),
        addr,
    )
    .router()
}

async fn http(app: &axum::Router, method: Method, uri: &str, body: Option<Value>, auth: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_http_call() {
    let n8n = mock_n8n().await;
    let app = http_for(&n8n, None);

    let (status, body) = http(
        &app,
        Method::POST,
        "/call",
        Some(json!({"tool": "search_workflows", "arguments": {"query": "lead"}})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_matches"], 1);
    assert_eq!(body["error"], Value::Null);

    let (status, body) = http(&app, Method::POST, "/call", Some(json!({"tool": "delete_workflow"})), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "validation_error");

    let (status, body) = http(&app, Method::POST, "/call", Some(json!({"arguments": {}})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing tool name");

    let (status, body) = http(&app, Method::POST, "/call", Some(json!({"tool": "nope"})), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown tool: nope");
}

#[tokio::test]
async fn test_http_tools_and_health() {
    let n8n = mock_n8n().await;
    let app = http_for(&n8n, None);

    let (status, body) = http(&app, Method::GET, "/tools", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 11);
    assert_eq!(body["tools"].as_array().unwrap().len(), 11);

    let (status, body) = http(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tools_count"], 11);
    assert_eq!(body["n8n"]["message"], "Successfully connected to n8n");

    let down = unauthorized_n8n().await;
    let app = http_for(&down, None);
    let (status, body) = http(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().starts_with("Health check failed"));
}

#[tokio::test]
async fn test_http_auth_token() {
    let n8n = mock_n8n().await;
    let app = http_for(&n8n, Some("s3cret-token"));

    let (status, _) = http(&app, Method::GET, "/tools", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = http(&app, Method::GET, "/tools", None, Some("Bearer wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = http(&app, Method::GET, "/tools", None, Some("Bearer s3cret-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 11);

    let (status, _) = http(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_http_auth_checked_before_body() {
    let n8n = mock_n8n().await;
    let app = http_for(&n8n, Some("s3cret-token"));

    let malformed = |auth: Option<&str>| {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/call")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            request = request.header(header::AUTHORIZATION, auth);
        }
        request.body(Body::from("{not json")).unwrap()
    };

    let response = app.clone().oneshot(malformed(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Unauthorized");

    let response = app.clone().oneshot(malformed(Some("Bearer wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.clone().oneshot(malformed(Some("Bearer s3cret-token"))).await.unwrap();
    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = http(&app, Method::POST, "/call", Some(json!({"tool": "list_workflows"})), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_check_passes_against_healthy_n8n() {
    let n8n = mock_n8n().await;
    let outcomes = run_checks(&config_for(&n8n), backend_for(&n8n)).await;

    let names: Vec<&str> = outcomes.iter().map(|o| o.name).collect();
    assert_eq!(
        names,
        vec!["Configuration", "n8n Connection", "Workflow Listing", "API Permissions", "MCP Tools"]
    );
    assert!(all_passed(&outcomes), "{:?}", outcomes);
    assert_eq!(outcomes[2].message, "Found 2 workflow(s)");
}

#[tokio::test]
async fn test_check_reports_bad_api_key() {
    let n8n = unauthorized_n8n().await;
    let outcomes = run_checks(&config_for(&n8n), backend_for(&n8n)).await;

    assert!(!all_passed(&outcomes));
    assert!(outcomes[0].passed);
    assert!(!outcomes[1].passed);
    assert!(outcomes[1].message.starts_with("Cannot connect to n8n"));
    assert_eq!(outcomes[3].message, "API key invalid or insufficient permissions");
    assert!(outcomes[4].passed);
}
