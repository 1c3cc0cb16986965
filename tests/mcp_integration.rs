//! Integration tests for MCP protocol handling.
//!
//! These tests verify the JSON-RPC 2.0 protocol implementation, the session
//! lifecycle, and the HTTP transports' framing (session headers, health
//! endpoint), without touching a real Crawl4AI backend.

use std::sync::Arc;

use serde_json::{json, Value};

use crawl4ai_mcp::backend::Crawl4aiClient;
use crawl4ai_mcp::config::Settings;
use crawl4ai_mcp::mcp::http::{sse_app, streamable_app, SseState, StreamableState};
use crawl4ai_mcp::mcp::protocol::{parse_message, IncomingMessage, RequestId};
use crawl4ai_mcp::mcp::McpSession;
use crawl4ai_mcp::tools::{default_registry, ToolRegistry};

// =============================================================================
// Helpers
// =============================================================================

fn test_settings() -> Settings {
    Settings::from_lookup(|name| {
        (name == "CRAWL4AI_ENDPOINT").then(|| "https://crawler.example".to_string())
    })
    .unwrap()
}

fn full_registry() -> Arc<ToolRegistry> {
    let settings = test_settings();
    let client = Arc::new(Crawl4aiClient::new(&settings).unwrap());
    Arc::new(default_registry(&client))
}

async fn initialized_session() -> McpSession {
    let mut session = McpSession::new(full_registry());

    let init = parse_message(
        r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05", "capabilities": {},
                       "clientInfo": {"name": "test-client", "version": "1.0.0"}}}"#,
    )
    .unwrap();
    session.handle_message(init).await.unwrap().unwrap();

    let initialized =
        parse_message(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#).unwrap();
    assert!(session.handle_message(initialized).await.is_none());

    session
}

async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("axum serve");
    });
    format!("http://{addr}")
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let result = parse_message(json);
    assert!(result.is_ok());

    if let IncomingMessage::Request(req) = result.unwrap() {
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, RequestId::Number(1));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_notification() {
    let json = r#"{
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }"#;

    let result = parse_message(json);
    assert!(result.is_ok());

    if let IncomingMessage::Notification(notif) = result.unwrap() {
        assert_eq!(notif.method, "notifications/initialized");
    } else {
        panic!("Expected Notification");
    }
}

#[test]
fn test_parse_invalid_json() {
    let result = parse_message("not valid json");
    assert!(result.is_err());
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 1,
        "method": "test"
    }"#;

    let result = parse_message(json);
    assert!(result.is_err());
}

// =============================================================================
// Session Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_tools_list_exposes_the_full_catalogue() {
    let mut session = initialized_session().await;

    let list = parse_message(r#"{"jsonrpc": "2.0", "id": 2, "method": "tools/list"}"#).unwrap();
    let resp = session.handle_message(list).await.unwrap().unwrap();

    let tools = resp.result["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["md", "html", "screenshot", "pdf", "execute_js", "crawl"]
    );

    // Every descriptor carries a description and an object schema.
    for tool in tools {
        assert!(tool["description"].as_str().is_some());
        assert_eq!(tool["inputSchema"]["type"], "object");
    }
}

#[tokio::test]
async fn test_tools_list_requires_initialisation() {
    let mut session = McpSession::new(full_registry());

    let list = parse_message(r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}"#).unwrap();
    let err = session.handle_message(list).await.unwrap().unwrap_err();
    assert_eq!(err.error.code, -32600);
}

#[tokio::test]
async fn test_unknown_tool_keeps_the_session_alive() {
    let mut session = initialized_session().await;

    let call = parse_message(
        r#"{"jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "nonexistent", "arguments": {}}}"#,
    )
    .unwrap();
    let resp = session.handle_message(call).await.unwrap().unwrap();

    assert_eq!(resp.result["isError"], json!(true));
    let text = resp.result["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Unknown tool: nonexistent"));

    // The next request on the same session still succeeds.
    let list = parse_message(r#"{"jsonrpc": "2.0", "id": 3, "method": "tools/list"}"#).unwrap();
    let resp = session.handle_message(list).await.unwrap().unwrap();
    assert_eq!(resp.result["tools"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_unknown_method_is_a_protocol_error() {
    let mut session = initialized_session().await;

    let req = parse_message(r#"{"jsonrpc": "2.0", "id": 2, "method": "prompts/list"}"#).unwrap();
    let err = session.handle_message(req).await.unwrap().unwrap_err();
    assert_eq!(err.error.code, -32601);
}

// =============================================================================
// Streamable HTTP Transport Tests
// =============================================================================

#[tokio::test]
async fn test_streamable_initialize_mints_a_session_id() {
    let state = StreamableState::new(full_registry(), &test_settings(), 3000);
    let base = serve(streamable_app(state)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(&base)
        .json(&json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05", "capabilities": {}}
        }))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let session_id = resp
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .expect("initialize response must carry a session id");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(body["result"]["serverInfo"]["name"], "crawl4ai-mcp");

    // Complete the lifecycle and list tools on the same session.
    let resp = client
        .post(&base)
        .header("mcp-session-id", &session_id)
        .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

    let resp = client
        .post(&base)
        .header("mcp-session-id", &session_id)
        .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_streamable_request_without_session_is_rejected() {
    let state = StreamableState::new(full_registry(), &test_settings(), 3000);
    let base = serve(streamable_app(state)).await;

    let resp = reqwest::Client::new()
        .post(&base)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streamable_unknown_session_is_not_found() {
    let state = StreamableState::new(full_registry(), &test_settings(), 3000);
    let base = serve(streamable_app(state)).await;

    let resp = reqwest::Client::new()
        .post(&base)
        .header("mcp-session-id", "no-such-session")
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_reports_streamable_mode() {
    let state = StreamableState::new(full_registry(), &test_settings(), 3000);
    let base = serve(streamable_app(state)).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["mode"], "StreamableHTTP");
    assert_eq!(body["port"], 3000);
    assert_eq!(body["endpoint"], "https://crawler.example");
}

#[tokio::test]
async fn test_health_reports_sse_mode() {
    let state = SseState::new(full_registry(), &test_settings(), 9001);
    let base = serve(sse_app(state)).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["mode"], "SSE");
    assert_eq!(body["port"], 9001);
}

#[tokio::test]
async fn test_sse_message_post_to_unknown_session_is_not_found() {
    let state = SseState::new(full_registry(), &test_settings(), 9001);
    let base = serve(sse_app(state)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/messages/?session_id=no-such-session"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
