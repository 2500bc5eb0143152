//! Transport tests: stdio framing, streamable HTTP, legacy SSE, and /health.

mod common;

use serde_json::{json, Value};
use tokio::io::BufReader;

use ucode_mcp::transport::StdioTransport;
use ucode_mcp::types::*;
use ucode_mcp::ExecutionPolicy;

use common::*;

fn lines(requests: &[Value]) -> String {
    requests.iter().map(|r| format!("{r}\n")).collect()
}

// ═══════════════════════════════════════════════════════
// STDIO
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_stdio_round_trip() {
    let manager = manager(ExecutionPolicy::Sync);
    let transport = StdioTransport::new(manager.clone());

    let mut input = lines(&[
        init_request(),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    ]);
    input.push_str("{\"broken\":\n\n");
    input.push_str(&lines(&[call_request(2, "echo", json!({ "a": 1, "b": 2 }))]));

    let mut output = Vec::new();
    transport
        .run_with(
            BufReader::new(input.as_bytes()),
            &mut output,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 3);

    assert_eq!(responses[0]["id"], 0);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], SERVER_NAME);

    assert_eq!(responses[1]["id"], Value::Null);
    assert_eq!(responses[1]["error"]["code"], error_codes::PARSE_ERROR);

    assert_eq!(responses[2]["id"], 2);
    assert_eq!(tool_payload(&responses[2]), json!({ "a": 1, "b": 2 }));

    // EOF closes the implicit session.
    assert_eq!(manager.count(), 0);
}

#[tokio::test]
async fn test_stdio_shutdown_closes_session() {
    let manager = manager(ExecutionPolicy::Sync);
    let transport = StdioTransport::new(manager.clone());

    let (_client, server) = tokio::io::duplex(64);
    let mut output = Vec::new();
    transport
        .run_with(BufReader::new(server), &mut output, async {})
        .await
        .unwrap();

    assert!(output.is_empty());
    assert_eq!(manager.count(), 0);
}

#[tokio::test]
async fn test_stdio_invalid_utf8_is_answered_not_fatal() {
    let manager = manager(ExecutionPolicy::Sync);
    let transport = StdioTransport::new(manager.clone());

    let mut input: Vec<u8> = b"\xff\xfe\n".to_vec();
    input.extend_from_slice(lines(&[mcp_request(7, "ping", json!({}))]).as_bytes());

    let mut output = Vec::new();
    transport
        .run_with(
            BufReader::new(input.as_slice()),
            &mut output,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);

    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["error"]["code"], error_codes::PARSE_ERROR);

    assert_eq!(responses[1]["id"], 7);
    assert_eq!(responses[1]["result"], json!({}));
}

#[tokio::test]
async fn test_stdio_unusable_request_id_is_answered() {
    let manager = manager(ExecutionPolicy::Sync);
    let transport = StdioTransport::new(manager);

    let input = lines(&[json!({ "jsonrpc": "2.0", "id": 1.5, "method": "tools/list" })]);
    let mut output = Vec::new();
    transport
        .run_with(
            BufReader::new(input.as_bytes()),
            &mut output,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();

    let response: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(response["error"]["code"], error_codes::INVALID_REQUEST);
    assert_eq!(response["id"], Value::Null);
}

// ═══════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════

#[cfg(feature = "sse")]
mod http {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use futures::StreamExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use ucode_mcp::session::SessionManager;
    use ucode_mcp::transport::http::router;
    use ucode_mcp::transport::sse::UNKNOWN_SESSION_MESSAGE;
    use ucode_mcp::transport::streamable::SESSION_HEADER;
    use ucode_mcp::types::*;
    use ucode_mcp::ExecutionPolicy;

    use super::common::*;

    fn app() -> (Router, Arc<SessionManager>) {
        let manager = manager(ExecutionPolicy::Sync);
        (router(manager.clone()), manager)
    }

    fn post_mcp(session_id: Option<&str>, body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(id) = session_id {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_bytes(body: Body) -> Vec<u8> {
        axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
    }

    async fn body_json(body: Body) -> Value {
        serde_json::from_slice(&body_bytes(body).await).unwrap()
    }

    async fn initialize(app: &Router) -> String {
        let resp = app
            .clone()
            .oneshot(post_mcp(None, &init_request()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()[SESSION_HEADER].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp.into_body()).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_streamable_initialize_assigns_session() {
        let (app, manager) = app();
        let resp = app
            .clone()
            .oneshot(post_mcp(None, &init_request()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let session_id = resp.headers()[SESSION_HEADER].to_str().unwrap().to_string();
        assert!(manager.resolve(&session_id).is_some());

        let body = body_json(resp.into_body()).await;
        assert_eq!(body["result"]["protocolVersion"], MCP_VERSION);
    }

    #[tokio::test]
    async fn test_streamable_session_reuse() {
        let (app, manager) = app();
        let session_id = initialize(&app).await;

        let resp = app
            .clone()
            .oneshot(post_mcp(
                Some(&session_id),
                &call_request(2, "echo", json!({ "a": "x", "b": "y" })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[SESSION_HEADER], session_id.as_str());
        assert_eq!(tool_payload(&body_json(resp.into_body()).await), json!({ "a": "x", "b": "y" }));

        assert_eq!(manager.count(), 1);
    }

    #[tokio::test]
    async fn test_streamable_rejects_non_initialize_without_session() {
        let (app, manager) = app();
        let resp = app
            .oneshot(post_mcp(None, &mcp_request(1, "tools/list", json!({}))))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp.into_body()).await;
        assert_eq!(body["error"]["code"], server_error_codes::NO_VALID_SESSION);
        assert_eq!(body["error"]["message"], "Bad Request: No valid session ID provided");
        assert_eq!(body["id"], Value::Null);
        assert_eq!(manager.count(), 0);
    }

    #[tokio::test]
    async fn test_streamable_rejects_unknown_session() {
        let (app, _) = app();
        let resp = app
            .oneshot(post_mcp(Some("no-such-session"), &init_request()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp.into_body()).await;
        assert_eq!(body["error"]["code"], server_error_codes::NO_VALID_SESSION);
    }

    #[tokio::test]
    async fn test_streamable_notification_is_accepted() {
        let (app, _) = app();
        let session_id = initialize(&app).await;

        let resp = app
            .oneshot(post_mcp(
                Some(&session_id),
                &json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_streamable_fractional_id_gets_error_response() {
        let (app, _) = app();
        let session_id = initialize(&app).await;

        let resp = app
            .oneshot(post_mcp(
                Some(&session_id),
                &json!({ "jsonrpc": "2.0", "id": 1.5, "method": "tools/list" }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp.into_body()).await;
        assert_eq!(body["error"]["code"], error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_streamable_invalid_json() {
        let (app, _) = app();
        let request = Request::post("/mcp")
            .header("content-type", "application/json")
            .body(Body::from("{\"broken\":"))
            .unwrap();
        let resp = app.oneshot(request).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp.into_body()).await;
        assert_eq!(body["error"]["code"], error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_streamable_delete_ends_session() {
        let (app, manager) = app();
        let session_id = initialize(&app).await;

        let delete = Request::delete("/mcp")
            .header(SESSION_HEADER, &session_id)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(manager.resolve(&session_id).is_none());

        let resp = app
            .oneshot(post_mcp(Some(&session_id), &mcp_request(3, "ping", json!({}))))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_streamable_get_not_allowed() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_sse_post_to_unknown_session() {
        let (app, _) = app();
        let request = Request::post("/messages?sessionId=bogus")
            .header("content-type", "application/json")
            .body(Body::from(init_request().to_string()))
            .unwrap();
        let resp = app.oneshot(request).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_bytes(resp.into_body()).await;
        assert_eq!(String::from_utf8(body).unwrap(), UNKNOWN_SESSION_MESSAGE);
    }

    #[tokio::test]
    async fn test_sse_post_without_session_id() {
        let (app, _) = app();
        let request = Request::post("/messages")
            .body(Body::from(init_request().to_string()))
            .unwrap();
        let resp = app.oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    /// Read SSE frames until one complete event is buffered; return (event, data).
    async fn next_event<S>(stream: &mut S, buffer: &mut String) -> (String, String)
    where
        S: futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
    {
        loop {
            if let Some(end) = buffer.find("\n\n") {
                let frame: String = buffer.drain(..end + 2).collect();
                let mut event = String::new();
                let mut data = String::new();
                for line in frame.lines() {
                    if let Some(v) = line.strip_prefix("event: ") {
                        event = v.to_string();
                    } else if let Some(v) = line.strip_prefix("data: ") {
                        data.push_str(v);
                    }
                }
                if event.is_empty() && data.is_empty() {
                    continue;
                }
                return (event, data);
            }
            let chunk = stream.next().await.expect("stream ended").unwrap();
            buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    #[tokio::test]
    async fn test_sse_full_exchange() {
        let (app, manager) = app();
        let resp = app
            .clone()
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let mut stream = resp.into_body().into_data_stream();
        let mut buffer = String::new();

        let (event, endpoint) = next_event(&mut stream, &mut buffer).await;
        assert_eq!(event, "endpoint");
        let session_id = endpoint
            .strip_prefix("/messages?sessionId=")
            .expect("endpoint path")
            .to_string();
        assert!(manager.resolve(&session_id).is_some());

        // Legacy clients may omit the handshake params entirely.
        let post = Request::post(endpoint.as_str())
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }).to_string(),
            ))
            .unwrap();
        let resp = app.clone().oneshot(post).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let post = Request::post(endpoint.as_str())
            .header("content-type", "application/json")
            .body(Body::from(call_request(2, "echo", json!({ "a": 1, "b": 2 })).to_string()))
            .unwrap();
        let resp = app.clone().oneshot(post).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let (event, data) = next_event(&mut stream, &mut buffer).await;
        assert_eq!(event, "message");
        let init: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], SERVER_NAME);

        let (_, data) = next_event(&mut stream, &mut buffer).await;
        let call: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(call["id"], 2);
        assert_eq!(tool_payload(&call), json!({ "a": 1, "b": 2 }));

        // Dropping the stream is a disconnect.
        drop(stream);
        assert!(manager.resolve(&session_id).is_none());
    }

    #[tokio::test]
    async fn test_shutdown_with_open_event_stream() {
        use std::time::Duration;

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use ucode_mcp::transport::HttpTransport;

        let manager = manager(ExecutionPolicy::Sync);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let transport = HttpTransport::new(manager.clone());
        let server = tokio::spawn(async move {
            transport
                .serve(listener, async {
                    let _ = stop_rx.await;
                })
                .await
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /sse HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n")
            .await
            .unwrap();

        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        while !String::from_utf8_lossy(&received).contains("event: endpoint") {
            let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut chunk))
                .await
                .expect("endpoint event")
                .unwrap();
            assert!(n > 0, "connection closed before endpoint event");
            received.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(manager.count(), 1);

        stop_tx.send(()).unwrap();
        let served = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server must stop while an event stream is open")
            .unwrap();
        assert!(served.is_ok());
        assert_eq!(manager.count(), 0);
    }
}
