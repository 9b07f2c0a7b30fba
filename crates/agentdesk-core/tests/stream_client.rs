//! StreamClient and ChatApi against a local SSE endpoint.

use agentdesk_core::chat::{ChatApi, ChatStreamEvent, RequirementState};
use agentdesk_core::error::StreamError;
use agentdesk_core::stream::{StreamClient, StreamState};
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
struct Chunk {
    content: String,
}

fn sse(chunks: Vec<&'static [u8]>) -> Response {
    let body = tokio_stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(body))
        .unwrap()
}

async fn two_chunks() -> Response {
    sse(vec![
        b"data: {\"content\":\"Hel\"}\n",
        b"data: {\"content\":\"lo\"}\n",
    ])
}

async fn split_multibyte() -> Response {
    // "é" is 0xC3 0xA9; the split lands between its bytes
    sse(vec![b"data: {\"content\":\"caf\xc3", b"\xa9\"}\n"])
}

async fn no_trailing_newline() -> Response {
    sse(vec![b"data: {\"content\":\"a\"}\n", b"data: {\"content\":\"end\"}"])
}

async fn malformed() -> Response {
    sse(vec![b"data: {\"content\":\"ok\"}\n", b"data: {oops\n"])
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn endless() -> Response {
    let first = tokio_stream::iter(vec![Ok::<_, std::io::Error>(
        b"data: {\"content\":\"first\"}\n".as_slice(),
    )]);
    let body = first.chain(tokio_stream::pending());
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(body))
        .unwrap()
}

async fn requirement_definition(Json(request): Json<Value>) -> Response {
    assert_eq!(request["conversation_id"], "conv-1");
    assert_eq!(request["context"]["previous_messages"][0]["role"], "user");
    sse(vec![
        b"data: {\"type\":\"message\",\"data\":{\"content\":\"Which data?\"}}\n\n",
        b"data: {\"type\":\"heartbeat\"}\n\n",
        b"data: {\"type\":\"status\",\"data\":{\"stage\":\"thinking\"}}\n\n",
        b"data: {\"type\":\"requirement_update\",\"data\":{\"requirements\":{\"data_source\":\"crm\",\"process_description\":null,\"output_format\":null,\"schedule\":null,\"completeness\":0.9}}}\n\n",
    ])
}

async fn create_job(Json(request): Json<Value>) -> impl IntoResponse {
    if request["requirements"]["completeness"].as_f64().unwrap_or(0.0) < 0.8 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Requirements are not complete"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "job_id": "job-1",
            "job_master_id": "jm-1",
            "status": "created",
            "message": "ok"
        })),
    )
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/two", post(two_chunks))
        .route("/split", post(split_multibyte))
        .route("/tail", post(no_trailing_newline))
        .route("/malformed", post(malformed))
        .route("/unavailable", post(unavailable))
        .route("/endless", post(endless))
        .route("/chat/requirement-definition", post(requirement_definition))
        .route("/chat/create-job", post(create_job));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn collect(
    client: &StreamClient,
    path: &str,
) -> (Result<StreamState, StreamError>, Vec<String>) {
    let mut seen = Vec::new();
    let result = client
        .stream_request(path, &json!({}), |c: Chunk| seen.push(c.content), None)
        .await
        .map(|summary| summary.state);
    (result, seen)
}

#[tokio::test]
async fn test_events_delivered_in_order() {
    let client = StreamClient::new(&spawn_backend().await);
    let (state, seen) = collect(&client, "/two").await;
    assert_eq!(state.unwrap(), StreamState::Completed);
    assert_eq!(seen, vec!["Hel", "lo"]);
}

#[tokio::test]
async fn test_multibyte_character_split_across_chunks() {
    let client = StreamClient::new(&spawn_backend().await);
    let (_, seen) = collect(&client, "/split").await;
    assert_eq!(seen, vec!["café"]);
}

#[tokio::test]
async fn test_final_line_without_newline() {
    let client = StreamClient::new(&spawn_backend().await);
    let (state, seen) = collect(&client, "/tail").await;
    assert_eq!(state.unwrap(), StreamState::Completed);
    assert_eq!(seen, vec!["a", "end"]);
}

#[tokio::test]
async fn test_malformed_payload_is_stream_error() {
    let client = StreamClient::new(&spawn_backend().await);
    let (state, seen) = collect(&client, "/malformed").await;
    assert!(matches!(state, Err(StreamError::Stream(_))));
    assert_eq!(seen, vec!["ok"]);
}

#[tokio::test]
async fn test_http_error_status() {
    let client = StreamClient::new(&spawn_backend().await);
    let (state, seen) = collect(&client, "/unavailable").await;
    let err = state.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    assert!(seen.is_empty());
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = StreamClient::new(&format!("http://{}", addr));
    let (state, _) = collect(&client, "/two").await;
    assert!(matches!(state, Err(StreamError::Connection { .. })));
}

#[tokio::test]
async fn test_cancel_mid_stream() {
    let client = StreamClient::new(&spawn_backend().await);
    let token = CancellationToken::new();
    let trigger = token.clone();

    let mut seen = Vec::new();
    let summary = client
        .stream_request(
            "/endless",
            &json!({}),
            |c: Chunk| {
                seen.push(c.content);
                trigger.cancel();
            },
            Some(&token),
        )
        .await
        .unwrap();

    assert_eq!(summary.state, StreamState::Cancelled);
    assert_eq!(seen, vec!["first"]);
}

#[tokio::test]
async fn test_chat_requirement_definition() {
    let api = ChatApi::new(&spawn_backend().await);
    let history = vec![agentdesk_core::chat::Message::user("I need a report")];

    let mut events = Vec::new();
    api.stream_requirement_definition(
        "conv-1",
        "from the CRM",
        &history,
        &RequirementState::empty(),
        |event| events.push(event),
        None,
    )
    .await
    .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        ChatStreamEvent::Message {
            content: "Which data?".to_string()
        }
    );
    match &events[1] {
        ChatStreamEvent::RequirementUpdate { requirements } => assert!(requirements.is_ready()),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_create_job() {
    let api = ChatApi::new(&spawn_backend().await);

    let ready = RequirementState {
        completeness: 0.9,
        ..RequirementState::empty()
    };
    let job = api.create_job("conv-1", &ready).await.unwrap();
    assert_eq!(job.job_id, "job-1");

    let err = api
        .create_job("conv-1", &RequirementState::empty())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err
        .to_string()
        .contains("Job creation failed: Requirements are not complete"));
}
