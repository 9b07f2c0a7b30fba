//! SSE stream client.
//!
//! ```text
//! idle ──► connecting ──► streaming ──► completed
//!              │              │    └──► cancelled
//!              └──────────────┴───────► failed
//! ```
//!
//! `stream_request` posts a JSON body, then reads the response body chunk by
//! chunk, decoding each `data:` line as a JSON event and handing it to the
//! caller's handler synchronously, in arrival order. A set cancellation
//! token ends the stream cleanly: at a read boundary, or when a read or
//! decode failure happens while it is set.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::decoder::SseDecoder;
use crate::error::StreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connecting,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

/// How a stream ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub state: StreamState,
    pub events: usize,
}

/// Drives the state machine and counts delivered events.
struct Session<'a> {
    path: &'a str,
    state: StreamState,
    events: usize,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> Session<'a> {
    fn new(path: &'a str, cancel: Option<&'a CancellationToken>) -> Self {
        Self {
            path,
            state: StreamState::Idle,
            events: 0,
            cancel,
        }
    }

    fn transition(&mut self, next: StreamState) {
        tracing::debug!("[Stream] {}: {:?} -> {:?}", self.path, self.state, next);
        self.state = next;
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }

    fn finish(mut self, state: StreamState) -> StreamSummary {
        self.transition(state);
        StreamSummary {
            state,
            events: self.events,
        }
    }

    /// A failure while cancelled is a clean stop.
    fn fail(mut self, err: StreamError) -> Result<StreamSummary, StreamError> {
        if self.is_cancelled() {
            return Ok(self.finish(StreamState::Cancelled));
        }
        self.transition(StreamState::Failed);
        Err(err)
    }

    fn dispatch<T, F>(&mut self, payloads: Vec<String>, on_event: &mut F) -> Result<(), StreamError>
    where
        T: DeserializeOwned,
        F: FnMut(T),
    {
        for payload in payloads {
            let event = serde_json::from_str::<T>(&payload).map_err(|e| {
                StreamError::Stream(format!("malformed event payload ({}): {}", e, payload))
            })?;
            self.events += 1;
            on_event(event);
        }
        Ok(())
    }
}

/// Read `body` to the end, dispatching every `data:` event to `on_event`.
///
/// Transport-agnostic: any stream of byte chunks will do.
pub async fn pump_events<S, B, E, T, F>(
    path: &str,
    body: S,
    mut on_event: F,
    cancel: Option<&CancellationToken>,
) -> Result<StreamSummary, StreamError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    T: DeserializeOwned,
    F: FnMut(T),
{
    let mut session = Session::new(path, cancel);
    session.transition(StreamState::Streaming);
    pump(session, body, &mut on_event).await
}

async fn pump<S, B, E, T, F>(
    mut session: Session<'_>,
    body: S,
    on_event: &mut F,
) -> Result<StreamSummary, StreamError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    T: DeserializeOwned,
    F: FnMut(T),
{
    tokio::pin!(body);
    let mut decoder = SseDecoder::new();

    loop {
        let next = match session.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(session.finish(StreamState::Cancelled)),
                next = body.next() => next,
            },
            None => body.next().await,
        };

        match next {
            Some(Ok(chunk)) => {
                let payloads = decoder.feed(chunk.as_ref());
                if let Err(e) = session.dispatch(payloads, on_event) {
                    return session.fail(e);
                }
            }
            Some(Err(e)) => {
                return session.fail(StreamError::Stream(e.to_string()));
            }
            None => {
                let payloads = decoder.finish();
                if let Err(e) = session.dispatch(payloads, on_event) {
                    return session.fail(e);
                }
                return Ok(session.finish(StreamState::Completed));
            }
        }
    }
}

/// HTTP client for a JSON-over-HTTP / SSE backend.
#[derive(Clone)]
pub struct StreamClient {
    base_url: String,
    client: reqwest::Client,
}

impl StreamClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` to `path` and stream the SSE response into `on_event`.
    pub async fn stream_request<Req, T, F>(
        &self,
        path: &str,
        body: &Req,
        on_event: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<StreamSummary, StreamError>
    where
        Req: Serialize + ?Sized,
        T: DeserializeOwned,
        F: FnMut(T),
    {
        let mut on_event = on_event;
        let mut session = Session::new(path, cancel);
        session.transition(StreamState::Connecting);

        let request = self
            .client
            .post(self.url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(body)
            .send();

        let sent = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(session.finish(StreamState::Cancelled)),
                sent = request => sent,
            },
            None => request.await,
        };

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                return session.fail(StreamError::Connection {
                    path: path.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return session.fail(StreamError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        session.transition(StreamState::Streaming);
        pump(session, response.bytes_stream(), &mut on_event).await
    }

    /// POST `body` and decode a single JSON response. The body must be JSON
    /// even on failure; non-2xx responses surface its `detail` field.
    pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, StreamError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| StreamError::Connection {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StreamError::Stream(format!("Failed to parse response: {}", e)))?;

        if !status.is_success() {
            let detail = body
                .get("detail")
                .and_then(|d| d.as_str())
                .unwrap_or("Unknown error");
            return Err(StreamError::Http {
                status: status.as_u16(),
                status_text: detail.to_string(),
            });
        }

        serde_json::from_value(body)
            .map_err(|e| StreamError::Stream(format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Msg {
        content: String,
    }

    fn chunks(parts: Vec<&'static [u8]>) -> impl Stream<Item = Result<&'static [u8], String>> {
        tokio_stream::iter(parts.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_events_in_order_across_chunks() {
        let mut seen = Vec::new();
        let summary = pump_events(
            "/t",
            chunks(vec![
                b"data: {\"content\":\"Hel\"}\n",
                b"data: {\"content\":\"lo\"}\n",
            ]),
            |m: Msg| seen.push(m.content),
            None,
        )
        .await
        .unwrap();

        assert_eq!(seen, vec!["Hel", "lo"]);
        assert_eq!(summary.state, StreamState::Completed);
        assert_eq!(summary.events, 2);
    }

    #[tokio::test]
    async fn test_line_split_mid_json() {
        let mut seen = Vec::new();
        pump_events(
            "/t",
            chunks(vec![b"data: {\"cont", b"ent\":\"x\"}\n\ndata: {\"content\":\"y\"}\r\n"]),
            |m: Msg| seen.push(m.content),
            None,
        )
        .await
        .unwrap();
        assert_eq!(seen, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_malformed_json_aborts() {
        let mut seen = Vec::new();
        let err = pump_events(
            "/t",
            chunks(vec![
                b"data: {\"content\":\"ok\"}\n",
                b"data: {not json}\n",
                b"data: {\"content\":\"never\"}\n",
            ]),
            |m: Msg| seen.push(m.content),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StreamError::Stream(_)));
        assert_eq!(seen, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_read_error_fails_stream() {
        let body = tokio_stream::iter(vec![
            Ok(b"data: {\"content\":\"a\"}\n".as_slice()),
            Err("connection reset".to_string()),
        ]);
        let err = pump_events("/t", body, |_: Msg| {}, None).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_failure_while_cancelled_is_clean_stop() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let body = tokio_stream::iter(vec![
            Ok::<&[u8], String>(b"data: {\"content\":\"a\"}\n".as_slice()),
            Ok(b"data: broken\n".as_slice()),
        ]);

        let mut seen = Vec::new();
        let summary = pump_events(
            "/t",
            body,
            |m: Msg| {
                seen.push(m.content);
                trigger.cancel();
            },
            Some(&token),
        )
        .await
        .unwrap();

        assert_eq!(summary.state, StreamState::Cancelled);
        assert_eq!(seen, vec!["a"]);
    }

    #[tokio::test]
    async fn test_cancel_at_read_boundary() {
        let token = CancellationToken::new();
        token.cancel();
        let mut seen = Vec::new();
        let summary = pump_events(
            "/t",
            chunks(vec![b"data: {\"content\":\"a\"}\n"]),
            |m: Msg| seen.push(m.content),
            Some(&token),
        )
        .await
        .unwrap();
        assert_eq!(summary.state, StreamState::Cancelled);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_url_join() {
        let client = StreamClient::new("http://localhost:8104/aiagent-api/v1/");
        assert_eq!(
            client.url("/chat/create-job"),
            "http://localhost:8104/aiagent-api/v1/chat/create-job"
        );
    }
}
