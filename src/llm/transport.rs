//! Single-attempt JSON transport.
//!
//! A [`JsonTransport`] performs exactly one POST and reports the outcome as a
//! categorized [`AttemptError`]. Retry policy lives one layer up in
//! [`super::retry`].

use serde_json::Value;

/// Why one outbound attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    /// Connection, TLS, or other transport-level failure.
    #[error("{0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("HTTP error! status: {0}")]
    Status(u16),
    /// The body arrived but was not valid JSON.
    #[error("invalid JSON body: {0}")]
    Decode(String),
}

impl AttemptError {
    /// Whether another attempt may succeed where this one failed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_))
    }
}

/// One POST of a JSON payload, returning the decoded JSON body.
#[async_trait::async_trait]
pub trait JsonTransport: Send + Sync {
    /// Send `payload` to `url` with `Content-Type: application/json`.
    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value, AttemptError>;
}

/// [`JsonTransport`] backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl JsonTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value, AttemptError> {
        // `without_url` keeps the query string (and the API key in it) out of the message.
        let resp = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AttemptError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| AttemptError::Decode(e.without_url().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::{Json, Router, routing::post};
    use serde_json::json;

    /// Local upstream: `/bad` answers 502, `/echo` returns the request's
    /// content type and body, `/text` answers 200 with a non-JSON body.
    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route("/bad", post(|| async { StatusCode::BAD_GATEWAY }))
            .route(
                "/echo",
                post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                    let ct = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Json(json!({ "ct": ct, "body": body }))
                }),
            )
            .route("/text", post(|| async { "plain words" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_reqwest_transport_against_local_server() {
        let base = spawn_upstream().await;
        let transport = ReqwestTransport::new();
        let payload = json!({ "a": 1 });

        let echoed = transport
            .post_json(&format!("{base}/echo"), &payload)
            .await
            .unwrap();
        assert_eq!(echoed["ct"], "application/json");
        assert_eq!(echoed["body"], payload);

        let bad = transport.post_json(&format!("{base}/bad"), &payload).await;
        assert_eq!(bad, Err(AttemptError::Status(502)));
        assert!(bad.unwrap_err().is_retryable());

        let text = transport.post_json(&format!("{base}/text"), &payload).await;
        match text {
            Err(err @ AttemptError::Decode(_)) => assert!(!err.is_retryable()),
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_failure_hides_url() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ReqwestTransport::new()
            .post_json(&format!("http://{addr}/x?key=secret"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::Network(_)));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_status_message_matches_upstream_wording() {
        assert_eq!(AttemptError::Status(503).to_string(), "HTTP error! status: 503");
    }

    #[test]
    fn test_decode_failures_are_terminal() {
        assert!(AttemptError::Network("reset".into()).is_retryable());
        assert!(AttemptError::Status(500).is_retryable());
        assert!(!AttemptError::Decode("eof".into()).is_retryable());
    }
}
