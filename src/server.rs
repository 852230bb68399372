use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, http::Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, error, info};

use crate::AppState;
use crate::api;
use crate::chat::ChatGateway;
use crate::config::AppConfig;
use crate::hymns::VerseStore;
use crate::llm::{JsonTransport, ReqwestTransport, RetryingCaller};

/// JSON body limit, matching the usual 100kb default of JSON body parsers.
const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// Load the corpus and build the chat gateway from configuration.
///
/// Neither failure is fatal: a corpus that fails to load leaves `store` empty
/// (corpus routes then answer 503), and a missing API key only disables the
/// chatbot endpoint.
pub fn init_state(config: &AppConfig) -> AppState {
    let store = match VerseStore::load(&config.corpus.path) {
        Ok(store) => {
            info!(
                name: "corpus.loaded",
                path = %config.corpus.path,
                verses = store.len(),
                "Verse corpus loaded"
            );
            Some(Arc::new(store))
        }
        Err(e) => {
            error!(
                name: "corpus.load_failed",
                error = %e,
                "CRITICAL: failed to load verse corpus; corpus routes will answer 503"
            );
            None
        }
    };

    let settings = config.gemini_settings();
    if settings.api_key.is_none() {
        error!(
            name: "chat.config.missing_key",
            "GEMINI_API_KEY is not set; the chatbot will not function until this is resolved"
        );
    } else {
        info!(
            name: "chat.config.loaded",
            base_url = %settings.base_url,
            model = %settings.model,
            max_attempts = config.retry.max_attempts,
            "Gemini configuration loaded"
        );
    }

    if config.together.api_key.is_some() {
        debug!(
            name: "together.config.unused",
            base_url = %config.together.base_url,
            "Together AI credentials are configured but not used by any route"
        );
    }

    let transport: Arc<dyn JsonTransport> = Arc::new(ReqwestTransport::new());
    let caller = RetryingCaller::new(transport, config.retry_policy());

    AppState {
        store,
        chat: Arc::new(ChatGateway::new(settings, caller)),
    }
}

/// Routes plus middleware, ready to serve.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Every request is logged at the default `info` filter.
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    api::routes()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = init_state(&config);
    let app = build_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );
    info!("   - Hymn API: /api/hymns");
    info!("   - Chatbot API: /api/chatbot/ask");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{AttemptError, GeminiSettings, RetryPolicy};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink shared between the subscriber and the assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl JsonTransport for Unreachable {
        async fn post_json(
            &self,
            _url: &str,
            _payload: &serde_json::Value,
        ) -> Result<serde_json::Value, AttemptError> {
            Err(AttemptError::Network("unreachable".to_string()))
        }
    }

    fn app() -> Router {
        let settings = GeminiSettings {
            api_key: None,
            base_url: "https://gemini.test".to_string(),
            model: "m".to_string(),
        };
        let caller = RetryingCaller::new(
            Arc::new(Unreachable),
            RetryPolicy::new(1, Duration::from_millis(1)),
        );
        build_app(AppState {
            store: Some(Arc::new(VerseStore::default())),
            chat: Arc::new(ChatGateway::new(settings, caller)),
        })
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_origin() {
        let res = app()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/chatbot/ask")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let methods = res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap();
        assert!(methods.contains("POST"));
        assert!(methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_requests_are_logged_at_info() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let res = app()
            .oneshot(
                Request::get("/api/hymns/mandala/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let out = logs.contents();
        assert!(out.contains("/api/hymns/mandala/1"), "request not logged: {out}");
        assert!(out.contains("started processing request"));
    }

    #[tokio::test]
    async fn test_empty_corpus_is_served_not_unavailable() {
        let res = app()
            .oneshot(Request::get("/api/hymns").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn test_missing_corpus_file_leaves_store_empty() {
        use crate::config::{
            CorpusConfig, GeminiConfig, RetryConfig, ServerConfig, TogetherConfig,
        };

        let config = AppConfig {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
            },
            corpus: CorpusConfig {
                path: "/nonexistent/rigveda.json".to_string(),
            },
            gemini: GeminiConfig {
                api_key: Some("  ".to_string()),
                base_url: "https://gemini.test".to_string(),
                model: "m".to_string(),
            },
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1000,
            },
            together: TogetherConfig {
                api_key: None,
                base_url: "https://together.test".to_string(),
            },
        };

        let state = init_state(&config);
        assert!(state.store.is_none());
        assert!(!state.chat.is_configured());
    }
}
