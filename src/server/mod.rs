pub mod hub;
pub mod stream;

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri, Version};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use crate::openapi;
use crate::protocol::{DebugInfo, QuoteResult};
use crate::quotes::{self, QuoteBook};
use hub::{Hub, HubCommand};

/// How far back the request-rate window reaches.
const RATE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Optional requests-per-second cap on the quote endpoints.
    pub rps: Option<usize>,
    /// Path the OpenAPI document is served under.
    pub openapi_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            rps: None,
            openapi_path: "/.ambassador-internal/openapi-docs".to_string(),
        }
    }
}

// ─── Shared request state ──────────────────────────────────────────────────

pub struct AppState {
    id: String,
    quotes: QuoteBook,
    hub_tx: mpsc::Sender<HubCommand>,
    conn_counter: AtomicU64,
    ready: AtomicBool,
    auth_ok_next: AtomicBool,
    rps: Option<usize>,
    req_times: Mutex<VecDeque<Instant>>,
}

impl AppState {
    /// Sliding one-second window over request times. Bounded: stale
    /// entries are pruned on every call instead of accumulating for the
    /// process lifetime.
    fn over_rate_limit(&self, limit: usize) -> bool {
        let now = Instant::now();
        let mut times = self.req_times.lock().unwrap();
        times.push_back(now);
        while let Some(front) = times.front() {
            if now.duration_since(*front) > RATE_WINDOW {
                times.pop_front();
            } else {
                break;
            }
        }
        times.len() >= limit
    }
}

// ─── Server ─────────────────────────────────────────────────────────────────

pub struct Server {
    config: Config,
    state: Arc<AppState>,
}

impl Server {
    /// Builds the shared state and spawns the broadcast hub. Must be
    /// called inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let quotes = QuoteBook::default();
        let hub_tx = Hub::spawn(quotes.clone());

        let state = Arc::new(AppState {
            id: quotes::generate_server_id(),
            quotes,
            hub_tx,
            conn_counter: AtomicU64::new(0),
            ready: AtomicBool::new(true),
            auth_ok_next: AtomicBool::new(false),
            rps: config.rps,
            req_times: Mutex::new(VecDeque::new()),
        });

        Self { config, state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(get_quote).head(get_quote))
            .route("/get-quote/", get(get_quote))
            .route("/ws", get(stream_quotes))
            .route("/health", get(health_check).post(health_check))
            .route(
                "/debug/",
                get(debug_request)
                    .post(debug_request)
                    .put(debug_request)
                    .delete(debug_request)
                    .options(debug_request),
            )
            .route("/debug/*path", get(debug_request))
            .route("/auth/*path", get(test_auth))
            .route("/sleep/", get(sleep))
            .route(&self.config.openapi_path, get(openapi::get_openapi_document))
            .with_state(self.state.clone())
    }

    pub async fn listen_and_serve(self) -> Result<()> {
        self.spawn_sigterm_watcher();

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, id = %self.state.id, "listening");

        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }

    /// SIGTERM flips readiness so the health check starts failing and
    /// the platform stops routing here while the pod drains.
    fn spawn_sigterm_watcher(&self) {
        let state = self.state.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "sigterm handler unavailable");
                    return;
                }
            };
            sigterm.recv().await;
            state.ready.store(false, Ordering::Relaxed);
            tracing::info!("SIGTERM received, marked unhealthy and waiting to be killed");
        });
    }
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn get_quote(State(state): State<Arc<AppState>>) -> Response {
    if let Some(limit) = state.rps {
        if state.over_rate_limit(limit) {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Request Overload").into_response();
        }
    }

    let res = QuoteResult {
        server: state.id.clone(),
        quote: state.quotes.random(),
        time: Utc::now(),
    };
    Json(res).into_response()
}

/// Upgrade to a websocket and hand the connection to the hub.
async fn stream_quotes(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    let id = state.conn_counter.fetch_add(1, Ordering::Relaxed);
    let hub_tx = state.hub_tx.clone();

    let mut res = ws
        .max_message_size(stream::MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| stream::serve_socket(id, hub_tx, socket));
    res.headers_mut()
        .insert(header::SET_COOKIE, HeaderValue::from_static("quote-cookie=ws"));
    res
}

async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    if state.ready.load(Ordering::Relaxed) {
        "OK".into_response()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

async fn debug_request(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut hdrs: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in &headers {
        hdrs.entry(name.to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let info = DebugInfo {
        server: state.id.clone(),
        time: Utc::now(),
        method: method.to_string(),
        host: headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        proto: format!("{:?}", version),
        url: uri.to_string(),
        remoteaddr: remote.to_string(),
        headers: hdrs,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    tracing::debug!(method = %info.method, url = %info.url, "debug request");
    Json(info).into_response()
}

async fn sleep(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let secs = match params.get("sleep") {
        None => 1,
        Some(raw) => match raw.parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    "400: Sleep param is not an integer\n",
                )
                    .into_response()
            }
        },
    };

    tokio::time::sleep(Duration::from_secs(secs)).await;

    if state.ready.load(Ordering::Relaxed) {
        tracing::info!(secs, "slept");
        "200: OK\n".into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "503: Terminating\n").into_response()
    }
}

/// Fails the first attempt and passes the retry, for exercising
/// retry-on-auth-failure behavior in front proxies.
async fn test_auth(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.auth_ok_next.swap(false, Ordering::Relaxed) {
        StatusCode::OK
    } else {
        state.auth_ok_next.store(true, Ordering::Relaxed);
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_server(rps: Option<usize>) -> Server {
        Server::new(Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            rps,
            ..Config::default()
        })
    }

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_quote_returns_a_known_quote() {
        let server = test_server(None);
        let app = server.router();

        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let json = body_json(res).await;
        let quote = json["quote"].as_str().unwrap();
        assert!(crate::quotes::STARTING_QUOTES.contains(&quote));
        assert_eq!(json["server"].as_str().unwrap(), server.state.id);
    }

    #[tokio::test]
    async fn rate_limited_quote_requests_overload() {
        let server = test_server(Some(2));
        let app = server.router();

        let ok = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let overloaded = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(overloaded.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_fails_once_unready() {
        let server = test_server(None);
        let app = server.router();

        let res = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        server.state.ready.store(false, Ordering::Relaxed);
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn debug_echoes_the_request() {
        let server = test_server(None);
        let app = server.router();

        let mut req = Request::post("/debug/")
            .header("x-probe", "yes")
            .body(Body::from("hello"))
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let json = body_json(res).await;
        assert_eq!(json["method"], "POST");
        assert_eq!(json["url"], "/debug/");
        assert_eq!(json["body"], "hello");
        assert_eq!(json["headers"]["x-probe"][0], "yes");
        assert_eq!(json["remoteaddr"], "127.0.0.1:4000");
    }

    #[tokio::test]
    async fn auth_fails_then_passes() {
        let server = test_server(None);
        let app = server.router();

        for expected in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::OK,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let res = app
                .clone()
                .oneshot(Request::get("/auth/check").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), expected);
        }
    }

    #[tokio::test]
    async fn sleep_rejects_non_integer_param() {
        let server = test_server(None);
        let app = server.router();

        let res = app
            .clone()
            .oneshot(
                Request::get("/sleep/?sleep=soon")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .oneshot(Request::get("/sleep/?sleep=0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let server = test_server(None);
        let app = server.router();

        let res = app
            .oneshot(
                Request::get("/.ambassador-internal/openapi-docs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, openapi::OPENAPI_DOCUMENT.as_bytes());
    }
}
