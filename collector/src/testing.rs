//! Testing utilities: a stand-in nsqd stats endpoint.
//!
//! [`StatsServer`] binds a real axum server on an ephemeral localhost port so
//! tests exercise the full HTTP path of [`StatsClient`](crate::StatsClient).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::routing::get;
use parking_lot::Mutex;
use tokio::net::TcpListener;

/// What the stats endpoint saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub accept: Option<String>,
    pub query: Option<String>,
}

struct ServerState {
    body: Mutex<String>,
    status: Mutex<StatusCode>,
    delay: Mutex<Duration>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A controllable `/stats` endpoint.
pub struct StatsServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl StatsServer {
    /// Starts serving `body` with status 200 at `/stats`.
    pub async fn start(body: impl Into<String>) -> Self {
        let state = Arc::new(ServerState {
            body: Mutex::new(body.into()),
            status: Mutex::new(StatusCode::OK),
            delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/stats", get(handle_stats))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// The normalized stats URL of this server.
    pub fn url(&self) -> String {
        format!("http://{}/stats?format=json", self.addr)
    }

    /// `host:port` without scheme or path.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn set_body(&self, body: impl Into<String>) {
        *self.state.body.lock() = body.into();
    }

    pub fn set_status(&self, status: StatusCode) {
        *self.state.status.lock() = status;
    }

    /// Delays every subsequent response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = delay;
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().last().cloned()
    }

    /// A stats URL on a localhost port nothing listens on.
    pub async fn unreachable_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/stats?format=json", addr)
    }
}

async fn handle_stats(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    headers: HeaderMap,
) -> (StatusCode, String) {
    state.requests.lock().push(RecordedRequest {
        accept: headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        query: uri.query().map(str::to_string),
    });

    let delay = *state.delay.lock();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let status = *state.status.lock();
    let body = state.body.lock().clone();
    (status, body)
}
