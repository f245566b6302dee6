//! HTTP route handlers for the exporter server.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};

use super::error::ApiError;
use crate::exposition::{CONTENT_TYPE, Exposition};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub exposition: Arc<Exposition>,
    pub telemetry_path: Arc<str>,
}

/// Handle GET on the telemetry path.
///
/// Each request runs one scrape. A failed nsqd fetch still answers 200 with
/// the scrape duration histogram; only encoding failures become errors.
pub async fn handle_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.exposition.render().await?;
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}

/// Handle GET /
pub async fn handle_landing(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>NSQ Exporter</title></head>\n\
         <body>\n\
         <h1>NSQ Exporter</h1>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.telemetry_path
    ))
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> &'static str {
    "OK"
}
