use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, info_span, warn, Instrument};
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    backend::QueryExecutor,
    config::ProxyConfig,
    metrics::{self, RequestTimer},
    proxy,
    request::RangeParams,
    ProxyError, Result,
};

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn QueryExecutor>,
    pub config: Arc<ProxyConfig>,
}

/// Routes served by the proxy. Methods other than GET and POST on
/// `query_range` are answered with 405.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/query_range", get(query_range).post(query_range))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn query_range(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Response {
    let _timer = RequestTimer::new();
    let request_id = Uuid::new_v4();
    let params = request_params(&headers, raw_query.as_deref(), &body);

    async move {
        debug!("Received query_range request: {:?}", params);
        match proxy::query_range(state.executor.as_ref(), &state.config, &params).await {
            Ok(response) => {
                metrics::record_series_returned(response.series().len());
                Json(response).into_response()
            }
            Err(err) => {
                match &err {
                    ProxyError::Upstream(_) | ProxyError::Transport(_) => {
                        error!("Wavefront query failed: {}", err)
                    }
                    _ => warn!("Rejected query_range request: {}", err),
                }
                metrics::record_error(err.kind());
                err.into_response()
            }
        }
    }
    .instrument(info_span!("query_range", %request_id))
    .await
}

/// Form body values take precedence over URL query values.
fn request_params(headers: &HeaderMap, raw_query: Option<&str>, body: &[u8]) -> RangeParams {
    let from_url = raw_query
        .map(|query| RangeParams::from_pairs(decode_pairs(query.as_bytes())))
        .unwrap_or_default();

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form && !body.is_empty() {
        RangeParams::from_pairs(decode_pairs(body)).or(from_url)
    } else {
        from_url
    }
}

fn decode_pairs(input: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(input).into_owned().collect()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics_text() -> std::result::Result<String, StatusCode> {
    metrics::render().map_err(|e| {
        error!("{}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn start_server(config: Arc<ProxyConfig>, executor: Arc<dyn QueryExecutor>) -> Result<()> {
    let addr = config.bind_address();
    let app = router(AppState { executor, config });

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ProxyError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;
    info!("Wavefront PromQL proxy listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ProxyError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
