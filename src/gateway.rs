use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::Response;
use axum::routing::{any, post};
use tower_http::trace::TraceLayer;

pub const DEFAULT_AUTH_BASE_URL: &str = "https://localhost:3000";

/// Upper bound on a relayed request body. Inbound bodies are materialized
/// before forwarding; response bodies stream through untouched.
const MAX_RELAY_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Gateway configuration, resolved once at startup. A missing backend
/// origin fails here, before the listener binds, not per request.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Origin the generic proxy forwards to.
    pub backend_url: String,
    /// Origin the token-exchange route forwards to.
    pub auth_base_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = std::env::var("BACKEND_URL").context("BACKEND_URL is required")?;
        let backend_url = backend_url.trim().trim_end_matches('/').to_string();
        if backend_url.is_empty() {
            anyhow::bail!("BACKEND_URL is empty");
        }

        let auth_base_url = std::env::var("AUTH_BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTH_BASE_URL.to_string());

        Ok(Self {
            backend_url,
            auth_base_url,
        })
    }
}

#[derive(Clone)]
pub struct GatewayState {
    config: Arc<GatewayConfig>,
    client: reqwest::Client,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/auth/token", post(auth_token))
        .route("/api/backend/*path", any(proxy_backend))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, config: GatewayConfig) -> anyhow::Result<()> {
    tracing::info!(
        backend = %config.backend_url,
        auth = %config.auth_base_url,
        "starting gateway"
    );

    let app = router(GatewayState::new(config));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(addr = %addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Generic relay: any method and path under `/api/backend/` forwarded to
/// `{backend}/{path}{query}`. Inbound headers pass an explicit allow-list;
/// the upstream response comes back with status, headers, and body intact
/// except for `content-encoding`. Single attempt, no retry, no timeout;
/// an unreachable upstream maps to 502.
async fn proxy_backend(
    State(state): State<GatewayState>,
    Path(path): Path<String>,
    req: Request,
) -> Result<Response, (StatusCode, String)> {
    let query = req
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    let target = format!("{}/{path}{query}", state.config.backend_url);

    let (parts, body) = req.into_parts();
    let headers = allowlist_request_headers(&parts.headers);

    let mut upstream_req = state
        .client
        .request(parts.method.clone(), &target)
        .headers(headers);

    if relays_body(&parts.method) {
        let bytes = axum::body::to_bytes(body, MAX_RELAY_BODY_BYTES)
            .await
            .map_err(|err| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("read request body: {err}"),
                )
            })?;
        upstream_req = upstream_req.body(bytes);
    }

    let upstream = upstream_req.send().await.map_err(|err| {
        (
            StatusCode::BAD_GATEWAY,
            format!("upstream request failed: {err}"),
        )
    })?;

    let status = upstream.status();
    let headers = sanitize_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Token exchange: forwards the raw body to `{auth_base}/auth/token`.
/// Narrower than the generic proxy on purpose: fixed path, no header
/// allow-list, and an inbound `authorization` header is never forwarded
/// (a fresh login does not carry one).
async fn auth_token(
    State(state): State<GatewayState>,
    req: Request,
) -> Result<Response, (StatusCode, String)> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let body = axum::body::to_bytes(req.into_body(), MAX_RELAY_BODY_BYTES)
        .await
        .map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                format!("read request body: {err}"),
            )
        })?;

    let target = format!("{}/auth/token", state.config.auth_base_url);
    let upstream = state
        .client
        .post(&target)
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await
        .map_err(|err| {
            (
                StatusCode::BAD_GATEWAY,
                format!("token exchange failed: {err}"),
            )
        })?;

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let bytes = upstream.bytes().await.map_err(|err| {
        (
            StatusCode::BAD_GATEWAY,
            format!("read token response: {err}"),
        )
    })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}

fn relays_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Minimal-trust boundary: only `content-type` and `authorization` cross
/// into the upstream request; everything else inbound is dropped. `accept`
/// is the inbound value or `*/*`.
fn allowlist_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(value) = inbound.get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, value.clone());
    }
    if let Some(value) = inbound.get(header::AUTHORIZATION) {
        headers.insert(header::AUTHORIZATION, value.clone());
    }

    let accept = inbound
        .get(header::ACCEPT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*/*"));
    headers.insert(header::ACCEPT, accept);

    headers
}

/// Upstream headers are relayed as-is except `content-encoding`: the relay
/// hands the body bytes on directly, and re-declaring the upstream's
/// encoding would corrupt decoding on the client side.
fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    headers.remove(header::CONTENT_ENCODING);
    headers
}
