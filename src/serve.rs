//! Preview server: the generated site behind the access gate.
//!
//! ```text
//! request ─▶ access_gate middleware ─▶ router
//!               │ Allow            ─▶ unchanged
//!               │ AllowWithCookie  ─▶ URI = cleaned url, response gets Set-Cookie
//!               │ RewriteTo        ─▶ URI = challenge url
//!                                      │
//!                                      ├─ {challenge_path} ─▶ verify.html
//!                                      └─ everything else  ─▶ files under the output dir
//! ```
//!
//! Rewrites happen inside the server: the browser keeps the URL it asked for
//! and receives the challenge page in its place. The middleware wraps an outer
//! router whose only route is its fallback, so it runs before the inner
//! router picks a route for the rewritten URI.

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, COOKIE, HOST, SET_COOKIE};
use axum::http::{HeaderValue, Request, Uri};
use axum::middleware::{self, Next};
use axum::response::Response;
use chrono::Utc;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use url::Url;

use crate::gate::{AccessGate, Decision, GateRequest};
use crate::generate::challenge_file;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("No generated site at {0} (run `folio build` first)")]
    MissingSite(PathBuf),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the router serving `site_dir` through the gate.
pub fn app(gate: Arc<AccessGate>, site_dir: &Path) -> Router {
    let challenge_page = site_dir.join(challenge_file(gate.config()));
    let site = Router::new()
        .route_service(&gate.config().challenge_path, ServeFile::new(challenge_page))
        .fallback_service(ServeDir::new(site_dir));

    Router::new()
        .fallback_service(site)
        .layer(middleware::from_fn_with_state(gate, access_gate))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run(addr: SocketAddr, gate: AccessGate, site_dir: PathBuf) -> Result<(), ServeError> {
    if !site_dir.join("index.html").is_file() {
        return Err(ServeError::MissingSite(site_dir));
    }

    let gate_enabled = gate.config().enabled;
    let router = app(Arc::new(gate), &site_dir);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(
        site = %site_dir.display(),
        gate = gate_enabled,
        "serving on http://{addr}"
    );

    axum::serve(listener, router).await?;
    Ok(())
}

async fn access_gate(
    State(gate): State<Arc<AccessGate>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let decision = match gate_request(&req) {
        Ok(gate_req) => gate.decide(&gate_req, Utc::now()),
        Err(e) => {
            tracing::warn!(uri = %req.uri(), error = %e, "malformed request URL, showing challenge");
            let challenge = gate.config().challenge_path.clone();
            set_uri(&mut req, &challenge);
            return no_store(next.run(req).await);
        }
    };

    match decision {
        Decision::Allow => next.run(req).await,
        Decision::AllowWithCookie { url, grant } => {
            tracing::debug!(url = %url, "verification completed, issuing cookie");
            set_uri(&mut req, &path_and_query(&url));
            let mut response = next.run(req).await;
            match HeaderValue::from_str(&grant.set_cookie_header(&gate.config().cookie_name)) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(error = %e, "could not encode verification cookie"),
            }
            response
        }
        Decision::RewriteTo(url) => {
            tracing::debug!(from = %req.uri(), to = %url, "rewriting to challenge");
            set_uri(&mut req, &path_and_query(&url));
            no_store(next.run(req).await)
        }
    }
}

fn gate_request(req: &Request<Body>) -> Result<GateRequest, crate::gate::GateError> {
    let host = req.headers().get(HOST).and_then(|v| v.to_str().ok());
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let cookies: Vec<&str> = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let cookie_header = (!cookies.is_empty()).then(|| cookies.join("; "));
    GateRequest::parse(host, target, cookie_header.as_deref())
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn set_uri(req: &mut Request<Body>, target: &str) {
    match target.parse::<Uri>() {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => tracing::warn!(uri = target, error = %e, "could not rewrite request URI"),
    }
}

/// The challenge is served under other pages' URLs; keep it out of caches.
fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
