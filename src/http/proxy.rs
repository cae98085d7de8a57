//! Verbatim forwarding of unmatched requests to Prometheus.
//!
//! # Responsibilities
//! - Rewrite the URI onto the upstream base address
//! - Copy method, headers and body; strip hop-by-hop headers
//! - Relay the upstream response unchanged

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::server::AppState;

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
];

/// HTTP client bound to one upstream base address.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    base: String,
}

impl Forwarder {
    /// `base` is the upstream address, optionally with a path prefix.
    pub fn new(base: &str) -> Result<Self, axum::http::uri::InvalidUri> {
        let base = base.trim_end_matches('/').to_string();
        base.parse::<Uri>()?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { client, base })
    }

    /// Map an incoming URI onto the upstream.
    pub fn upstream_uri(&self, uri: &Uri) -> Result<Uri, axum::http::uri::InvalidUri> {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}{}", self.base, path_and_query).parse()
    }

    pub async fn forward(&self, request: Request<Body>) -> Response {
        let (mut parts, body) = request.into_parts();

        let uri = match self.upstream_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(uri = %parts.uri, error = %e, "Cannot map request onto upstream");
                return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
            }
        };

        tracing::debug!(method = %parts.method, upstream = %uri, "Forwarding request");
        parts.uri = uri;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        parts.headers.remove(header::HOST);

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Fallback handler: everything the API does not own goes to Prometheus.
pub async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.forwarder.forward(request).await
}
