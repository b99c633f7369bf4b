use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, Request, StatusCode,
        header::{ALLOW, CONTENT_TYPE, HOST},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    application::error::{ErrorReport, HttpError},
    presentation::views::{LayoutChrome, render_error_response},
};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target: "driftlog::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target: "driftlog::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}

/// Replace bare 4xx/5xx bodies with the themed error page.
///
/// Responses that are already HTML (the 404 page, the login form) pass
/// through untouched. The original [`ErrorReport`] is carried over so the
/// logging layer still sees the cause.
pub async fn render_error_pages(
    State(chrome): State<Arc<LayoutChrome>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_html(response.headers()) {
        return response;
    }

    let mut page = render_error_response(chrome.as_ref().clone(), status);
    if let Some(allow) = response.headers().get(ALLOW) {
        page.headers_mut().insert(ALLOW, allow.clone());
    }
    if let Some(report) = response.extensions().get::<ErrorReport>() {
        report.clone().attach(&mut page);
    }
    page
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/html"))
}

/// Accepted `Host` values: `*`, exact hosts, and `*.suffix` subdomain wildcards.
#[derive(Debug, Clone, Default)]
pub struct TrustedHosts {
    any: bool,
    exact: Vec<String>,
    suffixes: Vec<String>,
}

impl TrustedHosts {
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut hosts = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim().to_ascii_lowercase();
            if entry.is_empty() {
                continue;
            }
            if entry == "*" {
                hosts.any = true;
            } else if let Some(suffix) = entry.strip_prefix("*.") {
                hosts.suffixes.push(format!(".{suffix}"));
            } else {
                hosts.exact.push(entry);
            }
        }
        hosts
    }

    pub fn allows(&self, host: Option<&str>) -> bool {
        if self.any {
            return true;
        }
        let Some(host) = host.map(strip_port).map(str::to_ascii_lowercase) else {
            return false;
        };
        self.exact.iter().any(|exact| *exact == host)
            || self.suffixes.iter().any(|suffix| host.ends_with(suffix.as_str()))
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

pub async fn enforce_trusted_hosts(
    State(hosts): State<Arc<TrustedHosts>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .map(str::to_string);

    if !hosts.allows(host.as_deref()) {
        return HttpError::new(
            "infra::http::middleware::enforce_trusted_hosts",
            StatusCode::BAD_REQUEST,
            "Invalid host header",
            format!("untrusted host `{}`", host.as_deref().unwrap_or("")),
        )
        .into_response();
    }

    next.run(request).await
}
