mod admin;
mod live;
mod middleware;
mod public;
mod state;

pub use middleware::TrustedHosts;
pub use state::HttpState;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

use self::middleware::{
    enforce_trusted_hosts, log_responses, render_error_pages, set_request_context,
};

/// Assemble the public, live and admin routes behind the shared middleware stack.
///
/// Layers run outermost first: request context, response logging, error pages,
/// then the `Host` check.
pub fn build_router(state: HttpState) -> Router {
    let chrome = Arc::clone(&state.chrome);
    let trusted_hosts = Arc::clone(&state.trusted_hosts);

    Router::new()
        .merge(public::routes())
        .merge(live::routes())
        .merge(admin::routes())
        .fallback(public::fallback)
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            trusted_hosts,
            enforce_trusted_hosts,
        ))
        .layer(axum_middleware::from_fn_with_state(
            chrome,
            render_error_pages,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
