use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::application::error::HttpError;

use super::super::HttpState;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Drop the post snapshot. Accepts the `X-Admin-Token` header or a session cookie.
pub(super) async fn invalidate_cache(
    State(state): State<HttpState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let header_ok = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| state.auth.check_token(token));

    if !header_ok && !state.has_session(&jar) {
        return HttpError::new(
            "infra::http::admin::cache::invalidate_cache",
            StatusCode::FORBIDDEN,
            "Forbidden",
            "missing or invalid admin token",
        )
        .into_response();
    }

    state.content.invalidate_cache();
    Json(json!({ "status": "ok", "message": "Cache invalidated" })).into_response()
}
