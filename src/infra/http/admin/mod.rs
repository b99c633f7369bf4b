mod auth;
mod cache;
mod dashboard;
mod live;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use super::HttpState;

pub(super) fn routes() -> Router<HttpState> {
    Router::new()
        .route("/admin", get(dashboard::admin_dashboard))
        .route("/admin/", get(dashboard::admin_dashboard))
        .route(
            "/admin/login",
            get(auth::login_form).post(auth::login_submit),
        )
        .route("/admin/logout", get(auth::logout))
        .route("/admin/live", get(live::admin_live))
        .route("/admin/live/entry", post(live::admin_live_create))
        .route("/admin/live/entry/{id}/delete", post(live::admin_live_delete))
        .route("/admin/live/entry/{id}/pin", post(live::admin_live_pin))
        .route("/admin/cache/invalidate", post(cache::invalidate_cache))
}

/// Proof of a valid admin session. Rejects with a redirect to the login form.
pub(super) struct AdminSession;

impl FromRequestParts<HttpState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if state.has_session(&jar) {
            return Ok(AdminSession);
        }

        debug!(
            target: "driftlog::admin::auth",
            path = %parts.uri.path(),
            "No valid admin session; redirecting to login"
        );
        Err(Redirect::to("/admin/login"))
    }
}
