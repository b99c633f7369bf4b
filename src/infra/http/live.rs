//! Public live feed and its token-or-session guarded mutations.

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::{
    application::error::HttpError,
    presentation::views::{LayoutContext, LiveTemplate, LiveView, render_template_response},
};

use super::HttpState;

pub(super) fn routes() -> Router<HttpState> {
    Router::new()
        .route("/live", get(live_feed))
        .route("/live/", get(live_feed))
        .route("/live/entry", post(create_entry))
        .route("/live/entry/{id}/delete", post(delete_entry))
        .route("/live/entry/{id}/pin", post(toggle_pin))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Requested page; anything unparseable is page 1.
    pub(super) fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct EntryForm {
    pub(super) body: String,
    pub(super) pinned: Option<String>,
    x_admin_token: Option<String>,
}

impl EntryForm {
    pub(super) fn is_pinned(&self) -> bool {
        self.pinned
            .as_deref()
            .is_some_and(|value| matches!(value, "true" | "on" | "1" | "yes"))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenForm {
    x_admin_token: Option<String>,
}

async fn live_feed(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let page = state.live.page(query.page()).await?;
    let can_manage = state.has_session(&jar);

    let chrome = state.chrome().with_title("Live");
    let view = LayoutContext::new(chrome, LiveView::new(page, can_manage));
    Ok(render_template_response(LiveTemplate { view }, StatusCode::OK))
}

async fn create_entry(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<EntryForm>,
) -> Result<Response, HttpError> {
    authorize(&state, &jar, form.x_admin_token.as_deref())?;
    state.live.create(&form.body, form.is_pinned()).await?;
    Ok(Redirect::to("/live").into_response())
}

async fn delete_entry(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<TokenForm>,
) -> Result<Response, HttpError> {
    authorize(&state, &jar, form.x_admin_token.as_deref())?;
    state.live.delete(id).await?;
    Ok(Redirect::to("/live").into_response())
}

async fn toggle_pin(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<TokenForm>,
) -> Result<Response, HttpError> {
    authorize(&state, &jar, form.x_admin_token.as_deref())?;
    state.live.toggle_pin(id).await?;
    Ok(Redirect::to("/live").into_response())
}

/// A valid session cookie or a matching `x_admin_token` form field.
fn authorize(state: &HttpState, jar: &CookieJar, token: Option<&str>) -> Result<(), HttpError> {
    if state.has_session(jar) || token.is_some_and(|token| state.auth.check_token(token)) {
        return Ok(());
    }
    Err(HttpError::new(
        "infra::http::live::authorize",
        StatusCode::FORBIDDEN,
        "Forbidden",
        "missing or invalid admin token",
    ))
}
