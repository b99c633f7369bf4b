use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    application::error::HttpError,
    presentation::{
        admin::{AdminLayout, AdminLiveTemplate, AdminLiveView},
        views::render_template_response,
    },
};

use super::{
    super::{
        HttpState,
        live::{EntryForm, PageQuery},
    },
    AdminSession,
};

pub(super) async fn admin_live(
    _session: AdminSession,
    State(state): State<HttpState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let page = state.live.page(query.page()).await?;
    let view = AdminLayout::new(&state.site_title, "Live feed", AdminLiveView::from(page));
    Ok(render_template_response(
        AdminLiveTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn admin_live_create(
    _session: AdminSession,
    State(state): State<HttpState>,
    Form(form): Form<EntryForm>,
) -> Result<Response, HttpError> {
    state.live.create(&form.body, form.is_pinned()).await?;
    Ok(Redirect::to("/admin/live").into_response())
}

pub(super) async fn admin_live_delete(
    _session: AdminSession,
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state.live.delete(id).await?;
    Ok(Redirect::to("/admin/live").into_response())
}

pub(super) async fn admin_live_pin(
    _session: AdminSession,
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state.live.toggle_pin(id).await?;
    Ok(Redirect::to("/admin/live").into_response())
}
