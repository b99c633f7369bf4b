use axum::{extract::State, http::StatusCode, response::Response};

use crate::{
    application::error::HttpError,
    presentation::{
        admin::{AdminDashboardTemplate, AdminDashboardView, AdminLayout},
        views::render_template_response,
    },
};

use super::{super::HttpState, AdminSession};

pub(super) async fn admin_dashboard(
    _session: AdminSession,
    State(state): State<HttpState>,
) -> Result<Response, HttpError> {
    let overview = state.dashboard.overview().await?;
    let view = AdminLayout::new(
        &state.site_title,
        "Dashboard",
        AdminDashboardView::from(overview),
    );
    Ok(render_template_response(
        AdminDashboardTemplate { view },
        StatusCode::OK,
    ))
}
