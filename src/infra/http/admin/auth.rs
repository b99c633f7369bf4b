use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    application::session::{SESSION_COOKIE, SESSION_MAX_AGE_SECS},
    presentation::{
        admin::{AdminLoginTemplate, AdminLoginView},
        views::render_template_response,
    },
};

use super::super::HttpState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    password: String,
}

pub(super) async fn login_form(State(state): State<HttpState>, jar: CookieJar) -> Response {
    if state.has_session(&jar) {
        return Redirect::to("/admin").into_response();
    }
    render_login(&state, None, StatusCode::OK)
}

pub(super) async fn login_submit(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !state.auth.check_token(&form.password) {
        warn!(target: "driftlog::admin::auth", "Failed admin login attempt");
        return render_login(&state, Some("Invalid password"), StatusCode::UNAUTHORIZED);
    }

    let cookie = Cookie::build((SESSION_COOKIE, state.auth.create_session()))
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(SESSION_MAX_AGE_SECS));

    info!(target: "driftlog::admin::auth", "Admin logged in");
    (jar.add(cookie), Redirect::to("/admin")).into_response()
}

pub(super) async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/admin/login")).into_response()
}

fn render_login(state: &HttpState, error: Option<&str>, status: StatusCode) -> Response {
    let view = AdminLoginView {
        site_title: state.site_title.to_string(),
        error: error.map(str::to_string),
    };
    render_template_response(AdminLoginTemplate { view }, status)
}
