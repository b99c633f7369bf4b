use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;

use crate::{
    application::error::HttpError,
    infra::files::{FileRoot, FileRootError},
    presentation::views::{
        IndexTemplate, IndexView, LayoutContext, PageTemplate, PageView, PostDetailView,
        PostTemplate, render_not_found_response, render_template_response,
    },
};

use super::{HttpState, db_health_response};

pub(super) fn routes() -> Router<HttpState> {
    Router::new()
        .route("/", get(index))
        .route("/post/{slug}", get(post_detail))
        .route("/about", get(about))
        .route("/page/{slug}", get(page_detail))
        .route("/feed.xml", get(rss_feed))
        .route("/images/{*path}", get(serve_image))
        .route("/static/{*path}", get(serve_static))
        .route("/_health/db", get(public_health))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TagQuery {
    tag: Option<String>,
}

async fn index(
    State(state): State<HttpState>,
    Query(query): Query<TagQuery>,
) -> Result<Response, HttpError> {
    let index = state.blog.index(query.tag.as_deref()).await?;
    let view = LayoutContext::new(state.chrome(), IndexView::from(index));
    Ok(render_template_response(IndexTemplate { view }, StatusCode::OK))
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Response, HttpError> {
    let Some(detail) = state.blog.view_post(&slug).await? else {
        return Ok(render_not_found_response(state.chrome()));
    };

    let chrome = state.chrome().with_title(&detail.post.title);
    let view = LayoutContext::new(chrome, PostDetailView::from(detail));
    Ok(render_template_response(PostTemplate { view }, StatusCode::OK))
}

async fn about(State(state): State<HttpState>) -> Result<Response, HttpError> {
    render_page(&state, "about").await
}

async fn page_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Response, HttpError> {
    render_page(&state, &slug).await
}

async fn render_page(state: &HttpState, slug: &str) -> Result<Response, HttpError> {
    let Some(page) = state.pages.get_page(slug).await? else {
        return Ok(render_not_found_response(state.chrome()));
    };

    let chrome = state.chrome().with_title(&page.title);
    let view = LayoutContext::new(chrome, PageView::from(page));
    Ok(render_template_response(PageTemplate { view }, StatusCode::OK))
}

async fn rss_feed(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let body = state.syndication.rss_feed().await?;
    Ok(xml_response(body, "application/rss+xml"))
}

async fn serve_image(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    serve_file(
        &state.images,
        &path,
        "infra::http::public::serve_image",
        "public, max-age=86400",
    )
    .await
}

async fn serve_static(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    serve_file(
        &state.assets,
        &path,
        "infra::http::public::serve_static",
        "public, max-age=3600",
    )
    .await
}

async fn serve_file(
    root: &FileRoot,
    path: &str,
    source: &'static str,
    cache_control: &'static str,
) -> Response {
    match root.read(path).await {
        Ok(bytes) => build_file_response(path, bytes, cache_control),
        Err(FileRootError::InvalidPath | FileRootError::NotFound) => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "File not found",
            format!("no file at `{path}`"),
        )
        .into_response(),
        Err(err) => {
            error!(
                target: "driftlog::http::files",
                root = %root.root().display(),
                path = %path,
                error = %err,
                "failed to read file"
            );
            HttpError::from_error(
                source,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file",
                &err,
            )
            .into_response()
        }
    }
}

fn build_file_response(path: &str, bytes: Bytes, cache_control: &'static str) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));

    response
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

pub(super) async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome())
}

fn xml_response(body: String, content_type: &str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
