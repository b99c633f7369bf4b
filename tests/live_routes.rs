mod support;

use axum::http::StatusCode;

use driftlog::application::repos::LiveEntriesRepo;
use support::{ADMIN_TOKEN, body_string, location, spawn_app};

#[tokio::test]
async fn empty_feed_renders() {
    let app = spawn_app().await;
    for uri in ["/live", "/live/", "/live?page=0", "/live?page=abc"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert!(body_string(response).await.contains("Page 1 of 1"), "{uri}");
    }
}

#[tokio::test]
async fn wrong_token_is_forbidden() {
    let app = spawn_app().await;

    let response = app
        .post_form("/live/entry", "body=hello&x_admin_token=wrong", None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_string(response).await.contains("Forbidden"));

    let response = app.post_form("/live/entry", "body=hello", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.repositories.count_entries().await.expect("count"), 0);
}

#[tokio::test]
async fn token_creates_entries_and_redirects() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            "/live/entry",
            &format!("body=**shipped**&pinned=on&x_admin_token={ADMIN_TOKEN}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/live"));

    let entries = app.repositories.list_entries(10, 0).await.expect("entries");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].pinned);

    let body = body_string(app.get("/live").await).await;
    assert!(body.contains("<strong>shipped</strong>"));
    assert!(body.contains("Pinned"));
}

#[tokio::test]
async fn blank_body_is_a_bad_request() {
    let app = spawn_app().await;
    let response = app
        .post_form(
            "/live/entry",
            &format!("body=+++&x_admin_token={ADMIN_TOKEN}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_entries_are_not_found() {
    let app = spawn_app().await;
    let form = format!("x_admin_token={ADMIN_TOKEN}");

    let delete = app.post_form("/live/entry/999/delete", &form, None).await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let pin = app.post_form("/live/entry/999/pin", &form, None).await;
    assert_eq!(pin.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_authorizes_pin_and_delete() {
    let app = spawn_app().await;
    let entry = app
        .repositories
        .create_entry("hello", false)
        .await
        .expect("entry");
    let cookie = app.login().await;

    let pin_uri = format!("/live/entry/{}/pin", entry.id);
    let response = app.post_form(&pin_uri, "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let listed = app.repositories.list_entries(10, 0).await.expect("entries");
    assert!(listed[0].pinned);

    app.post_form(&pin_uri, "", Some(&cookie)).await;
    let listed = app.repositories.list_entries(10, 0).await.expect("entries");
    assert!(!listed[0].pinned);

    let response = app
        .post_form(&format!("/live/entry/{}/delete", entry.id), "", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(app.repositories.count_entries().await.expect("count"), 0);
}

#[tokio::test]
async fn feed_is_paginated_by_twenty() {
    let app = spawn_app().await;
    for n in 0..25 {
        app.repositories
            .create_entry(&format!("entry {n}"), false)
            .await
            .expect("entry");
    }

    let first = body_string(app.get("/live").await).await;
    assert!(first.contains("Page 1 of 2"));
    assert!(first.contains(r#"href="/live?page=2""#));

    let second = body_string(app.get("/live?page=2").await).await;
    assert!(second.contains("Page 2 of 2"));
    assert_eq!(second.matches("class=\"live-entry").count(), 5);
}
