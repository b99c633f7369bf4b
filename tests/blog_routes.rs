mod support;

use std::time::Duration;

use axum::http::{StatusCode, header::CONTENT_TYPE};
use quick_xml::{Reader, events::Event};

use support::{body_string, spawn_app, spawn_app_with};

#[tokio::test]
async fn index_lists_posts_newest_first_with_tag_cloud() {
    let app = spawn_app().await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;

    assert!(body.contains("MyBlog"));
    let newer = body.find("Another Post").expect("newer post listed");
    let older = body.find("Test Post").expect("older post listed");
    assert!(newer < older, "posts should be sorted by date descending");
    for tag in ["#devops", "#python", "#kubernetes"] {
        assert!(body.contains(tag), "tag cloud should contain {tag}");
    }
}

#[tokio::test]
async fn tag_filter_narrows_the_listing() {
    let app = spawn_app().await;

    let body = body_string(app.get("/?tag=kubernetes").await).await;
    assert!(body.contains("Another Post"));
    assert!(!body.contains("Test Post"));
    assert!(body.contains("Posts tagged"));

    let response = app.get("/?tag=nothing-here").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(!body.contains("Another Post"));
    assert!(!body.contains("Test Post"));
}

#[tokio::test]
async fn post_detail_renders_markdown_and_counts_views() {
    let app = spawn_app().await;

    for expected in 1..=3 {
        let response = app.get("/post/test-post").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#"id="hello""#));
        assert!(body.contains("Hello</h2>"));
        assert!(body.contains("<code>inline code</code>"));
        assert!(body.contains(r#"<pre class="highlight" data-language="bash">"#));
        assert!(body.contains(&format!("{expected} views")), "after visit {expected}");
    }
}

#[tokio::test]
async fn unknown_post_is_a_404_page_and_not_counted() {
    let app = spawn_app().await;

    let response = app.get("/post/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response).await;
    assert!(body.contains("404"));
    assert!(body.contains("Not Found"));

    use driftlog::application::repos::PostStatsRepo;
    let stats = app.repositories.list_all().await.expect("stats");
    assert!(stats.is_empty());
}

#[tokio::test]
async fn unknown_paths_render_the_error_page() {
    let app = spawn_app().await;

    let response = app.get("/no/such/thing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    assert!(body_string(response).await.contains("404"));
}

#[tokio::test]
async fn pages_are_served_by_slug() {
    let app = spawn_app().await;

    let about = app.get("/about").await;
    assert_eq!(about.status(), StatusCode::OK);
    let body = body_string(about).await;
    assert!(body.contains("whoami</h2>"));
    assert!(body.contains("<title>About | MyBlog</title>"));

    assert_eq!(app.get("/page/about").await.status(), StatusCode::OK);
    assert_eq!(app.get("/page/missing").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rss_feed_is_well_formed() {
    let app = spawn_app().await;

    let response = app.get("/feed.xml").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).expect("content type"),
        "application/rss+xml"
    );

    let body = body_string(response).await;
    let mut reader = Reader::from_str(&body);
    let mut items = 0;
    loop {
        match reader.read_event().expect("well-formed xml") {
            Event::Start(start) if start.name().as_ref() == b"item" => items += 1,
            Event::Eof => break,
            _ => {}
        }
    }
    assert_eq!(items, 2);
    assert!(body.contains("<link>http://localhost:8000/post/test-post</link>"));
}

#[tokio::test]
async fn files_are_served_from_their_roots() {
    let app = spawn_app().await;

    let image = app.get("/images/pixel.png").await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers().get(CONTENT_TYPE).expect("type"), "image/png");

    let css = app.get("/static/style.css").await;
    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(body_string(css).await, "body { margin: 0; }");

    assert_eq!(app.get("/images/nope.png").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.get("/static/../posts/test-post.md").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn health_check_answers_no_content() {
    let app = spawn_app().await;
    assert_eq!(app.get("/_health/db").await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn cached_listing_ignores_new_files_until_invalidated() {
    let app = spawn_app().await;
    assert!(!body_string(app.get("/").await).await.contains("Fresh Post"));

    app.write_post(
        "fresh.md",
        "---\ntitle: Fresh Post\ndate: 2026-02-01\nslug: fresh\n---\nnew\n",
    );
    assert!(!body_string(app.get("/").await).await.contains("Fresh Post"));

    let response = app
        .send(
            axum::http::Request::post("/admin/cache/invalidate")
                .header("X-Admin-Token", support::ADMIN_TOKEN)
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(app.get("/").await).await.contains("Fresh Post"));
}

#[tokio::test]
async fn malformed_post_fails_the_listing() {
    let app = spawn_app_with(Duration::ZERO, &["*"]).await;
    app.write_post("broken.md", "---\ntitle: Broken\ndate: someday\nslug: broken\n---\n");

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("Something went wrong on our end."));
}

#[tokio::test]
async fn untrusted_hosts_are_rejected() {
    let app = spawn_app_with(Duration::from_secs(60), &["blog.example.com"]).await;

    let rejected = app
        .send(
            axum::http::Request::get("/")
                .header("Host", "evil.example.net")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = app
        .send(
            axum::http::Request::get("/")
                .header("Host", "blog.example.com:8000")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
}
