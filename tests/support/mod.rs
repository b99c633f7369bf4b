#![allow(dead_code)]

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{
        Request, Response,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::level_filters::LevelFilter;

use driftlog::{
    application::session::{AdminAuth, SESSION_COOKIE},
    config::{
        AppEnvironment, AuthSettings, ContentSettings, DatabaseSettings, LogFormat,
        LoggingSettings, ServerSettings, Settings, SiteSettings,
    },
    infra::{
        db::SqliteRepositories,
        http::{HttpState, build_router},
    },
};

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const SECRET_KEY: &str = "test-secret-key";

pub const SAMPLE_POST: &str = "---
title: Test Post
date: 01.01.2026
slug: test-post
summary: A post used by the integration tests
tags:
  - devops
  - python
---

## Hello

Some `inline code` here.

```bash
echo hello
```
";

pub const SAMPLE_POST_2: &str = "---
title: Another Post
date: 02.01.2026
slug: another-post
tags:
  - kubernetes
---

Second post body.
";

pub const ABOUT_PAGE: &str = "---
title: About
---

## whoami

Just a person writing things down.
";

pub struct TestApp {
    pub router: Router,
    pub content: TempDir,
    pub repositories: SqliteRepositories,
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).expect("request"))
            .await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.send(
            Request::get(uri)
                .header(COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).expect("request"))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    /// Log in through the form and return the `name=value` cookie pair.
    pub async fn login(&self) -> String {
        let response = self
            .post_form("/admin/login", &format!("password={ADMIN_TOKEN}"), None)
            .await;
        session_cookie(&response).expect("login sets the session cookie")
    }

    pub fn write_post(&self, file_name: &str, contents: &str) {
        std::fs::write(self.content.path().join("posts").join(file_name), contents)
            .expect("write post");
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Duration::from_secs(300), &["*"]).await
}

pub async fn spawn_app_with(cache_ttl: Duration, trusted_hosts: &[&str]) -> TestApp {
    let content = tempfile::tempdir().expect("tempdir");
    let root = content.path();
    for dir in ["posts", "pages", "images", "static"] {
        std::fs::create_dir_all(root.join(dir)).expect("content dir");
    }
    std::fs::write(root.join("posts/test-post.md"), SAMPLE_POST).expect("post");
    std::fs::write(root.join("posts/another-post.md"), SAMPLE_POST_2).expect("post");
    std::fs::write(root.join("pages/about.md"), ABOUT_PAGE).expect("page");
    std::fs::write(root.join("images/pixel.png"), b"\x89PNG\r\n\x1a\n").expect("image");
    std::fs::write(root.join("static/style.css"), "body { margin: 0; }").expect("css");

    let pool = SqliteRepositories::connect_in_memory()
        .await
        .expect("in-memory pool");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("migrations");
    let repositories = SqliteRepositories::new(pool);

    let settings = settings(root, cache_ttl, trusted_hosts);
    let auth = AdminAuth::new(ADMIN_TOKEN, SECRET_KEY).expect("auth");
    let router = build_router(HttpState::new(&settings, repositories.clone(), auth));

    TestApp {
        router,
        content,
        repositories,
    }
}

fn settings(root: &Path, cache_ttl: Duration, trusted_hosts: &[&str]) -> Settings {
    Settings {
        environment: AppEnvironment::Development,
        server: ServerSettings {
            addr: "127.0.0.1:0".parse().expect("addr"),
            trusted_hosts: trusted_hosts.iter().map(|host| host.to_string()).collect(),
        },
        logging: LoggingSettings {
            level: LevelFilter::DEBUG,
            format: LogFormat::Compact,
        },
        site: SiteSettings {
            title: "MyBlog".to_string(),
            url: "http://localhost:8000".to_string(),
            description: "Integration test blog".to_string(),
            author: "tester@example.com".to_string(),
        },
        content: ContentSettings {
            posts_dir: root.join("posts"),
            pages_dir: root.join("pages"),
            images_dir: root.join("images"),
            static_dir: root.join("static"),
            cache_ttl,
        },
        auth: AuthSettings {
            admin_token: Some(ADMIN_TOKEN.to_string()),
            secret_key: Some(SECRET_KEY.to_string()),
        },
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: NonZeroU32::MIN,
        },
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// The `admin_session=...` pair from a `Set-Cookie` header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(axum::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
}
