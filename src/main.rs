use std::process;

use driftlog::{
    application::{error::AppError, session::AdminAuth},
    config::{self, AuthSettings, Settings},
    infra::{
        db::SqliteRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use sqlx::SqlitePool;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let auth = admin_auth(&settings.auth)?;
    let pool = init_pool(&settings).await?;
    let state = HttpState::new(&settings, SqliteRepositories::new(pool), auth);
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;

    info!(
        target: "driftlog::server",
        addr = %settings.server.addr,
        environment = settings.environment.as_str(),
        posts_dir = %settings.content.posts_dir.display(),
        cache_ttl_secs = settings.content.cache_ttl.as_secs(),
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target: "driftlog::server", "Server stopped");
    Ok(())
}

async fn run_migrate(settings: Settings) -> Result<(), AppError> {
    init_pool(&settings).await?;
    info!(target: "driftlog::migrate", "Migrations applied");
    Ok(())
}

async fn init_pool(settings: &Settings) -> Result<SqlitePool, AppError> {
    let pool = SqliteRepositories::connect(
        &settings.database.url,
        settings.database.max_connections.get(),
    )
    .await
    .map_err(|err| InfraError::database(err.to_string()))?;

    SqliteRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(pool)
}

fn admin_auth(auth: &AuthSettings) -> Result<AdminAuth, AppError> {
    let admin_token = auth.admin_token.as_deref().ok_or_else(|| {
        InfraError::configuration("auth.admin_token is required (set DRIFTLOG__AUTH__ADMIN_TOKEN)")
    })?;
    let secret_key = auth.secret_key.as_deref().ok_or_else(|| {
        InfraError::configuration("auth.secret_key is required (set DRIFTLOG__AUTH__SECRET_KEY)")
    })?;

    AdminAuth::new(admin_token, secret_key)
        .map_err(|err| InfraError::configuration(err.to_string()).into())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: "driftlog::server", error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!(target: "driftlog::server", "Shutdown signal received");
}
