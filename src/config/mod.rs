//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{fmt, net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "driftlog";
const ENV_PREFIX: &str = "DRIFTLOG";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TRUSTED_HOST: &str = "*";
const DEFAULT_SITE_TITLE: &str = "MyBlog";
const DEFAULT_SITE_URL: &str = "http://localhost:8000";
const DEFAULT_SITE_DESCRIPTION: &str = "Notes on infrastructure, tooling and whatever else comes up.";
const DEFAULT_SITE_AUTHOR: &str = "admin@localhost";
const DEFAULT_POSTS_DIR: &str = "content/posts";
const DEFAULT_PAGES_DIR: &str = "content/pages";
const DEFAULT_IMAGES_DIR: &str = "content/images";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_DEV_CACHE_TTL_SECS: u64 = 5;
const DEFAULT_PROD_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Command-line arguments for the driftlog binary.
#[derive(Debug, Parser)]
#[command(name = "driftlog", version, about = "driftlog blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "DRIFTLOG_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the blog HTTP server.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the runtime environment (development|production).
    #[arg(long = "environment", value_name = "ENV")]
    pub environment: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the directory holding markdown posts.
    #[arg(long = "posts-dir", value_name = "PATH")]
    pub posts_dir: Option<PathBuf>,

    /// Override the directory holding markdown pages.
    #[arg(long = "pages-dir", value_name = "PATH")]
    pub pages_dir: Option<PathBuf>,

    /// Override the post cache lifetime; 0 disables caching.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: AppEnvironment,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub auth: AuthSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
}

impl AppEnvironment {
    pub fn as_str(self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
        }
    }

    fn default_log_level(self) -> LevelFilter {
        match self {
            AppEnvironment::Development => LevelFilter::DEBUG,
            AppEnvironment::Production => LevelFilter::INFO,
        }
    }

    fn default_cache_ttl_secs(self) -> u64 {
        match self {
            AppEnvironment::Development => DEFAULT_DEV_CACHE_TTL_SECS,
            AppEnvironment::Production => DEFAULT_PROD_CACHE_TTL_SECS,
        }
    }
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "expected `development` or `production`, got `{other}`"
            )),
        }
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    /// Accepted `Host` header values: `*`, exact hosts, or `*.suffix` wildcards.
    pub trusted_hosts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub title: String,
    /// Absolute base URL without a trailing slash.
    pub url: String,
    pub description: String,
    pub author: String,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub posts_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub images_dir: PathBuf,
    pub static_dir: PathBuf,
    pub cache_ttl: Duration,
}

/// Admin credentials. Both are required by `serve` but not by `migrate`.
#[derive(Clone, Default)]
pub struct AuthSettings {
    pub admin_token: Option<String>,
    pub secret_key: Option<String>,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    environment: Option<String>,
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    content: RawContentSettings,
    auth: RawAuthSettings,
    database: RawDatabaseSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(environment) = overrides.environment.as_ref() {
            self.environment = Some(environment.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(dir) = overrides.posts_dir.as_ref() {
            self.content.posts_dir = Some(dir.clone());
        }
        if let Some(dir) = overrides.pages_dir.as_ref() {
            self.content.pages_dir = Some(dir.clone());
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.content.cache_ttl_seconds = Some(ttl);
        }

        self.apply_database_override(&overrides.database);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            environment,
            server,
            logging,
            site,
            content,
            auth,
            database,
        } = raw;

        let environment = match environment {
            Some(value) => AppEnvironment::from_str(&value)
                .map_err(|reason| LoadError::invalid("environment", reason))?,
            None => AppEnvironment::default(),
        };

        Ok(Self {
            environment,
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging, environment)?,
            site: build_site_settings(site)?,
            content: build_content_settings(content, environment),
            auth: build_auth_settings(auth),
            database: build_database_settings(database)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let trusted_hosts = match server.trusted_hosts {
        Some(list) => list.into_hosts(),
        None => vec![DEFAULT_TRUSTED_HOST.to_string()],
    };
    if trusted_hosts.is_empty() {
        return Err(LoadError::invalid(
            "server.trusted_hosts",
            "at least one host pattern is required",
        ));
    }

    Ok(ServerSettings {
        addr,
        trusted_hosts,
    })
}

fn build_logging_settings(
    logging: RawLoggingSettings,
    environment: AppEnvironment,
) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => environment.default_log_level(),
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let raw_url = site.url.unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    let parsed = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("site.url", format!("failed to parse: {err}")))?;
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "site.url",
            "must be an absolute http(s) URL",
        ));
    }

    Ok(SiteSettings {
        title: site.title.unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        url: parsed.as_str().trim_end_matches('/').to_string(),
        description: site
            .description
            .unwrap_or_else(|| DEFAULT_SITE_DESCRIPTION.to_string()),
        author: site.author.unwrap_or_else(|| DEFAULT_SITE_AUTHOR.to_string()),
    })
}

fn build_content_settings(
    content: RawContentSettings,
    environment: AppEnvironment,
) -> ContentSettings {
    let ttl_secs = content
        .cache_ttl_seconds
        .unwrap_or_else(|| environment.default_cache_ttl_secs());

    ContentSettings {
        posts_dir: content
            .posts_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTS_DIR)),
        pages_dir: content
            .pages_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES_DIR)),
        images_dir: content
            .images_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
        static_dir: content
            .static_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        cache_ttl: Duration::from_secs(ttl_secs),
    }
}

fn build_auth_settings(auth: RawAuthSettings) -> AuthSettings {
    AuthSettings {
        admin_token: non_empty(auth.admin_token),
        secret_key: non_empty(auth.secret_key),
    }
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_empty(database.url).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    trusted_hosts: Option<RawHostList>,
}

/// Host patterns given either as a list or as one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawHostList {
    List(Vec<String>),
    Csv(String),
}

impl RawHostList {
    fn into_hosts(self) -> Vec<String> {
        let items = match self {
            RawHostList::List(items) => items,
            RawHostList::Csv(value) => value.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_ascii_lowercase())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    posts_dir: Option<PathBuf>,
    pages_dir: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
    cache_ttl_seconds: Option<u64>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    admin_token: Option<String>,
    secret_key: Option<String>,
}

impl fmt::Debug for RawAuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawAuthSettings { .. }")
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
