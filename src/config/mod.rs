//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{
    Args, Parser, Subcommand,
    builder::{BoolishValueParser, PossibleValuesParser},
};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "seo-svc";
const ENV_PREFIX: &str = "SEO_SVC";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_GRPC_PORT: u16 = 50051;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;
const DEFAULT_CACHE_OP_TIMEOUT_MS: u64 = 250;
const DEFAULT_CACHE_MAX_ENTRIES: u64 = 10_000;
const DEFAULT_CACHE_KEY_PREFIX: &str = "seo-svc";
const DEFAULT_SERVICE_NAME: &str = "seo-svc";

const DATABASE_BACKENDS: [&str; 2] = ["postgres", "memory"];
const CACHE_BACKENDS: [&str; 3] = ["redis", "memory", "disabled"];

/// Command-line arguments for the seo-svc binary.
#[derive(Debug, Parser)]
#[command(
    name = "seo-svc",
    version,
    about = "SEO and page metadata service (HTTP + gRPC)"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SEO_SVC_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP and gRPC listeners.
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
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the listener host shared by HTTP and gRPC.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the HTTP listener port.
    #[arg(long = "http-port", value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Override the gRPC listener port.
    #[arg(long = "grpc-port", value_name = "PORT")]
    pub grpc_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the per-request operation deadline.
    #[arg(long = "request-timeout-ms", value_name = "MILLIS")]
    pub request_timeout_ms: Option<u64>,

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

    /// Select the store backend.
    #[arg(
        long = "database-backend",
        value_name = "BACKEND",
        value_parser = PossibleValuesParser::new(DATABASE_BACKENDS)
    )]
    pub database_backend: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Select the cache backend.
    #[arg(
        long = "cache-backend",
        value_name = "BACKEND",
        value_parser = PossibleValuesParser::new(CACHE_BACKENDS)
    )]
    pub cache_backend: Option<String>,

    /// Override the Redis connection URL.
    #[arg(long = "cache-redis-url", value_name = "URL")]
    pub cache_redis_url: Option<String>,

    /// Override the cache entry TTL.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the cache key namespace.
    #[arg(long = "cache-key-prefix", value_name = "PREFIX")]
    pub cache_key_prefix: Option<String>,

    /// Override the per-operation cache timeout.
    #[arg(long = "cache-op-timeout-ms", value_name = "MILLIS")]
    pub cache_op_timeout_ms: Option<u64>,

    /// Cap the number of entries held by the memory cache.
    #[arg(long = "cache-max-entries", value_name = "COUNT")]
    pub cache_max_entries: Option<u64>,

    /// Override the service registry URL.
    #[arg(long = "discovery-url", value_name = "URL")]
    pub discovery_url: Option<String>,

    /// Override the name this instance registers under.
    #[arg(long = "discovery-service-name", value_name = "NAME")]
    pub discovery_service_name: Option<String>,

    /// Override the address advertised to the registry.
    #[arg(long = "discovery-advertise-url", value_name = "URL")]
    pub discovery_advertise_url: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub discovery: DiscoverySettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub http_addr: SocketAddr,
    pub grpc_addr: SocketAddr,
    pub graceful_shutdown: Duration,
    /// Deadline applied to every controller operation.
    pub request_timeout: Duration,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub redis_url: Option<String>,
    pub ttl: Duration,
    pub key_prefix: String,
    pub op_timeout: Duration,
    /// Entry limit for the memory backend.
    pub max_entries: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Registry base URL; discovery is off when absent.
    pub url: Option<Url>,
    pub service_name: String,
    pub advertise_url: Url,
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

/// Load settings using the configured precedence (file → environment → CLI).
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
        Some(Command::Migrate(args)) => raw.apply_migrate_overrides(args),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    discovery: RawDiscoverySettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_database_override(&overrides.database);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.http_port {
            self.server.http_port = Some(port);
        }
        if let Some(port) = overrides.grpc_port {
            self.server.grpc_port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(millis) = overrides.request_timeout_ms {
            self.server.request_timeout_ms = Some(millis);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(backend) = overrides.database_backend.as_ref() {
            self.database.backend = Some(backend.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.cache_redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(prefix) = overrides.cache_key_prefix.as_ref() {
            self.cache.key_prefix = Some(prefix.clone());
        }
        if let Some(millis) = overrides.cache_op_timeout_ms {
            self.cache.op_timeout_ms = Some(millis);
        }
        if let Some(max) = overrides.cache_max_entries {
            self.cache.max_entries = Some(max);
        }
        if let Some(url) = overrides.discovery_url.as_ref() {
            self.discovery.url = Some(url.clone());
        }
        if let Some(name) = overrides.discovery_service_name.as_ref() {
            self.discovery.service_name = Some(name.clone());
        }
        if let Some(url) = overrides.discovery_advertise_url.as_ref() {
            self.discovery.advertise_url = Some(url.clone());
        }
    }

    fn apply_migrate_overrides(&mut self, args: &MigrateArgs) {
        self.apply_database_override(&args.database);
        // Migrations only make sense against Postgres.
        self.database.backend = Some("postgres".to_string());
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
            server,
            logging,
            database,
            cache,
            discovery,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let database = build_database_settings(database)?;
        let cache = build_cache_settings(cache)?;
        let discovery = build_discovery_settings(discovery, &server)?;

        Ok(Self {
            server,
            logging,
            database,
            cache,
            discovery,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let http_port = server.http_port.unwrap_or(DEFAULT_HTTP_PORT);
    if http_port == 0 {
        return Err(LoadError::invalid(
            "server.http_port",
            "port must be greater than zero",
        ));
    }

    let grpc_port = server.grpc_port.unwrap_or(DEFAULT_GRPC_PORT);
    if grpc_port == 0 {
        return Err(LoadError::invalid(
            "server.grpc_port",
            "port must be greater than zero",
        ));
    }
    if grpc_port == http_port {
        return Err(LoadError::invalid(
            "server.grpc_port",
            "must differ from server.http_port",
        ));
    }

    let http_addr = parse_socket_addr(&host, http_port)
        .map_err(|reason| LoadError::invalid("server.host", reason))?;
    let grpc_addr = parse_socket_addr(&host, grpc_port)
        .map_err(|reason| LoadError::invalid("server.host", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    let request_timeout_ms = server
        .request_timeout_ms
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
    if request_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "server.request_timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        http_addr,
        grpc_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        request_timeout: Duration::from_millis(request_timeout_ms),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let backend = match non_blank(database.backend).as_deref() {
        None | Some("postgres") => DatabaseBackend::Postgres,
        Some("memory") => DatabaseBackend::Memory,
        Some(other) => {
            return Err(LoadError::invalid(
                "database.backend",
                format!("unknown backend `{other}` (expected postgres or memory)"),
            ));
        }
    };

    let url = non_blank(database.url);
    if backend == DatabaseBackend::Postgres && url.is_none() {
        return Err(LoadError::invalid(
            "database.url",
            "required when database.backend is postgres",
        ));
    }

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    Ok(DatabaseSettings {
        backend,
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match non_blank(cache.backend).as_deref() {
        None | Some("memory") => CacheBackendKind::Memory,
        Some("redis") => CacheBackendKind::Redis,
        Some("disabled") => CacheBackendKind::Disabled,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("unknown backend `{other}` (expected redis, memory or disabled)"),
            ));
        }
    };

    let redis_url = non_blank(cache.redis_url);
    if backend == CacheBackendKind::Redis && redis_url.is_none() {
        return Err(LoadError::invalid(
            "cache.redis_url",
            "required when cache.backend is redis",
        ));
    }

    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    let op_timeout_ms = cache.op_timeout_ms.unwrap_or(DEFAULT_CACHE_OP_TIMEOUT_MS);
    if op_timeout_ms == 0 {
        return Err(LoadError::invalid(
            "cache.op_timeout_ms",
            "must be greater than zero",
        ));
    }

    let key_prefix = match cache.key_prefix {
        Some(prefix) if prefix.trim().is_empty() => {
            return Err(LoadError::invalid(
                "cache.key_prefix",
                "must not be blank",
            ));
        }
        Some(prefix) => prefix,
        None => DEFAULT_CACHE_KEY_PREFIX.to_string(),
    };

    let max_entries = non_zero_usize(
        cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
        "cache.max_entries",
    )?;

    Ok(CacheSettings {
        backend,
        redis_url,
        ttl: Duration::from_secs(ttl_seconds),
        key_prefix,
        op_timeout: Duration::from_millis(op_timeout_ms),
        max_entries,
    })
}

fn build_discovery_settings(
    discovery: RawDiscoverySettings,
    server: &ServerSettings,
) -> Result<DiscoverySettings, LoadError> {
    let url = non_blank(discovery.url)
        .map(|value| parse_url(&value, "discovery.url"))
        .transpose()?;

    let service_name =
        non_blank(discovery.service_name).unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());

    let advertise_url = match non_blank(discovery.advertise_url) {
        Some(value) => parse_url(&value, "discovery.advertise_url")?,
        None => parse_url(
            &format!("http://{}", server.http_addr),
            "discovery.advertise_url",
        )?,
    };

    Ok(DiscoverySettings {
        url,
        service_name,
        advertise_url,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    http_port: Option<u16>,
    grpc_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    backend: Option<String>,
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    redis_url: Option<String>,
    ttl_seconds: Option<u64>,
    key_prefix: Option<String>,
    op_timeout_ms: Option<u64>,
    max_entries: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDiscoverySettings {
    url: Option<String>,
    service_name: Option<String>,
    advertise_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    Url::parse(value).map_err(|err| LoadError::invalid(key, format!("invalid url `{value}`: {err}")))
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
