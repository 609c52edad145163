use std::{future::Future, process, sync::Arc};

use seo_svc::{
    application::{
        controller::Controller,
        error::AppError,
        repos::{HealthRepo, Stores},
    },
    cache::{CacheBackend, CacheKeys, CachePolicy, MemoryCache, NullCache, RedisCache},
    config::{self, CacheBackendKind, CacheSettings, DatabaseBackend},
    infra::{
        db::PostgresRepositories,
        discovery,
        error::InfraError,
        grpc::{self, GrpcState},
        http::{self, HttpState},
        memory::InMemoryRepositories,
        telemetry,
    },
};
use tokio::{sync::watch, try_join};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_postgres(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;
    info!(target = "seo_svc::migrate", "migrations applied");
    Ok(())
}

struct Backends {
    stores: Stores,
    health: Arc<dyn HealthRepo>,
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let backends = init_store(&settings).await?;
    let cache = init_cache(&settings.cache).await?;
    let controller = Controller::new(
        backends.stores,
        cache,
        CacheKeys::new(&settings.cache.key_prefix),
        CachePolicy::from(&settings.cache),
    );

    info!(
        target = "seo_svc::serve",
        cache = controller.cache_backend(),
        ttl_secs = settings.cache.ttl.as_secs(),
        http = %settings.server.http_addr,
        grpc = %settings.server.grpc_addr,
        "starting listeners"
    );

    let registry = discovery::from_settings(&settings.discovery)
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;
    let service_name = settings.discovery.service_name.as_str();
    discovery::register_best_effort(registry.as_ref(), service_name).await;

    let http_state = HttpState {
        controller: controller.clone(),
        health: backends.health,
        request_timeout: settings.server.request_timeout,
    };
    let grpc_state = GrpcState {
        controller: controller.clone(),
        request_timeout: settings.server.request_timeout,
    };

    let result = serve(&settings, http_state, grpc_state).await;

    controller.close().await;
    discovery::deregister_best_effort(registry.as_ref(), service_name).await;
    info!(target = "seo_svc::serve", "shutdown complete");

    result
}

async fn init_store(settings: &config::Settings) -> Result<Backends, AppError> {
    match settings.database.backend {
        DatabaseBackend::Memory => {
            warn!(
                target = "seo_svc::serve",
                "using the in-memory store; records are lost on exit"
            );
            let repo = Arc::new(InMemoryRepositories::new());
            Ok(Backends {
                stores: Stores::from_shared(repo.clone()),
                health: repo,
            })
        }
        DatabaseBackend::Postgres => {
            let pool = connect_postgres(settings).await?;
            PostgresRepositories::run_migrations(&pool)
                .await
                .map_err(InfraError::from)?;

            let repo = Arc::new(PostgresRepositories::new(pool));
            Ok(Backends {
                stores: Stores::from_shared(repo.clone()),
                health: repo,
            })
        }
    }
}

async fn connect_postgres(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(InfraError::from)?;
    Ok(pool)
}

async fn init_cache(settings: &CacheSettings) -> Result<Arc<dyn CacheBackend>, AppError> {
    let cache: Arc<dyn CacheBackend> = match settings.backend {
        CacheBackendKind::Disabled => Arc::new(NullCache),
        CacheBackendKind::Memory => Arc::new(MemoryCache::with_capacity(settings.max_entries)),
        CacheBackendKind::Redis => {
            let url = settings
                .redis_url
                .as_deref()
                .ok_or_else(|| InfraError::configuration("cache.redis_url is not configured"))?;
            match RedisCache::connect(url).await {
                Ok(redis) => Arc::new(redis),
                Err(err) => {
                    warn!(
                        target = "seo_svc::serve",
                        error = %err,
                        "redis unreachable at startup; serving without a cache"
                    );
                    Arc::new(NullCache)
                }
            }
        }
    };
    Ok(cache)
}

async fn serve(
    settings: &config::Settings,
    http_state: HttpState,
    grpc_state: GrpcState,
) -> Result<(), AppError> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        info!(target = "seo_svc::serve", "shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let http_addr = settings.server.http_addr;
    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .map_err(|err| InfraError::bind("http", http_addr, err))?;
    let http_shutdown = wait_for(shutdown_rx.clone());
    let http_server = async move {
        axum::serve(http_listener, http::build_router(http_state).into_make_service())
            .with_graceful_shutdown(http_shutdown)
            .await
            .map_err(|err| AppError::from(InfraError::serve("http", err)))
    };

    let (seo_service, page_service) = grpc::create_services(grpc_state);
    let grpc_addr = settings.server.grpc_addr;
    let grpc_shutdown = wait_for(shutdown_rx.clone());
    let grpc_server = async move {
        tonic::transport::Server::builder()
            .add_service(seo_service)
            .add_service(page_service)
            .serve_with_shutdown(grpc_addr, grpc_shutdown)
            .await
            .map_err(|err| AppError::from(InfraError::serve("grpc", err)))
    };

    let servers = async { try_join!(http_server, grpc_server).map(|_| ()) };
    let result = drain_with_deadline(servers, shutdown_rx, settings).await;

    signal_task.abort();
    result
}

/// Run both listeners; once shutdown starts they get `graceful_shutdown` to drain.
async fn drain_with_deadline(
    servers: impl Future<Output = Result<(), AppError>>,
    mut shutdown_rx: watch::Receiver<bool>,
    settings: &config::Settings,
) -> Result<(), AppError> {
    tokio::pin!(servers);

    tokio::select! {
        result = &mut servers => result,
        _ = shutdown_rx.wait_for(|stop| *stop) => {
            match tokio::time::timeout(settings.server.graceful_shutdown, &mut servers).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target = "seo_svc::serve",
                        grace_secs = settings.server.graceful_shutdown.as_secs(),
                        "graceful shutdown timed out; dropping open connections"
                    );
                    Ok(())
                }
            }
        }
    }
}

async fn wait_for(mut shutdown_rx: watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "seo_svc::serve", error = %err, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "seo_svc::serve", error = %err, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
