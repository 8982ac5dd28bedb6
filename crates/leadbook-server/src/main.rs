//! Leadbook Server - Main entry point

use anyhow::Result;
use leadbook_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::info;

use leadbook_server::{
    api,
    audit::{AuditLog, AuditRecorder, AuditWorker, PgAuditLogStore, RetentionSweeper, WorkerOptions},
    auth::ClerkVerifier,
    config::{Config, QueueBackend},
    db,
    features::FeatureState,
    queue,
    shutdown::{join_background, shutdown_signal},
    storage::Storage,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Binary defaults first, LOG_* variables take precedence
    let log_config = LogConfig::builder()
        .log_file_prefix("leadbook-server")
        .filter_directives("leadbook_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Leadbook Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    let storage = Storage::new(config.storage.clone()).await?;
    info!("Storage client initialized");

    let task_queue = queue::from_config(&config.queue, db_pool.clone());
    let audit_log = AuditLog::new(Arc::new(PgAuditLogStore::new(db_pool.clone())));
    let verifier = ClerkVerifier::new(&config.auth)?;

    // The in-memory queue can only be drained from inside this process.
    let embedded = config.worker.embedded || config.queue.backend == QueueBackend::Memory;
    let cancel = CancellationToken::new();
    let mut background = Vec::new();

    if embedded {
        let worker = AuditWorker::new(
            task_queue.clone(),
            audit_log.clone(),
            WorkerOptions {
                concurrency: config.worker.concurrency,
                poll_interval: config.queue.poll_interval(),
            },
        );
        background.extend(worker.spawn(cancel.clone()));
        info!(concurrency = config.worker.concurrency, "Embedded audit worker started");

        if config.retention.enabled {
            let sweeper = RetentionSweeper::new(audit_log.clone(), config.retention.days);
            background.push(sweeper.spawn(cancel.clone()));
        }
    } else {
        info!("Audit jobs will be processed by a separate leadbook-worker process");
    }

    let state = FeatureState {
        db: db_pool,
        recorder: AuditRecorder::new(task_queue),
        audit_log,
        storage,
        verifier: Arc::new(verifier),
    };

    let app = api::create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cancel.cancel();
    join_background(
        background,
        Duration::from_secs(config.server.shutdown_timeout_secs),
    )
    .await;

    info!("Server shut down gracefully");

    Ok(())
}
