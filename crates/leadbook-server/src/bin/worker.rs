//! Leadbook audit worker
//!
//! Drains the shared `task_queue` table into the audit log and runs the
//! retention sweeper. Any number of these can run next to the API process.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use leadbook_common::{
    audit_job::AUDIT_QUEUE,
    logging::{init_logging, LogConfig},
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use leadbook_server::{
    audit::{AuditLog, AuditWorker, PgAuditLogStore, RetentionSweeper, WorkerOptions},
    config::{Config, QueueBackend},
    db,
    queue::{DeliveryPolicy, PgTaskQueue},
    shutdown::{join_background, shutdown_signal},
};

#[derive(Parser, Debug)]
#[command(name = "leadbook-worker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Concurrent consumer tasks
    #[arg(short, long, env = "WORKER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Do not run the retention sweeper in this process
    #[arg(long)]
    no_sweeper: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_config = LogConfig::builder()
        .log_file_prefix("leadbook-worker")
        .filter_directives("leadbook_server=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = Config::load().context("Failed to load config")?;
    if config.queue.backend == QueueBackend::Memory {
        anyhow::bail!(
            "QUEUE_BACKEND=memory cannot be shared with a separate worker; use WORKER_EMBEDDED=true instead"
        );
    }

    let concurrency = args.concurrency.unwrap_or(config.worker.concurrency);
    if concurrency == 0 {
        anyhow::bail!("--concurrency must be at least 1");
    }

    info!(concurrency, queue = AUDIT_QUEUE, "Starting Leadbook audit worker");

    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    let task_queue = Arc::new(PgTaskQueue::new(
        db_pool.clone(),
        AUDIT_QUEUE,
        DeliveryPolicy::from(&config.queue),
    ));
    let audit_log = AuditLog::new(Arc::new(PgAuditLogStore::new(db_pool)));

    let cancel = CancellationToken::new();
    let mut background = AuditWorker::new(
        task_queue,
        audit_log.clone(),
        WorkerOptions {
            concurrency,
            poll_interval: config.queue.poll_interval(),
        },
    )
    .spawn(cancel.clone());

    if config.retention.enabled && !args.no_sweeper {
        background.push(RetentionSweeper::new(audit_log, config.retention.days).spawn(cancel.clone()));
    }

    shutdown_signal().await;
    cancel.cancel();
    join_background(
        background,
        Duration::from_secs(config.server.shutdown_timeout_secs),
    )
    .await;

    info!("Audit worker stopped");
    Ok(())
}
