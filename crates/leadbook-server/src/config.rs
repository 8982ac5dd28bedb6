//! Configuration management
//!
//! Everything is read from the environment (with `.env` support). Each value
//! has a named default below so a bare `cargo run` works against a local
//! Postgres.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::config::StorageConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3001;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/leadbook";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// Queue / Worker Constants
// ============================================================================

/// How long a consumer sleeps when the queue is empty.
pub const DEFAULT_QUEUE_POLL_INTERVAL_MS: u64 = 500;

/// Lease length for a claimed job. An unfinished job is redelivered after this.
pub const DEFAULT_QUEUE_VISIBILITY_TIMEOUT_SECS: u64 = 300;

/// Deliveries before a job is parked as dead.
pub const DEFAULT_QUEUE_MAX_ATTEMPTS: i32 = 5;

/// Concurrent consumer tasks per worker process.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 5;

/// Audit records older than this many days are purged.
pub const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 30;

/// Upper bound on the retention horizon (ten years).
pub const MAX_AUDIT_RETENTION_DAYS: i64 = 3650;

/// Default identity provider API base.
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub queue: QueueConfig,
    pub worker: WorkerConfig,
    pub retention: RetentionConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Which task queue implementation backs the audit pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// Shared `task_queue` table; survives restarts and serves separate worker processes.
    Postgres,
    /// In-process queue; only an embedded worker can drain it.
    Memory,
}

impl std::str::FromStr for QueueBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(QueueBackend::Postgres),
            "memory" | "in-memory" => Ok(QueueBackend::Memory),
            _ => anyhow::bail!("Invalid QUEUE_BACKEND: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    pub poll_interval_ms: u64,
    pub visibility_timeout_secs: u64,
    pub max_attempts: i32,
}

impl QueueConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub concurrency: usize,
    /// Run consumers and the retention sweeper inside the API process.
    pub embedded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub enabled: bool,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM-encoded RSA public key used to verify session tokens.
    pub jwt_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub api_url: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            queue: QueueConfig {
                backend: match std::env::var("QUEUE_BACKEND") {
                    Ok(value) => value.parse()?,
                    Err(_) => QueueBackend::Postgres,
                },
                poll_interval_ms: env_or("QUEUE_POLL_INTERVAL_MS", DEFAULT_QUEUE_POLL_INTERVAL_MS),
                visibility_timeout_secs: env_or(
                    "QUEUE_VISIBILITY_TIMEOUT_SECS",
                    DEFAULT_QUEUE_VISIBILITY_TIMEOUT_SECS,
                ),
                max_attempts: env_or("QUEUE_MAX_ATTEMPTS", DEFAULT_QUEUE_MAX_ATTEMPTS),
            },
            worker: WorkerConfig {
                concurrency: env_or("WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY),
                embedded: env_or("WORKER_EMBEDDED", false),
            },
            retention: RetentionConfig {
                enabled: env_or("AUDIT_RETENTION_ENABLED", true),
                days: env_or("AUDIT_RETENTION_DAYS", DEFAULT_AUDIT_RETENTION_DAYS),
            },
            auth: AuthConfig {
                // PEM keys are often stored on one line with literal "\n" escapes.
                jwt_key: env_opt("CLERK_JWT_KEY").map(|k| k.replace("\\n", "\n")),
                secret_key: env_opt("CLERK_SECRET_KEY"),
                api_url: std::env::var("CLERK_API_URL")
                    .unwrap_or_else(|_| DEFAULT_CLERK_API_URL.to_string()),
            },
            storage: StorageConfig::from_env(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.worker.concurrency == 0 {
            anyhow::bail!("WORKER_CONCURRENCY must be at least 1");
        }

        if self.queue.max_attempts < 1 {
            anyhow::bail!("QUEUE_MAX_ATTEMPTS must be at least 1");
        }

        if self.queue.visibility_timeout_secs == 0 {
            anyhow::bail!("QUEUE_VISIBILITY_TIMEOUT_SECS must be greater than 0");
        }

        if !(1..=MAX_AUDIT_RETENTION_DAYS).contains(&self.retention.days) {
            anyhow::bail!(
                "AUDIT_RETENTION_DAYS must be between 1 and {}",
                MAX_AUDIT_RETENTION_DAYS
            );
        }

        if self.queue.backend == QueueBackend::Memory && !self.worker.embedded {
            tracing::warn!(
                "QUEUE_BACKEND=memory without WORKER_EMBEDDED=true - audit jobs will never be processed"
            );
        }

        if self.auth.jwt_key.is_none() {
            tracing::warn!("CLERK_JWT_KEY is not set - every authenticated request will be rejected");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            queue: QueueConfig {
                backend: QueueBackend::Postgres,
                poll_interval_ms: DEFAULT_QUEUE_POLL_INTERVAL_MS,
                visibility_timeout_secs: DEFAULT_QUEUE_VISIBILITY_TIMEOUT_SECS,
                max_attempts: DEFAULT_QUEUE_MAX_ATTEMPTS,
            },
            worker: WorkerConfig {
                concurrency: DEFAULT_WORKER_CONCURRENCY,
                embedded: false,
            },
            retention: RetentionConfig {
                enabled: true,
                days: DEFAULT_AUDIT_RETENTION_DAYS,
            },
            auth: AuthConfig {
                jwt_key: None,
                secret_key: None,
                api_url: DEFAULT_CLERK_API_URL.to_string(),
            },
            storage: StorageConfig::default(),
        }
    }
}
