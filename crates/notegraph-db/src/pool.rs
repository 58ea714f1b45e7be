//! Connection pool setup.
//!
//! The API server sizes the pool from its config. Test fixtures additionally
//! pin each pool to a private schema so tests can share one server.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use notegraph_core::{Error, Result};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// How many connections to open and where they resolve table names.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Schema searched before `public` on every new connection.
    pub schema: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            schema: None,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// The name must be a plain identifier: ASCII letters, digits and `_`.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// True when `name` is safe to splice into `SET search_path`.
pub fn is_valid_schema_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    let schema_label = config.schema.clone().unwrap_or_else(|| "public".to_string());

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME);

    if let Some(schema) = config.schema {
        if !is_valid_schema_name(&schema) {
            return Err(Error::Config(format!("Invalid schema name: {}", schema)));
        }
        options = options.after_connect(move |conn, _meta| {
            let sql = format!("SET search_path TO {}, public", schema);
            Box::pin(async move {
                sqlx::query(&sql).execute(&mut *conn).await?;
                Ok(())
            })
        });
    }

    let pool = options
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        schema = %schema_label,
        duration_ms = start.elapsed().as_millis() as u64,
        "Connected note store pool"
    );
    Ok(pool)
}

/// Log pool occupancy; warns when every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle();

    debug!(
        subsystem = "database",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool occupancy"
    );

    if idle == 0 && size > 0 {
        warn!(
            subsystem = "database",
            component = "pool",
            pool_size = size,
            "All pooled connections in use"
        );
    }
}
