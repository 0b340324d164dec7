//! PostgreSQL connection pool.
//!
//! Every [`Client`](crate::client::Client) dispatches to one of these pools.
//! Connections identify themselves as `taskboard` in `pg_stat_activity`, and
//! sqlx's own per-statement logging is turned off because the client already
//! traces each statement with its model and operation.
//!
//! ```no_run
//! use taskboard_db::config::DatabaseConfig;
//! use taskboard_db::db::pool::{create_pool, pool_stats};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(&DatabaseConfig::from_env()?).await?;
//! println!("{} connections open", pool_stats(&pool).size);
//! # Ok(())
//! # }
//! ```

use crate::config::DatabaseConfig;
use crate::error::DbResult;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Reported to the server as `application_name`
pub const APPLICATION_NAME: &str = "taskboard";

/// Parses the configured URL into connection options
pub fn connect_options(config: &DatabaseConfig) -> DbResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&config.url)?
        .application_name(APPLICATION_NAME)
        .disable_statement_logging();
    Ok(options)
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
        .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs))
        .test_before_acquire(config.test_before_acquire)
}

/// Connects a pool and checks the server answers before returning it.
///
/// # Errors
///
/// Fails when the URL cannot be parsed, no connection can be opened within
/// the acquire timeout, or the health check fails.
pub async fn create_pool(config: &DatabaseConfig) -> DbResult<PgPool> {
    let options = connect_options(config)?;
    info!(
        host = options.get_host(),
        database = ?options.get_database(),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let pool = pool_options(config).connect_with(options).await?;
    let latency = health_check(&pool).await?;

    info!(
        latency_ms = latency.as_millis() as u64,
        "Database connection pool ready"
    );
    Ok(pool)
}

/// Round-trips `SELECT 1` and returns how long it took
pub async fn health_check(pool: &PgPool) -> DbResult<Duration> {
    let started = Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    let latency = started.elapsed();

    debug!(latency_ms = latency.as_millis() as u64, "Database health check passed");
    Ok(latency)
}

/// Snapshot of pool usage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    /// Open connections, idle or in use
    pub size: u32,
    pub idle: usize,
    pub in_use: usize,
    pub max_connections: u32,
    pub is_closed: bool,
}

impl PoolStats {
    /// Share of `max_connections` currently checked out
    pub fn utilization(&self) -> f64 {
        if self.max_connections == 0 {
            return 0.0;
        }
        self.in_use as f64 / self.max_connections as f64
    }
}

pub fn pool_stats(pool: &PgPool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle();

    PoolStats {
        size,
        idle,
        in_use: (size as usize).saturating_sub(idle),
        max_connections: pool.options().get_max_connections(),
        is_closed: pool.is_closed(),
    }
}

/// Waits for checked-out connections to return, then closes the pool
pub async fn close_pool(pool: &PgPool) {
    let stats = pool_stats(pool);
    info!(in_use = stats.in_use, size = stats.size, "Closing database connection pool");
    pool.close().await;
    debug!("Database connection pool closed");
}
