/// Schema migrations and database lifecycle
///
/// The SQL under `migrations/` at the workspace root is embedded at compile
/// time. Each migration is a reversible `{version}_{name}.up.sql` /
/// `.down.sql` pair; sqlx records applied versions in `_sqlx_migrations`.
///
/// # Example
///
/// ```no_run
/// use taskboard_db::config::DatabaseConfig;
/// use taskboard_db::db::migrations::{ensure_database_exists, get_migration_status, run_migrations};
/// use taskboard_db::db::pool::create_pool;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DatabaseConfig::from_env()?;
/// ensure_database_exists(&config.url).await?;
///
/// let pool = create_pool(&config).await?;
/// run_migrations(&pool).await?;
///
/// let status = get_migration_status(&pool).await?;
/// assert!(status.is_up_to_date());
/// # Ok(())
/// # }
/// ```

use crate::error::DbResult;
use sqlx::migrate::{MigrateDatabase, Migrator};
use sqlx::postgres::PgPool;
use sqlx::Postgres;
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Versions of the embedded forward migrations, ascending
pub fn embedded_versions() -> Vec<i64> {
    let mut versions: Vec<i64> = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
        .collect();
    versions.sort_unstable();
    versions.dedup();
    versions
}

/// Which embedded migrations a database has applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Successfully applied versions, ascending
    pub applied: Vec<i64>,

    /// Embedded versions not applied yet, ascending
    pub pending: Vec<i64>,

    /// A version whose last run failed part way
    pub failed: Option<i64>,
}

impl MigrationStatus {
    /// Builds the status from `(version, success)` rows of `_sqlx_migrations`
    fn from_records(embedded: &[i64], records: &[(i64, bool)]) -> Self {
        let applied: Vec<i64> = records
            .iter()
            .filter(|(_, success)| *success)
            .map(|(version, _)| *version)
            .collect();
        let failed = records
            .iter()
            .find(|(_, success)| !*success)
            .map(|(version, _)| *version);
        let pending = embedded
            .iter()
            .copied()
            .filter(|version| !applied.contains(version))
            .collect();

        Self {
            applied,
            pending,
            failed,
        }
    }

    pub fn latest_version(&self) -> Option<i64> {
        self.applied.last().copied()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty() && self.failed.is_none()
    }
}

/// Applies every pending migration in version order.
///
/// # Errors
///
/// Fails when a migration errors, or when an applied migration's checksum no
/// longer matches the embedded file.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    let status = get_migration_status(pool).await?;
    if status.is_up_to_date() {
        debug!(latest_version = ?status.latest_version(), "Schema is up to date");
    } else {
        info!(pending = ?status.pending, "Applying database migrations");
    }

    if let Err(e) = MIGRATOR.run(pool).await {
        warn!(error = %e, "Migration failed");
        return Err(e.into());
    }

    info!(latest_version = ?embedded_versions().last(), "Database migrations complete");
    Ok(())
}

/// Reads `_sqlx_migrations`; a database never migrated has everything pending
pub async fn get_migration_status(pool: &PgPool) -> DbResult<MigrationStatus> {
    let tracked: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;

    let records: Vec<(i64, bool)> = if tracked {
        sqlx::query_as("SELECT version, success FROM _sqlx_migrations ORDER BY version")
            .fetch_all(pool)
            .await?
    } else {
        Vec::new()
    };

    let status = MigrationStatus::from_records(&embedded_versions(), &records);
    debug!(
        applied = status.applied.len(),
        pending = status.pending.len(),
        failed = ?status.failed,
        "Migration status retrieved"
    );
    Ok(status)
}

/// Creates the database named in `database_url` when missing.
///
/// Returns `true` when it had to be created.
pub async fn ensure_database_exists(database_url: &str) -> DbResult<bool> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
        return Ok(false);
    }

    Postgres::create_database(database_url).await?;
    info!("Database created");
    Ok(true)
}

/// Drops the database named in `database_url`, for development and test
/// databases.
///
/// Returns `true` when a database was dropped.
pub async fn drop_database(database_url: &str) -> DbResult<bool> {
    if !Postgres::database_exists(database_url).await? {
        debug!("Database does not exist, nothing to drop");
        return Ok(false);
    }

    warn!("Dropping database");
    Postgres::drop_database(database_url).await?;
    info!("Database dropped");
    Ok(true)
}
