/// Top-level database client
///
/// A `Client` wraps either the connection pool or an open transaction and
/// hands out one [`Delegate`] per model. Clones share the same pool or
/// transaction.
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::config::DatabaseConfig;
/// use taskboard_db::models::project::CreateProject;
/// use taskboard_db::models::project_member::{CreateProjectMember, ProjectRole};
/// use taskboard_db::models::user::CreateUser;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::connect(DatabaseConfig::from_env()?).await?;
///     client.migrate().await?;
///
///     // Project and owner membership are created together or not at all
///     let project = client
///         .transaction(|tx| async move {
///             let owner = tx.user().create(CreateUser::default()).await?;
///             let project = tx.project().create(CreateProject::new("Launch", owner.id)).await?;
///             tx.project_member()
///                 .create(CreateProjectMember::new(project.id, owner.id, ProjectRole::Owner))
///                 .await?;
///             Ok(project)
///         })
///         .await?;
///
///     client.disconnect().await;
///     Ok(())
/// }
/// ```

use crate::config::DatabaseConfig;
use crate::db::migrations::run_migrations;
use crate::db::pool::{close_pool, create_pool, health_check, pool_stats, PoolStats};
use crate::delegate::Delegate;
use crate::error::{DbError, DbResult};
use crate::models::account::Account;
use crate::models::post::Post;
use crate::models::project::Project;
use crate::models::project_invitation::ProjectInvitation;
use crate::models::project_member::ProjectMember;
use crate::models::session::Session;
use crate::models::task::Task;
use crate::models::user::User;
use crate::models::verification_token::VerificationToken;
use crate::query::{BuiltQuery, RawQuery};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default time allowed to acquire a connection and begin
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(2);

/// Default time allowed for the transaction body
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// The executor a client dispatches to.
///
/// The transaction slot is emptied on commit or rollback, after which every
/// use fails with `TransactionClosed`.
#[derive(Clone)]
pub(crate) enum Handle {
    Pool(PgPool),
    Tx(SharedTransaction),
}

/// Runs `$body` with `$exec` bound to an executor for `$handle`.
macro_rules! with_executor {
    ($handle:expr, |$exec:ident| $body:expr) => {
        match $handle {
            Handle::Pool(pool) => {
                let $exec = pool;
                $body
            }
            Handle::Tx(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or(DbError::TransactionClosed)?;
                let $exec = &mut **tx;
                $body
            }
        }
    };
}

impl Handle {
    fn trace(model: &'static str, operation: &'static str, query: &BuiltQuery) {
        debug!(
            model,
            operation,
            sql = %query.sql,
            params = query.params.len(),
            "Executing query"
        );
    }

    pub(crate) async fn fetch_all<T>(
        &self,
        model: &'static str,
        operation: &'static str,
        query: BuiltQuery,
    ) -> DbResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Self::trace(model, operation, &query);
        let (sql, args) = query.into_parts();
        let rows = with_executor!(self, |exec| {
            sqlx::query_as_with::<_, T, _>(&sql, args).fetch_all(exec).await
        });
        rows.map_err(|e| DbError::from_sqlx(model, e))
    }

    pub(crate) async fn fetch_optional<T>(
        &self,
        model: &'static str,
        operation: &'static str,
        query: BuiltQuery,
    ) -> DbResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Self::trace(model, operation, &query);
        let (sql, args) = query.into_parts();
        let row = with_executor!(self, |exec| {
            sqlx::query_as_with::<_, T, _>(&sql, args).fetch_optional(exec).await
        });
        row.map_err(|e| DbError::from_sqlx(model, e))
    }

    pub(crate) async fn fetch_one<T>(
        &self,
        model: &'static str,
        operation: &'static str,
        query: BuiltQuery,
    ) -> DbResult<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.fetch_optional(model, operation, query)
            .await?
            .ok_or_else(|| DbError::not_found(model, operation))
    }

    /// Rows of a single-column query, one value each
    pub(crate) async fn fetch_scalars<T>(
        &self,
        model: &'static str,
        operation: &'static str,
        query: BuiltQuery,
    ) -> DbResult<Vec<T>>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Send + Unpin,
    {
        Self::trace(model, operation, &query);
        let (sql, args) = query.into_parts();
        let values = with_executor!(self, |exec| {
            sqlx::query_scalar_with::<_, T, _>(&sql, args).fetch_all(exec).await
        });
        values.map_err(|e| DbError::from_sqlx(model, e))
    }

    pub(crate) async fn fetch_scalar<T>(
        &self,
        model: &'static str,
        operation: &'static str,
        query: BuiltQuery,
    ) -> DbResult<T>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Send + Unpin,
    {
        self.fetch_scalars(model, operation, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(model, operation))
    }

    /// Number of rows affected
    pub(crate) async fn execute(
        &self,
        model: &'static str,
        operation: &'static str,
        query: BuiltQuery,
    ) -> DbResult<u64> {
        Self::trace(model, operation, &query);
        let (sql, args) = query.into_parts();
        let result = with_executor!(self, |exec| {
            sqlx::query_with(&sql, args).execute(exec).await
        });
        result
            .map(|r| r.rows_affected())
            .map_err(|e| DbError::from_sqlx(model, e))
    }
}

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Options for [`Client::transaction_with`]
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    /// Time allowed to acquire a connection and begin
    pub max_wait: Duration,

    /// Time allowed for the transaction body
    pub timeout: Duration,

    /// Server default when unset
    pub isolation_level: Option<IsolationLevel>,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_wait: DEFAULT_MAX_WAIT,
            timeout: DEFAULT_TIMEOUT,
            isolation_level: None,
        }
    }
}

impl TransactionOptions {
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }
}

/// Database client
#[derive(Clone)]
pub struct Client {
    handle: Handle,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.handle {
            Handle::Pool(_) => "pool",
            Handle::Tx(_) => "transaction",
        };
        f.debug_struct("Client").field("handle", &kind).finish()
    }
}

impl Client {
    /// Creates the pool and checks the connection
    pub async fn connect(config: DatabaseConfig) -> DbResult<Self> {
        let pool = create_pool(&config).await?;
        info!("Database client connected");
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            handle: Handle::Pool(pool),
        }
    }

    /// The underlying pool; `None` for a transaction-scoped client
    pub fn pool(&self) -> Option<&PgPool> {
        match &self.handle {
            Handle::Pool(pool) => Some(pool),
            Handle::Tx(_) => None,
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self.handle, Handle::Tx(_))
    }

    /// Closes the pool. Transaction-scoped clients are closed by their
    /// transaction and ignore this.
    pub async fn disconnect(&self) {
        match &self.handle {
            Handle::Pool(pool) => close_pool(pool).await,
            Handle::Tx(_) => debug!("disconnect called on a transaction client; ignored"),
        }
    }

    pub async fn health_check(&self) -> DbResult<()> {
        match &self.handle {
            Handle::Pool(pool) => health_check(pool).await.map(|_| ()),
            Handle::Tx(_) => {
                self.handle
                    .execute("Client", "health_check", RawQuery::new("SELECT 1").into_query())
                    .await?;
                Ok(())
            }
        }
    }

    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.pool().map(pool_stats)
    }

    /// Applies pending migrations
    pub async fn migrate(&self) -> DbResult<()> {
        match &self.handle {
            Handle::Pool(pool) => run_migrations(pool).await,
            Handle::Tx(_) => Err(DbError::InvalidQuery(
                "migrations cannot run inside a transaction".to_string(),
            )),
        }
    }

    fn delegate<M>(&self) -> Delegate<M> {
        Delegate::new(self.handle.clone())
    }

    pub fn user(&self) -> Delegate<User> {
        self.delegate()
    }

    pub fn account(&self) -> Delegate<Account> {
        self.delegate()
    }

    pub fn session(&self) -> Delegate<Session> {
        self.delegate()
    }

    pub fn verification_token(&self) -> Delegate<VerificationToken> {
        self.delegate()
    }

    pub fn post(&self) -> Delegate<Post> {
        self.delegate()
    }

    pub fn project(&self) -> Delegate<Project> {
        self.delegate()
    }

    pub fn project_member(&self) -> Delegate<ProjectMember> {
        self.delegate()
    }

    pub fn project_invitation(&self) -> Delegate<ProjectInvitation> {
        self.delegate()
    }

    pub fn task(&self) -> Delegate<Task> {
        self.delegate()
    }

    /// Runs `f` in a transaction with default options.
    ///
    /// See [`Client::transaction_with`].
    pub async fn transaction<F, Fut, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        self.transaction_with(TransactionOptions::default(), f).await
    }

    /// Runs `f` with a transaction-scoped client.
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err` or
    /// exceeds `options.timeout`. Clones of the scoped client that outlive
    /// the call fail with `TransactionClosed`.
    pub async fn transaction_with<F, Fut, T>(&self, options: TransactionOptions, f: F) -> DbResult<T>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        let pool = match &self.handle {
            Handle::Pool(pool) => pool,
            Handle::Tx(_) => return Err(DbError::NestedTransaction),
        };

        let mut tx = tokio::time::timeout(options.max_wait, pool.begin())
            .await
            .map_err(|_| DbError::TransactionTimeout("starting"))??;

        if let Some(level) = options.isolation_level {
            let sql = format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql());
            sqlx::query(&sql).execute(&mut *tx).await?;
        }
        debug!(isolation_level = ?options.isolation_level, "Transaction started");

        let shared: SharedTransaction = Arc::new(Mutex::new(Some(tx)));
        let scoped = Client {
            handle: Handle::Tx(Arc::clone(&shared)),
        };

        let outcome = tokio::time::timeout(options.timeout, f(scoped)).await;

        let Some(tx) = shared.lock().await.take() else {
            return Err(DbError::TransactionClosed);
        };

        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await?;
                info!("Transaction committed");
                Ok(value)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "Transaction failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
            Err(_) => {
                warn!(timeout_ms = options.timeout.as_millis() as u64, "Transaction timed out, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(DbError::TransactionTimeout("running"))
            }
        }
    }

    /// Runs a query and returns each row as a JSON object keyed by column
    pub async fn query_raw(&self, query: RawQuery) -> DbResult<Vec<JsonValue>> {
        self.handle
            .fetch_scalars("Raw", "query_raw", query.into_json_query())
            .await
    }

    /// Runs a query and decodes each row into `T`
    pub async fn query_raw_as<T>(&self, query: RawQuery) -> DbResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.handle
            .fetch_all("Raw", "query_raw_as", query.into_query())
            .await
    }

    /// Runs a statement and returns the number of affected rows
    pub async fn execute_raw(&self, query: RawQuery) -> DbResult<u64> {
        self.handle
            .execute("Raw", "execute_raw", query.into_query())
            .await
    }
}
