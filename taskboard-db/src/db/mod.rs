/// Database layer
///
/// Connection pooling and schema migrations. The query engine lives in
/// `query`, models in `models`, and the client tying them together in
/// `client`.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: migration runner and database lifecycle helpers

pub mod migrations;
pub mod pool;
