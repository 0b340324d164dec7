//! # Taskboard Database Client
//!
//! Typed data access for the taskboard schema: users and their provider
//! accounts, sessions and verification tokens, posts, projects with members
//! and invitations, and tasks.
//!
//! ## Module Organization
//!
//! - `client`: the entry point; owns the pool or a transaction
//! - `delegate`: the uniform per-model operation set
//! - `models`: row structs, inputs, unique keys, field and relation handles
//! - `query`: filters, ordering, pagination, aggregation and SQL building
//! - `db`: pool creation and migrations
//! - `auth`: password hashing and token generation
//! - `config`: configuration from the environment
//! - `error`: the crate error type
//!
//! ## Example
//!
//! ```no_run
//! use taskboard_db::client::Client;
//! use taskboard_db::config::DatabaseConfig;
//! use taskboard_db::models::task::{fields, CreateTask, TaskStatus};
//! use taskboard_db::models::user::CreateUser;
//! use taskboard_db::query::FindArgs;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect(DatabaseConfig::from_env()?).await?;
//!
//! let user = client.user().create(CreateUser::default()).await?;
//! client.task().create(CreateTask::new("Write docs", user.id)).await?;
//!
//! let open = client
//!     .task()
//!     .find_many(
//!         FindArgs::new()
//!             .filter(fields::STATUS.not(TaskStatus::Finished))
//!             .order_by(fields::CREATED_AT.desc()),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod delegate;
pub mod error;
pub mod models;
pub mod query;

pub use client::{Client, IsolationLevel, TransactionOptions};
pub use error::{DbError, DbResult};

/// Current version of the taskboard database client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
