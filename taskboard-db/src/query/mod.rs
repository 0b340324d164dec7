//! Query engine.
//!
//! Typed filters, ordering, pagination and aggregation over the models,
//! compiled to parameterized Postgres SQL.
//!
//! # Example
//!
//! ```no_run
//! use taskboard_db::models::task::{fields, relations, TaskStatus};
//! use taskboard_db::models::project;
//! use taskboard_db::query::{Filter, FindArgs};
//!
//! // Unfinished tasks in projects whose name starts with "Ops"
//! let args = FindArgs::new()
//!     .filter(Filter::and([
//!         fields::STATUS.not(TaskStatus::Finished),
//!         relations::PROJECT.is(project::fields::NAME.starts_with("Ops")),
//!     ]))
//!     .order_by(fields::CREATED_AT.desc())
//!     .take(25);
//! ```

mod aggregate;
mod args;
mod build;
mod field;
mod filter;
mod order;
mod raw;
mod value;

pub use aggregate::{AggFunc, AggregateArgs, AggregateResult, GroupByArgs, GroupRow, Having};
pub use args::FindArgs;
pub use build::BuiltQuery;
pub use field::{Field, Numeric, Ordered, Relation, TextLike};
pub use filter::{CompareOp, Expr, Filter, Join};
pub use order::{NullsOrder, OrderBy, OrderTerm, SortOrder};
pub use raw::RawQuery;
pub use value::{DbEnum, IntoValue, Value};

pub(crate) use build::Assignments;

pub(crate) mod sql {
    pub(crate) use super::build::{aggregate, count, delete, group_by, insert, select, update, upsert, Select};
}
