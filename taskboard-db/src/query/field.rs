//! Typed column and relation handles.
//!
//! Each model exposes a `fields` module of `Field<Model, RustType>` constants
//! and a `relations` module of `Relation<Model, Related>` constants. Their
//! methods build [`Filter`]s and [`OrderBy`]s that can only be applied to the
//! model they belong to.
//!
//! ```no_run
//! use taskboard_db::models::task::{fields, TaskStatus};
//! use taskboard_db::query::Filter;
//!
//! let open = Filter::and([
//!     fields::STATUS.not(TaskStatus::Finished),
//!     fields::TITLE.contains_insensitive("release"),
//!     fields::ASSIGNED_TO_ID.is_not_null(),
//! ]);
//! ```

use super::filter::{escape_like, CompareOp, Expr, Join};
use super::order::{OrderBy, SortOrder};
use super::{Filter, IntoValue};
use crate::models::Model;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A column of model `M` holding Rust type `T`.
pub struct Field<M, T> {
    name: &'static str,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Clone for Field<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Field<M, T> {}

impl<M, T> std::fmt::Debug for Field<M, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field({})", self.name)
    }
}

impl<M, T> Field<M, T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Column name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ascending order on this column
    pub fn asc(self) -> OrderBy<M> {
        OrderBy::new(self.name, SortOrder::Asc)
    }

    /// Descending order on this column
    pub fn desc(self) -> OrderBy<M> {
        OrderBy::new(self.name, SortOrder::Desc)
    }
}

impl<M, T: IntoValue> Field<M, T> {
    fn compare(self, op: CompareOp, value: T) -> Filter<M> {
        Filter::from_expr(Expr::Compare {
            column: self.name,
            op,
            value: value.into_value(),
        })
    }

    /// column = value (`IS NULL` for a NULL value)
    pub fn equals(self, value: T) -> Filter<M> {
        self.compare(CompareOp::Eq, value)
    }

    /// column <> value (`IS NOT NULL` for a NULL value)
    pub fn not(self, value: T) -> Filter<M> {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(self, value: T) -> Filter<M> {
        self.compare(CompareOp::Lt, value)
    }

    pub fn lte(self, value: T) -> Filter<M> {
        self.compare(CompareOp::Lte, value)
    }

    pub fn gt(self, value: T) -> Filter<M> {
        self.compare(CompareOp::Gt, value)
    }

    pub fn gte(self, value: T) -> Filter<M> {
        self.compare(CompareOp::Gte, value)
    }

    /// column IN (values...); an empty list matches nothing
    pub fn in_(self, values: impl IntoIterator<Item = T>) -> Filter<M> {
        self.membership(values, false)
    }

    /// column NOT IN (values...); an empty list matches everything
    pub fn not_in(self, values: impl IntoIterator<Item = T>) -> Filter<M> {
        self.membership(values, true)
    }

    fn membership(self, values: impl IntoIterator<Item = T>, negated: bool) -> Filter<M> {
        Filter::from_expr(Expr::In {
            column: self.name,
            values: values.into_iter().map(IntoValue::into_value).collect(),
            negated,
        })
    }
}

impl<M, T: TextLike> Field<M, T> {
    fn like(self, pattern: String, insensitive: bool) -> Filter<M> {
        Filter::from_expr(Expr::Like {
            column: self.name,
            pattern,
            insensitive,
        })
    }

    pub fn contains(self, needle: impl AsRef<str>) -> Filter<M> {
        self.like(format!("%{}%", escape_like(needle.as_ref())), false)
    }

    pub fn contains_insensitive(self, needle: impl AsRef<str>) -> Filter<M> {
        self.like(format!("%{}%", escape_like(needle.as_ref())), true)
    }

    pub fn starts_with(self, prefix: impl AsRef<str>) -> Filter<M> {
        self.like(format!("{}%", escape_like(prefix.as_ref())), false)
    }

    pub fn starts_with_insensitive(self, prefix: impl AsRef<str>) -> Filter<M> {
        self.like(format!("{}%", escape_like(prefix.as_ref())), true)
    }

    pub fn ends_with(self, suffix: impl AsRef<str>) -> Filter<M> {
        self.like(format!("%{}", escape_like(suffix.as_ref())), false)
    }

    pub fn ends_with_insensitive(self, suffix: impl AsRef<str>) -> Filter<M> {
        self.like(format!("%{}", escape_like(suffix.as_ref())), true)
    }
}

impl<M, T> Field<M, Option<T>> {
    pub fn is_null(self) -> Filter<M> {
        Filter::from_expr(Expr::IsNull {
            column: self.name,
            negated: false,
        })
    }

    pub fn is_not_null(self) -> Filter<M> {
        Filter::from_expr(Expr::IsNull {
            column: self.name,
            negated: true,
        })
    }
}

/// Text columns, which support pattern filters.
pub trait TextLike {}

impl TextLike for String {}
impl TextLike for Option<String> {}

/// Columns that `MIN`/`MAX` can be computed over.
///
/// `Inner` is the non-null Rust type an aggregate of the column decodes to.
pub trait Ordered {
    type Inner: DeserializeOwned;
}

/// Columns that `AVG`/`SUM` can be computed over.
///
/// `Sum` is what a `SUM` of the column decodes to; Postgres widens integer
/// sums, so an `INTEGER` column sums to `BIGINT`.
pub trait Numeric: Ordered {
    type Sum: DeserializeOwned;
}

impl Ordered for i32 {
    type Inner = i32;
}
impl Ordered for i64 {
    type Inner = i64;
}
impl Ordered for f64 {
    type Inner = f64;
}
impl Ordered for String {
    type Inner = String;
}
impl Ordered for DateTime<Utc> {
    type Inner = DateTime<Utc>;
}
impl<T: Ordered> Ordered for Option<T> {
    type Inner = T::Inner;
}

impl Numeric for i32 {
    type Sum = i64;
}
impl Numeric for i64 {
    // SUM(bigint) is numeric; values past i64 fail to decode
    type Sum = i64;
}
impl Numeric for f64 {
    type Sum = f64;
}
impl<T: Numeric> Numeric for Option<T> {
    type Sum = T::Sum;
}

/// A relation from model `M` to model `R`.
pub struct Relation<M, R> {
    local_column: &'static str,
    foreign_column: &'static str,
    _marker: PhantomData<fn() -> (M, R)>,
}

impl<M, R> Clone for Relation<M, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, R> Copy for Relation<M, R> {}

impl<M, R> Relation<M, R> {
    /// `local_column` of `M` matches `foreign_column` of `R`
    pub const fn new(local_column: &'static str, foreign_column: &'static str) -> Self {
        Self {
            local_column,
            foreign_column,
            _marker: PhantomData,
        }
    }
}

impl<M, R: Model> Relation<M, R> {
    fn exists(self, filter: Expr, negated: bool) -> Filter<M> {
        Filter::from_expr(Expr::Exists {
            join: Join {
                table: R::TABLE,
                local_column: self.local_column,
                foreign_column: self.foreign_column,
            },
            filter: Box::new(filter),
            negated,
        })
    }

    /// At least one related row matches
    pub fn some(self, filter: Filter<R>) -> Filter<M> {
        self.exists(filter.expr, false)
    }

    /// No related row matches
    pub fn none(self, filter: Filter<R>) -> Filter<M> {
        self.exists(filter.expr, true)
    }

    /// Every related row matches (vacuously true with no related rows).
    ///
    /// A related row where the filter is NULL does not match.
    pub fn every(self, filter: Filter<R>) -> Filter<M> {
        self.exists(Expr::NotTrue(Box::new(filter.expr)), true)
    }

    /// The related row exists and matches
    pub fn is(self, filter: Filter<R>) -> Filter<M> {
        self.exists(filter.expr, false)
    }

    /// There is no related row matching
    pub fn is_not(self, filter: Filter<R>) -> Filter<M> {
        self.exists(filter.expr, true)
    }
}
