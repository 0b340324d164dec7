//! Aggregation and grouping.
//!
//! Aggregates are computed in SQL and returned as one JSON object per result
//! row, shaped as `{"_count": {"_all": 3, "scope": 2}, "_avg": {...}, ...}`.
//! Grouped field values sit at the top level of each group's object.

use super::build::{GroupBy, Select};
use super::filter::{CompareOp, Expr};
use super::order::OrderTerm;
use super::{Field, Filter, FindArgs, IntoValue, Numeric, Ordered, OrderBy, Value};
use crate::error::{DbError, DbResult};
use crate::models::Model;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// SQL aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Avg,
    Sum,
    Min,
    Max,
}

impl AggFunc {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Avg => "AVG",
            AggFunc::Sum => "SUM",
            AggFunc::Min => "MIN",
            AggFunc::Max => "MAX",
        }
    }

    /// Key of this aggregate in result objects
    pub fn key(&self) -> &'static str {
        match self {
            AggFunc::Count => "_count",
            AggFunc::Avg => "_avg",
            AggFunc::Sum => "_sum",
            AggFunc::Min => "_min",
            AggFunc::Max => "_max",
        }
    }
}

/// Which aggregates to compute, by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AggregateSelection {
    pub count_all: bool,
    pub count: Vec<&'static str>,
    pub avg: Vec<&'static str>,
    pub sum: Vec<&'static str>,
    pub min: Vec<&'static str>,
    pub max: Vec<&'static str>,
}

impl AggregateSelection {
    /// Function, columns, and whether `_all` is included, in output order.
    pub(crate) fn groups(&self) -> [(AggFunc, &[&'static str], bool); 5] {
        [
            (AggFunc::Count, self.count.as_slice(), self.count_all),
            (AggFunc::Avg, self.avg.as_slice(), false),
            (AggFunc::Sum, self.sum.as_slice(), false),
            (AggFunc::Min, self.min.as_slice(), false),
            (AggFunc::Max, self.max.as_slice(), false),
        ]
    }
}

/// An untyped HAVING condition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HavingTerm {
    Aggregate {
        func: AggFunc,
        column: Option<&'static str>,
        op: CompareOp,
        value: Value,
    },
    Field(Expr),
}

/// Selected aggregates over model `M`, shared by aggregate and group-by.
macro_rules! aggregate_selectors {
    () => {
        /// Count all rows
        pub fn count_all(mut self) -> Self {
            self.selection.count_all = true;
            self
        }

        /// Count non-null values of a field
        pub fn count<T>(mut self, field: Field<M, T>) -> Self {
            self.selection.count.push(field.name());
            self
        }

        pub fn avg<T: Numeric>(mut self, field: Field<M, T>) -> Self {
            self.selection.avg.push(field.name());
            self
        }

        pub fn sum<T: Numeric>(mut self, field: Field<M, T>) -> Self {
            self.selection.sum.push(field.name());
            self
        }

        pub fn min<T: Ordered>(mut self, field: Field<M, T>) -> Self {
            self.selection.min.push(field.name());
            self
        }

        pub fn max<T: Ordered>(mut self, field: Field<M, T>) -> Self {
            self.selection.max.push(field.name());
            self
        }
    };
}

/// Arguments for `aggregate`: the rows to aggregate and what to compute.
///
/// ```no_run
/// use taskboard_db::models::account::fields;
/// use taskboard_db::query::AggregateArgs;
///
/// let args = AggregateArgs::new()
///     .filter(fields::PROVIDER.equals("github".to_string()))
///     .count_all()
///     .avg(fields::EXPIRES_AT)
///     .max(fields::EXPIRES_AT);
/// ```
pub struct AggregateArgs<M> {
    pub(crate) rows: FindArgs<M>,
    pub(crate) selection: AggregateSelection,
}

impl<M> Default for AggregateArgs<M> {
    fn default() -> Self {
        Self {
            rows: FindArgs::default(),
            selection: AggregateSelection::default(),
        }
    }
}

impl<M> AggregateArgs<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregates only the rows selected by `rows`
    pub fn rows(mut self, rows: FindArgs<M>) -> Self {
        self.rows = rows;
        self
    }

    pub fn filter(mut self, filter: Filter<M>) -> Self {
        self.rows = self.rows.filter(filter);
        self
    }

    aggregate_selectors!();
}

impl<M: Model> AggregateArgs<M> {
    pub(crate) fn to_select(&self) -> (Select<'_>, &AggregateSelection) {
        let (select, _) = self.rows.to_select();
        (select, &self.selection)
    }
}

/// A HAVING condition on groups of model `M`.
pub struct Having<M> {
    pub(crate) term: HavingTerm,
    _model: PhantomData<fn() -> M>,
}

impl<M> Having<M> {
    fn aggregate(func: AggFunc, column: Option<&'static str>, op: CompareOp, value: Value) -> Self {
        Self {
            term: HavingTerm::Aggregate {
                func,
                column,
                op,
                value,
            },
            _model: PhantomData,
        }
    }

    /// COUNT(*) <op> value
    pub fn count_all(op: CompareOp, value: i64) -> Self {
        Self::aggregate(AggFunc::Count, None, op, value.into_value())
    }

    /// COUNT(field) <op> value
    pub fn count<T>(field: Field<M, T>, op: CompareOp, value: i64) -> Self {
        Self::aggregate(AggFunc::Count, Some(field.name()), op, value.into_value())
    }

    /// AVG(field) <op> value
    pub fn avg<T: Numeric>(field: Field<M, T>, op: CompareOp, value: f64) -> Self {
        Self::aggregate(AggFunc::Avg, Some(field.name()), op, value.into_value())
    }

    /// SUM(field) <op> value
    pub fn sum<T: Numeric>(field: Field<M, T>, op: CompareOp, value: i64) -> Self {
        Self::aggregate(AggFunc::Sum, Some(field.name()), op, value.into_value())
    }

    /// MIN(field) <op> value
    pub fn min<T: Ordered + IntoValue>(field: Field<M, T>, op: CompareOp, value: T) -> Self {
        Self::aggregate(AggFunc::Min, Some(field.name()), op, value.into_value())
    }

    /// MAX(field) <op> value
    pub fn max<T: Ordered + IntoValue>(field: Field<M, T>, op: CompareOp, value: T) -> Self {
        Self::aggregate(AggFunc::Max, Some(field.name()), op, value.into_value())
    }

    /// A condition on grouped fields; every field it names must be grouped
    pub fn field(filter: Filter<M>) -> Self {
        Self {
            term: HavingTerm::Field(filter.expr),
            _model: PhantomData,
        }
    }
}

/// Arguments for `group_by`.
///
/// ```no_run
/// use taskboard_db::models::task::fields;
/// use taskboard_db::query::{CompareOp, GroupByArgs, Having};
///
/// let args = GroupByArgs::by(fields::STATUS)
///     .count_all()
///     .having(Having::count_all(CompareOp::Gte, 2))
///     .order_by(fields::STATUS.asc());
/// ```
pub struct GroupByArgs<M> {
    pub(crate) by: Vec<&'static str>,
    pub(crate) filter: Option<Filter<M>>,
    pub(crate) having: Vec<Having<M>>,
    pub(crate) order_by: Vec<OrderBy<M>>,
    pub(crate) take: Option<i64>,
    pub(crate) skip: Option<i64>,
    pub(crate) selection: AggregateSelection,
}

impl<M> GroupByArgs<M> {
    /// Groups by one field; add more with [`GroupByArgs::then_by`]
    pub fn by<T>(field: Field<M, T>) -> Self {
        Self {
            by: vec![field.name()],
            filter: None,
            having: Vec::new(),
            order_by: Vec::new(),
            take: None,
            skip: None,
            selection: AggregateSelection::default(),
        }
    }

    pub fn then_by<T>(mut self, field: Field<M, T>) -> Self {
        self.by.push(field.name());
        self
    }

    pub fn filter(mut self, filter: Filter<M>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.with(filter),
            None => filter,
        });
        self
    }

    pub fn having(mut self, having: Having<M>) -> Self {
        self.having.push(having);
        self
    }

    pub fn order_by(mut self, order: OrderBy<M>) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    aggregate_selectors!();

    /// Checks the arguments are consistent before any SQL is built.
    pub(crate) fn validate(&self) -> DbResult<()> {
        if self.by.is_empty() {
            return Err(DbError::InvalidQuery(
                "group_by requires at least one field".to_string(),
            ));
        }
        if self.take.is_some_and(|take| take < 0) || self.skip.is_some_and(|skip| skip < 0) {
            return Err(DbError::InvalidQuery(
                "take and skip in group_by must not be negative".to_string(),
            ));
        }
        if (self.take.is_some() || self.skip.is_some()) && self.order_by.is_empty() {
            return Err(DbError::InvalidQuery(
                "take and skip in group_by require order_by".to_string(),
            ));
        }
        for order in &self.order_by {
            if !self.by.contains(&order.column()) {
                return Err(DbError::InvalidQuery(format!(
                    "order_by field `{}` must be listed in by",
                    order.column()
                )));
            }
        }
        for having in &self.having {
            if let HavingTerm::Field(expr) = &having.term {
                if let Some(column) = expr.columns().into_iter().find(|c| !self.by.contains(c)) {
                    return Err(DbError::InvalidQuery(format!(
                        "having field `{}` must be listed in by",
                        column
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<M: Model> GroupByArgs<M> {
    /// Lowers to a GROUP BY query; the borrowed buffers are owned by the caller.
    pub(crate) fn to_query<'a>(
        &'a self,
        having: &'a [HavingTerm],
        order: &'a [OrderTerm],
    ) -> GroupBy<'a> {
        GroupBy {
            table: M::TABLE,
            by: &self.by,
            filter: self.filter.as_ref().map(|f| &f.expr),
            having,
            order,
            limit: self.take,
            offset: self.skip,
            selection: &self.selection,
        }
    }

    pub(crate) fn having_terms(&self) -> Vec<HavingTerm> {
        self.having.iter().map(|h| h.term.clone()).collect()
    }

    pub(crate) fn order_terms(&self) -> Vec<OrderTerm> {
        self.order_by.iter().map(|o| o.term).collect()
    }
}

/// Computed aggregates for model `M`.
#[derive(Debug, Clone)]
pub struct AggregateResult<M> {
    json: serde_json::Value,
    _model: PhantomData<fn() -> M>,
}

impl<M> AggregateResult<M> {
    pub(crate) fn from_json(json: serde_json::Value) -> Self {
        Self {
            json,
            _model: PhantomData,
        }
    }

    fn entry(&self, func: AggFunc, key: &str) -> Option<&serde_json::Value> {
        self.json
            .get(func.key())
            .and_then(|group| group.get(key))
            .filter(|v| !v.is_null())
    }

    fn decode<U: DeserializeOwned>(&self, func: AggFunc, key: &str) -> DbResult<Option<U>> {
        self.entry(func, key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(|e| DbError::InvalidQuery(format!("cannot decode {}.{}: {}", func.key(), key, e)))
    }

    /// Number of rows, or 0 if `_count._all` was not selected
    pub fn count_all(&self) -> i64 {
        self.entry(AggFunc::Count, "_all")
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Number of non-null values of a field, or 0 if not selected
    pub fn count<T>(&self, field: Field<M, T>) -> i64 {
        self.entry(AggFunc::Count, field.name())
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    }

    /// Average of a field; None when not selected or no non-null values
    pub fn avg<T: Numeric>(&self, field: Field<M, T>) -> Option<f64> {
        self.entry(AggFunc::Avg, field.name()).and_then(|v| v.as_f64())
    }

    /// Sum of a field, widened to the type Postgres sums the column to
    pub fn sum<T: Numeric>(&self, field: Field<M, T>) -> DbResult<Option<T::Sum>> {
        self.decode(AggFunc::Sum, field.name())
    }

    pub fn min<T: Ordered>(&self, field: Field<M, T>) -> DbResult<Option<T::Inner>> {
        self.decode(AggFunc::Min, field.name())
    }

    pub fn max<T: Ordered>(&self, field: Field<M, T>) -> DbResult<Option<T::Inner>> {
        self.decode(AggFunc::Max, field.name())
    }

    /// The raw result object
    pub fn as_json(&self) -> &serde_json::Value {
        &self.json
    }
}

/// One group returned by `group_by`.
#[derive(Debug, Clone)]
pub struct GroupRow<M> {
    aggregates: AggregateResult<M>,
}

impl<M> GroupRow<M> {
    pub(crate) fn from_json(json: serde_json::Value) -> Self {
        Self {
            aggregates: AggregateResult::from_json(json),
        }
    }

    /// Value of a grouped field
    pub fn get<T: DeserializeOwned>(&self, field: Field<M, T>) -> DbResult<T> {
        let value = self
            .aggregates
            .json
            .get(field.name())
            .cloned()
            .ok_or_else(|| DbError::InvalidQuery(format!("`{}` is not grouped", field.name())))?;
        serde_json::from_value(value)
            .map_err(|e| DbError::InvalidQuery(format!("cannot decode {}: {}", field.name(), e)))
    }

    /// Aggregates computed for this group
    pub fn aggregates(&self) -> &AggregateResult<M> {
        &self.aggregates
    }
}
