//! Arguments for find and count queries.

use super::build::Select;
use super::order::OrderTerm;
use super::{Field, Filter, OrderBy};
use crate::models::Model;

/// Filter, ordering and pagination for `find_*` and `count`.
///
/// ```no_run
/// use taskboard_db::models::task::fields;
/// use taskboard_db::query::FindArgs;
/// use uuid::Uuid;
///
/// # fn example(project_id: Uuid) {
/// let args = FindArgs::new()
///     .filter(fields::PROJECT_ID.equals(Some(project_id)))
///     .order_by(fields::CREATED_AT.desc())
///     .take(20)
///     .skip(40);
/// # }
/// ```
pub struct FindArgs<M> {
    pub(crate) filter: Option<Filter<M>>,
    pub(crate) order_by: Vec<OrderBy<M>>,
    pub(crate) take: Option<i64>,
    pub(crate) skip: Option<i64>,
    pub(crate) distinct: Vec<&'static str>,
}

impl<M> Default for FindArgs<M> {
    fn default() -> Self {
        Self {
            filter: None,
            order_by: Vec::new(),
            take: None,
            skip: None,
            distinct: Vec::new(),
        }
    }
}

impl<M> Clone for FindArgs<M> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            order_by: self.order_by.clone(),
            take: self.take,
            skip: self.skip,
            distinct: self.distinct.clone(),
        }
    }
}

impl<M> From<Filter<M>> for FindArgs<M> {
    fn from(filter: Filter<M>) -> Self {
        Self::new().filter(filter)
    }
}

impl<M> FindArgs<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts rows; repeated calls are combined with AND
    pub fn filter(mut self, filter: Filter<M>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.with(filter),
            None => filter,
        });
        self
    }

    /// Appends an ORDER BY term
    pub fn order_by(mut self, order: OrderBy<M>) -> Self {
        self.order_by.push(order);
        self
    }

    /// Limits the number of rows. A negative value takes rows from the end
    /// of the requested order.
    pub fn take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    /// Skips rows before taking
    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Keeps the first row for each distinct value of the field
    pub fn distinct<T>(mut self, field: Field<M, T>) -> Self {
        self.distinct.push(field.name());
        self
    }
}

impl<M: Model> FindArgs<M> {
    /// Lowers the arguments to a SELECT over `M`'s table.
    ///
    /// The flag is true when rows come back in reverse order and must be
    /// flipped by the caller. `take(i64::MIN)` saturates to `i64::MAX` rows.
    pub(crate) fn to_select(&self) -> (Select<'_>, bool) {
        let reversed = matches!(self.take, Some(take) if take < 0);

        let mut order: Vec<OrderTerm> = self.order_by.iter().map(|o| o.term).collect();
        if reversed && order.is_empty() {
            order = M::PRIMARY_KEY
                .iter()
                .map(|&column| OrderTerm {
                    column,
                    order: super::SortOrder::Asc,
                    nulls: None,
                })
                .collect();
        }

        let select = Select {
            table: M::TABLE,
            filter: self.filter.as_ref().map(|f| &f.expr),
            order,
            limit: self.take.map(|take| take.saturating_abs()),
            offset: self.skip,
            distinct: &self.distinct,
            reverse: reversed,
        };
        (select, reversed)
    }
}
