//! Ordering for SELECT and GROUP BY queries.

use std::marker::PhantomData;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => " ASC",
            SortOrder::Desc => " DESC",
        }
    }
}

/// Placement of NULLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    pub(crate) fn reversed(self) -> Self {
        match self {
            NullsOrder::First => NullsOrder::Last,
            NullsOrder::Last => NullsOrder::First,
        }
    }

    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            NullsOrder::First => " NULLS FIRST",
            NullsOrder::Last => " NULLS LAST",
        }
    }
}

/// An untyped ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: &'static str,
    pub order: SortOrder,
    pub nulls: Option<NullsOrder>,
}

impl OrderTerm {
    pub(crate) fn reversed(self) -> Self {
        Self {
            column: self.column,
            order: self.order.reversed(),
            nulls: self.nulls.map(NullsOrder::reversed),
        }
    }
}

/// An ORDER BY term on a column of model `M`.
pub struct OrderBy<M> {
    pub(crate) term: OrderTerm,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for OrderBy<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for OrderBy<M> {}

impl<M> std::fmt::Debug for OrderBy<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.term.fmt(f)
    }
}

impl<M> OrderBy<M> {
    pub(crate) fn new(column: &'static str, order: SortOrder) -> Self {
        Self {
            term: OrderTerm {
                column,
                order,
                nulls: None,
            },
            _model: PhantomData,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.term.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.term.nulls = Some(NullsOrder::Last);
        self
    }

    pub fn column(&self) -> &'static str {
        self.term.column
    }
}
