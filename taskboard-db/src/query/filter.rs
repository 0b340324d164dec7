//! Filter expressions for WHERE and HAVING clauses.

use super::Value;
use std::marker::PhantomData;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => " = ",
            CompareOp::Ne => " <> ",
            CompareOp::Lt => " < ",
            CompareOp::Lte => " <= ",
            CompareOp::Gt => " > ",
            CompareOp::Gte => " >= ",
        }
    }
}

/// How a related table is joined to the filtered one.
///
/// Rendered as `related.foreign_column = outer.local_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    pub table: &'static str,
    pub local_column: &'static str,
    pub foreign_column: &'static str,
}

/// An untyped filter expression.
///
/// Column names are relative to the table currently in scope; the SQL
/// builder qualifies them with that table's alias.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// column <op> value
    Compare {
        column: &'static str,
        op: CompareOp,
        value: Value,
    },
    /// column [NOT] IN (values...)
    In {
        column: &'static str,
        values: Vec<Value>,
        negated: bool,
    },
    /// column [I]LIKE pattern
    Like {
        column: &'static str,
        pattern: String,
        insensitive: bool,
    },
    /// column IS [NOT] NULL
    IsNull { column: &'static str, negated: bool },
    /// [NOT] EXISTS (SELECT 1 FROM related WHERE join AND filter)
    Exists {
        join: Join,
        filter: Box<Expr>,
        negated: bool,
    },
    /// TRUE or FALSE
    Literal(bool),
    /// expr AND expr AND ...
    And(Vec<Expr>),
    /// expr OR expr OR ...
    Or(Vec<Expr>),
    /// NOT expr
    Not(Box<Expr>),
    /// (expr) IS NOT TRUE; holds when expr is FALSE or NULL
    NotTrue(Box<Expr>),
}

impl Expr {
    /// Equality, rendered as `IS NULL` when the value is NULL.
    pub fn eq(column: &'static str, value: Value) -> Self {
        Expr::Compare {
            column,
            op: CompareOp::Eq,
            value,
        }
    }

    /// Columns of the table in scope referenced by this expression.
    ///
    /// Columns inside relation subqueries belong to the related table and
    /// are not included; the join column of the outer table is.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<&'static str>) {
        match self {
            Expr::Compare { column, .. }
            | Expr::In { column, .. }
            | Expr::Like { column, .. }
            | Expr::IsNull { column, .. } => out.push(column),
            Expr::Exists { join, .. } => out.push(join.local_column),
            Expr::Literal(_) => {}
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.collect_columns(out);
                }
            }
            Expr::Not(e) | Expr::NotTrue(e) => e.collect_columns(out),
        }
    }
}

/// Escapes LIKE metacharacters so the needle matches literally.
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A filter over rows of model `M`.
///
/// Built from typed field handles (see [`super::Field`]) and combined with
/// [`Filter::and`], [`Filter::or`] and [`Filter::not`].
pub struct Filter<M> {
    pub(crate) expr: Expr,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Filter<M> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<M> std::fmt::Debug for Filter<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.expr.fmt(f)
    }
}

impl<M> Filter<M> {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _model: PhantomData,
        }
    }

    /// Matches every row
    pub fn all() -> Self {
        Self::from_expr(Expr::Literal(true))
    }

    /// All filters must match; an empty list matches every row
    pub fn and(filters: impl IntoIterator<Item = Filter<M>>) -> Self {
        Self::from_expr(Expr::And(filters.into_iter().map(|f| f.expr).collect()))
    }

    /// Any filter must match; an empty list matches no row
    pub fn or(filters: impl IntoIterator<Item = Filter<M>>) -> Self {
        Self::from_expr(Expr::Or(filters.into_iter().map(|f| f.expr).collect()))
    }

    /// Negates a filter
    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter<M>) -> Self {
        Self::from_expr(Expr::Not(Box::new(filter.expr)))
    }

    /// Shorthand for `Filter::and([self, other])`
    pub fn with(self, other: Filter<M>) -> Self {
        Self::and([self, other])
    }

    /// The untyped expression
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_columns_skip_related_table() {
        let expr = Expr::And(vec![
            Expr::eq("status", Value::Text(Some("x".into()))),
            Expr::Exists {
                join: Join {
                    table: "tasks",
                    local_column: "id",
                    foreign_column: "project_id",
                },
                filter: Box::new(Expr::eq("title", Value::Text(None))),
                negated: false,
            },
        ]);
        assert_eq!(expr.columns(), vec!["status", "id"]);
    }
}
