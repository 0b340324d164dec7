//! SQL query building.
//!
//! Lowers filters, ordering and write inputs to parameterized Postgres SQL.
//! Identifiers are always double-quoted and every value travels as a
//! positional parameter, except column-name keys of `jsonb_build_object`,
//! which are static identifiers inlined as string literals.

use super::aggregate::{AggFunc, AggregateSelection, HavingTerm};
use super::filter::{CompareOp, Expr};
use super::order::OrderTerm;
use super::value::into_arguments;
use super::Value;
use sqlx::postgres::PgArguments;

/// Result of building a query: SQL string and parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// The SQL string with $1, $2, etc. placeholders
    pub sql: String,
    /// The parameter values in order
    pub params: Vec<Value>,
}

impl BuiltQuery {
    pub(crate) fn into_parts(self) -> (String, PgArguments) {
        (self.sql, into_arguments(self.params))
    }
}

/// A SELECT over one table.
#[derive(Debug)]
pub(crate) struct Select<'a> {
    pub table: &'static str,
    pub filter: Option<&'a Expr>,
    pub order: Vec<OrderTerm>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub distinct: &'a [&'static str],
    /// Read `order` backwards before applying limit and offset
    pub reverse: bool,
}

impl<'a> Select<'a> {
    pub fn filtered(table: &'static str, filter: &'a Expr) -> Self {
        Self {
            table,
            filter: Some(filter),
            order: Vec::new(),
            limit: None,
            offset: None,
            distinct: &[],
            reverse: false,
        }
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A GROUP BY query over one table.
#[derive(Debug)]
pub(crate) struct GroupBy<'a> {
    pub table: &'static str,
    pub by: &'a [&'static str],
    pub filter: Option<&'a Expr>,
    pub having: &'a [HavingTerm],
    pub order: &'a [OrderTerm],
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub selection: &'a AggregateSelection,
}

/// Values for one UPDATE.
#[derive(Debug)]
pub(crate) struct Assignments<'a> {
    pub values: Vec<(&'static str, Value)>,
    /// Column set to NOW() unless assigned explicitly
    pub touch: Option<&'static str>,
    /// Column assigned to itself when there is nothing else to set
    pub fallback: &'a str,
}

/// Builds SQL from expressions, tracking parameter indices.
struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
    scopes: Vec<String>,
}

impl SqlBuilder {
    fn new(table: &str) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            scopes: vec![table.to_string()],
        }
    }

    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn push_param(&mut self, value: Value) {
        let cast = value.cast();
        self.params.push(value);
        self.sql.push('$');
        self.sql.push_str(&self.params.len().to_string());
        if let Some(cast) = cast {
            self.sql.push_str("::");
            self.sql.push_str(cast);
        }
    }

    /// Pushes a value, or DEFAULT for the column-default marker.
    fn push_value(&mut self, value: Value) {
        if value.is_default() {
            self.push("DEFAULT");
        } else {
            self.push_param(value);
        }
    }

    fn push_ident(&mut self, name: &str) {
        self.sql.push('"');
        for c in name.chars() {
            if c == '"' {
                self.sql.push('"');
            }
            self.sql.push(c);
        }
        self.sql.push('"');
    }

    fn push_literal(&mut self, text: &str) {
        self.sql.push('\'');
        for c in text.chars() {
            if c == '\'' {
                self.sql.push('\'');
            }
            self.sql.push(c);
        }
        self.sql.push('\'');
    }

    fn scope(&self) -> String {
        self.scopes.last().cloned().unwrap_or_default()
    }

    /// Pushes a column qualified with the alias in scope.
    fn push_column(&mut self, column: &str) {
        let scope = self.scope();
        self.push_ident(&scope);
        self.push(".");
        self.push_ident(column);
    }

    fn push_separated<T>(&mut self, items: impl IntoIterator<Item = T>, mut each: impl FnMut(&mut Self, T)) {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            each(self, item);
        }
    }

    fn build_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Compare { column, op, value } => {
                self.push_column(column);
                match (op, value.is_null()) {
                    (CompareOp::Eq, true) => self.push(" IS NULL"),
                    (CompareOp::Ne, true) => self.push(" IS NOT NULL"),
                    _ => {
                        self.push(op.as_sql());
                        self.push_param(value.clone());
                    }
                }
            }
            Expr::In {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    self.push(if *negated { "TRUE" } else { "FALSE" });
                    return;
                }
                self.push_column(column);
                self.push(if *negated { " NOT IN (" } else { " IN (" });
                self.push_separated(values, |b, v| b.push_param(v.clone()));
                self.push(")");
            }
            Expr::Like {
                column,
                pattern,
                insensitive,
            } => {
                self.push_column(column);
                self.push(if *insensitive { " ILIKE " } else { " LIKE " });
                self.push_param(Value::Text(Some(pattern.clone())));
            }
            Expr::IsNull { column, negated } => {
                self.push_column(column);
                self.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::Exists {
                join,
                filter,
                negated,
            } => {
                let alias = format!("r{}", self.scopes.len());
                self.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
                self.push("SELECT 1 FROM ");
                self.push_ident(join.table);
                self.push(" AS ");
                self.push_ident(&alias);
                self.push(" WHERE ");
                self.push_ident(&alias);
                self.push(".");
                self.push_ident(join.foreign_column);
                self.push(" = ");
                self.push_column(join.local_column);
                self.push(" AND ");
                self.scopes.push(alias);
                self.build_expr(filter);
                self.scopes.pop();
                self.push(")");
            }
            Expr::Literal(value) => self.push(if *value { "TRUE" } else { "FALSE" }),
            Expr::And(exprs) => self.build_junction(exprs, " AND ", "TRUE"),
            Expr::Or(exprs) => self.build_junction(exprs, " OR ", "FALSE"),
            Expr::Not(e) => {
                self.push("NOT (");
                self.build_expr(e);
                self.push(")");
            }
            Expr::NotTrue(e) => {
                self.push("(");
                self.build_expr(e);
                self.push(") IS NOT TRUE");
            }
        }
    }

    fn build_junction(&mut self, exprs: &[Expr], joiner: &str, empty: &str) {
        if exprs.is_empty() {
            self.push(empty);
            return;
        }
        self.push("(");
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                self.push(joiner);
            }
            self.build_expr(e);
        }
        self.push(")");
    }

    fn build_where(&mut self, filter: Option<&Expr>) {
        if let Some(expr) = filter {
            self.push(" WHERE ");
            self.build_expr(expr);
        }
    }

    fn build_order(&mut self, order: &[OrderTerm]) {
        if order.is_empty() {
            return;
        }
        self.push(" ORDER BY ");
        self.push_separated(order, |b, term| {
            b.push_column(term.column);
            b.push(term.order.as_sql());
            if let Some(nulls) = term.nulls {
                b.push(nulls.as_sql());
            }
        });
    }

    fn build_pagination(&mut self, limit: Option<i64>, offset: Option<i64>) {
        if let Some(limit) = limit {
            self.push(" LIMIT ");
            self.push_param(Value::BigInt(Some(limit)));
        }
        if let Some(offset) = offset {
            self.push(" OFFSET ");
            self.push_param(Value::BigInt(Some(offset)));
        }
    }

    fn build_select(&mut self, select: &Select<'_>) {
        if select.distinct.is_empty() {
            let order = if select.reverse {
                reversed(&select.order)
            } else {
                select.order.clone()
            };
            self.build_rows(select, &order);
        } else {
            let order = distinct_order(select.distinct, &select.order);
            if select.reverse {
                // DISTINCT ON must pick rows in the requested order, so the
                // reversal happens in an outer query over the distinct rows.
                self.push("SELECT ");
                self.push_ident(select.table);
                self.push(".* FROM (");
                self.build_rows(select, &order);
                self.push(") AS ");
                self.push_ident(select.table);
                self.build_order(&reversed(&order));
            } else {
                self.build_rows(select, &order);
            }
        }
        self.build_pagination(select.limit, select.offset);
    }

    /// SELECT [DISTINCT ON (...)] table.* FROM table WHERE ... ORDER BY ...
    fn build_rows(&mut self, select: &Select<'_>, order: &[OrderTerm]) {
        self.push("SELECT ");
        if !select.distinct.is_empty() {
            self.push("DISTINCT ON (");
            self.push_separated(select.distinct, |b, column| b.push_column(column));
            self.push(") ");
        }
        self.push_ident(select.table);
        self.push(".* FROM ");
        self.push_ident(select.table);
        self.build_where(select.filter);
        self.build_order(order);
    }

    fn build_aggregate_call(&mut self, func: AggFunc, column: Option<&str>) {
        self.push(func.as_sql());
        self.push("(");
        match column {
            Some(column) => self.push_column(column),
            None => self.push("*"),
        }
        self.push(")");
        if func == AggFunc::Avg {
            self.push("::float8");
        }
    }

    /// Pushes `'_count', jsonb_build_object(...), '_avg', ...` for the
    /// selected aggregates, preceded by a comma unless `first`.
    fn build_aggregate_pairs(&mut self, selection: &AggregateSelection, mut first: bool) {
        for (func, columns, include_all) in selection.groups() {
            if columns.is_empty() && !include_all {
                continue;
            }
            if !first {
                self.push(", ");
            }
            first = false;
            self.push_literal(func.key());
            self.push(", jsonb_build_object(");
            let mut inner_first = true;
            if include_all {
                self.push("'_all', ");
                self.build_aggregate_call(func, None);
                inner_first = false;
            }
            for column in columns {
                if !inner_first {
                    self.push(", ");
                }
                inner_first = false;
                self.push_literal(column);
                self.push(", ");
                self.build_aggregate_call(func, Some(column));
            }
            self.push(")");
        }
    }

    fn build_having(&mut self, having: &[HavingTerm]) {
        if having.is_empty() {
            return;
        }
        self.push(" HAVING ");
        for (i, term) in having.iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            match term {
                HavingTerm::Aggregate {
                    func,
                    column,
                    op,
                    value,
                } => {
                    self.build_aggregate_call(*func, *column);
                    self.push(op.as_sql());
                    self.push_param(value.clone());
                }
                HavingTerm::Field(expr) => self.build_expr(expr),
            }
        }
    }

    fn build_assignments(&mut self, assignments: Assignments<'_>) {
        let touch = assignments
            .touch
            .filter(|column| !assignments.values.iter().any(|(c, _)| c == column));
        if assignments.values.is_empty() && touch.is_none() {
            self.push_ident(assignments.fallback);
            self.push(" = ");
            self.push_column(assignments.fallback);
            return;
        }
        self.push_separated(assignments.values, |b, (column, value)| {
            b.push_ident(column);
            b.push(" = ");
            b.push_value(value);
        });
        if let Some(column) = touch {
            if !self.sql.ends_with("SET ") {
                self.push(", ");
            }
            self.push_ident(column);
            self.push(" = NOW()");
        }
    }

    fn build_update(&mut self, table: &str, assignments: Assignments<'_>, filter: &Expr) {
        self.push("UPDATE ");
        self.push_ident(table);
        self.push(" SET ");
        self.build_assignments(assignments);
        self.build_where(Some(filter));
    }

    fn finish(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

fn reversed(order: &[OrderTerm]) -> Vec<OrderTerm> {
    order.iter().map(|t| t.reversed()).collect()
}

/// ORDER BY for DISTINCT ON: the distinct columns lead, keeping any direction
/// the caller gave them, followed by the remaining terms.
fn distinct_order(distinct: &[&'static str], order: &[OrderTerm]) -> Vec<OrderTerm> {
    let mut out: Vec<OrderTerm> = distinct
        .iter()
        .map(|&column| {
            order
                .iter()
                .find(|t| t.column == column)
                .copied()
                .unwrap_or(OrderTerm {
                    column,
                    order: super::SortOrder::Asc,
                    nulls: None,
                })
        })
        .collect();
    out.extend(order.iter().filter(|t| !distinct.contains(&t.column)).copied());
    out
}

pub(crate) fn select(select: &Select<'_>) -> BuiltQuery {
    let mut b = SqlBuilder::new(select.table);
    b.build_select(select);
    b.finish()
}

pub(crate) fn count(select: &Select<'_>) -> BuiltQuery {
    let mut b = SqlBuilder::new(select.table);
    b.push("SELECT COUNT(*) FROM (");
    b.build_select(select);
    b.push(") AS \"sub\"");
    b.finish()
}

pub(crate) fn aggregate(select: &Select<'_>, selection: &AggregateSelection) -> BuiltQuery {
    let mut b = SqlBuilder::new(select.table);
    b.push("SELECT jsonb_build_object(");
    b.build_aggregate_pairs(selection, true);
    b.push(") FROM (");
    b.build_select(select);
    b.push(") AS ");
    b.push_ident(select.table);
    b.finish()
}

pub(crate) fn group_by(query: &GroupBy<'_>) -> BuiltQuery {
    let mut b = SqlBuilder::new(query.table);
    b.push("SELECT jsonb_build_object(");
    b.push_separated(query.by, |b, column| {
        b.push_literal(column);
        b.push(", ");
        b.push_column(column);
    });
    b.build_aggregate_pairs(query.selection, query.by.is_empty());
    b.push(") FROM ");
    b.push_ident(query.table);
    b.build_where(query.filter);
    b.push(" GROUP BY ");
    b.push_separated(query.by, |b, column| b.push_column(column));
    b.build_having(query.having);
    b.build_order(query.order);
    b.build_pagination(query.limit, query.offset);
    b.finish()
}

/// INSERT of one or more rows sharing the same column list.
///
/// With no columns the single-row form `DEFAULT VALUES` is used.
pub(crate) fn insert(
    table: &str,
    columns: &[&'static str],
    rows: Vec<Vec<Value>>,
    skip_duplicates: bool,
    returning: bool,
) -> BuiltQuery {
    let mut b = SqlBuilder::new(table);
    b.push("INSERT INTO ");
    b.push_ident(table);
    if columns.is_empty() {
        b.push(" DEFAULT VALUES");
    } else {
        b.push(" (");
        b.push_separated(columns, |b, column| b.push_ident(column));
        b.push(") VALUES ");
        b.push_separated(rows, |b, row| {
            b.push("(");
            b.push_separated(row, |b, value| b.push_value(value));
            b.push(")");
        });
    }
    if skip_duplicates {
        b.push(" ON CONFLICT DO NOTHING");
    }
    if returning {
        b.push(" RETURNING *");
    }
    b.finish()
}

pub(crate) fn update(
    table: &str,
    assignments: Assignments<'_>,
    filter: &Expr,
    returning: bool,
) -> BuiltQuery {
    let mut b = SqlBuilder::new(table);
    b.build_update(table, assignments, filter);
    if returning {
        b.push(" RETURNING *");
    }
    b.finish()
}

pub(crate) fn delete(table: &str, filter: &Expr, returning: bool) -> BuiltQuery {
    let mut b = SqlBuilder::new(table);
    b.push("DELETE FROM ");
    b.push_ident(table);
    b.build_where(Some(filter));
    if returning {
        b.push(" RETURNING *");
    }
    b.finish()
}

/// Update-if-exists-else-insert as one statement.
///
/// The UPDATE runs first in a CTE; the INSERT only fires when it touched no
/// row. `create` must not contain column-default markers.
pub(crate) fn upsert(
    table: &str,
    key: &Expr,
    create: Vec<(&'static str, Value)>,
    assignments: Assignments<'_>,
) -> BuiltQuery {
    let mut b = SqlBuilder::new(table);
    b.push("WITH \"updated\" AS (");
    b.build_update(table, assignments, key);
    b.push(" RETURNING *), \"inserted\" AS (INSERT INTO ");
    b.push_ident(table);
    b.push(" (");
    b.push_separated(create.iter().map(|(c, _)| *c), |b, column| b.push_ident(column));
    b.push(") SELECT ");
    b.push_separated(create.into_iter().map(|(_, v)| v), |b, value| b.push_param(value));
    b.push(" WHERE NOT EXISTS (SELECT 1 FROM \"updated\") RETURNING *) ");
    b.push("SELECT * FROM \"updated\" UNION ALL SELECT * FROM \"inserted\"");
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::Join;
    use crate::query::order::{NullsOrder, SortOrder};

    fn text(s: &str) -> Value {
        Value::Text(Some(s.to_string()))
    }

    fn order(column: &'static str, order: SortOrder) -> OrderTerm {
        OrderTerm {
            column,
            order,
            nulls: None,
        }
    }

    #[test]
    fn test_select_with_filter_order_and_pagination() {
        let filter = Expr::And(vec![
            Expr::eq("title", text("Ship")),
            Expr::Compare {
                column: "status",
                op: CompareOp::Ne,
                value: Value::Enum {
                    type_name: "task_status",
                    label: Some("FINISHED"),
                },
            },
        ]);
        let query = select(&Select {
            table: "tasks",
            filter: Some(&filter),
            order: vec![OrderTerm {
                column: "created_at",
                order: SortOrder::Desc,
                nulls: Some(NullsOrder::Last),
            }],
            limit: Some(10),
            offset: Some(20),
            distinct: &[],
            reverse: false,
        });

        assert_eq!(
            query.sql,
            "SELECT \"tasks\".* FROM \"tasks\" WHERE (\"tasks\".\"title\" = $1 AND \"tasks\".\"status\" <> $2::task_status) ORDER BY \"tasks\".\"created_at\" DESC NULLS LAST LIMIT $3 OFFSET $4"
        );
        assert_eq!(query.params.len(), 4);
        assert_eq!(query.params[2], Value::BigInt(Some(10)));
    }

    #[test]
    fn test_null_equality_renders_is_null() {
        let filter = Expr::Or(vec![
            Expr::eq("assigned_to_id", Value::Uuid(None)),
            Expr::Compare {
                column: "project_id",
                op: CompareOp::Ne,
                value: Value::Uuid(None),
            },
        ]);
        let query = select(&Select::filtered("tasks", &filter));
        assert!(query.sql.ends_with(
            "WHERE (\"tasks\".\"assigned_to_id\" IS NULL OR \"tasks\".\"project_id\" IS NOT NULL)"
        ));
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_empty_junctions_and_lists() {
        let filter = Expr::And(vec![
            Expr::Or(vec![]),
            Expr::And(vec![]),
            Expr::In {
                column: "id",
                values: vec![],
                negated: false,
            },
            Expr::In {
                column: "id",
                values: vec![],
                negated: true,
            },
        ]);
        let query = select(&Select::filtered("users", &filter));
        assert!(query.sql.ends_with("WHERE (FALSE AND TRUE AND FALSE AND TRUE)"));
    }

    #[test]
    fn test_in_list_binds_each_value() {
        let filter = Expr::In {
            column: "status",
            values: vec![
                Value::Enum {
                    type_name: "task_status",
                    label: Some("CREATED"),
                },
                Value::Enum {
                    type_name: "task_status",
                    label: Some("IN_PROGRESS"),
                },
            ],
            negated: true,
        };
        let query = select(&Select::filtered("tasks", &filter));
        assert!(query
            .sql
            .ends_with("\"tasks\".\"status\" NOT IN ($1::task_status, $2::task_status)"));
    }

    #[test]
    fn test_like_filters() {
        let filter = Expr::Like {
            column: "name",
            pattern: "%abc%".to_string(),
            insensitive: true,
        };
        let query = select(&Select::filtered("projects", &filter));
        assert!(query.sql.ends_with("\"projects\".\"name\" ILIKE $1"));
        assert_eq!(query.params, vec![text("%abc%")]);
    }

    #[test]
    fn test_relation_exists_uses_nested_alias() {
        let filter = Expr::Exists {
            join: Join {
                table: "project_members",
                local_column: "id",
                foreign_column: "project_id",
            },
            filter: Box::new(Expr::Exists {
                join: Join {
                    table: "users",
                    local_column: "user_id",
                    foreign_column: "id",
                },
                filter: Box::new(Expr::eq("email", text("a@b.c"))),
                negated: false,
            }),
            negated: true,
        };
        let query = select(&Select::filtered("projects", &filter));
        assert_eq!(
            query.sql,
            "SELECT \"projects\".* FROM \"projects\" WHERE NOT EXISTS (SELECT 1 FROM \"project_members\" AS \"r1\" WHERE \"r1\".\"project_id\" = \"projects\".\"id\" AND EXISTS (SELECT 1 FROM \"users\" AS \"r2\" WHERE \"r2\".\"id\" = \"r1\".\"user_id\" AND \"r2\".\"email\" = $1))"
        );
    }

    #[test]
    fn test_distinct_on_leads_order() {
        let orders = vec![
            order("created_at", SortOrder::Desc),
            order("status", SortOrder::Desc),
        ];
        let distinct = ["status"];
        let query = select(&Select {
            table: "tasks",
            filter: None,
            order: orders,
            limit: None,
            offset: None,
            distinct: &distinct,
            reverse: false,
        });
        assert_eq!(
            query.sql,
            "SELECT DISTINCT ON (\"tasks\".\"status\") \"tasks\".* FROM \"tasks\" ORDER BY \"tasks\".\"status\" DESC, \"tasks\".\"created_at\" DESC"
        );
    }

    #[test]
    fn test_reversed_select_flips_order() {
        let orders = vec![order("title", SortOrder::Asc)];
        let query = select(&Select {
            table: "tasks",
            filter: None,
            order: orders,
            limit: Some(2),
            offset: None,
            distinct: &[],
            reverse: true,
        });
        assert_eq!(
            query.sql,
            "SELECT \"tasks\".* FROM \"tasks\" ORDER BY \"tasks\".\"title\" DESC LIMIT $1"
        );
    }

    #[test]
    fn test_reversed_distinct_picks_rows_before_reversing() {
        let orders = vec![order("created_at", SortOrder::Asc)];
        let distinct = ["status"];
        let query = select(&Select {
            table: "tasks",
            filter: None,
            order: orders,
            limit: Some(2),
            offset: None,
            distinct: &distinct,
            reverse: true,
        });
        assert_eq!(
            query.sql,
            "SELECT \"tasks\".* FROM (SELECT DISTINCT ON (\"tasks\".\"status\") \"tasks\".* FROM \"tasks\" ORDER BY \"tasks\".\"status\" ASC, \"tasks\".\"created_at\" ASC) AS \"tasks\" ORDER BY \"tasks\".\"status\" DESC, \"tasks\".\"created_at\" DESC LIMIT $1"
        );
    }

    #[test]
    fn test_not_true_treats_null_as_failure() {
        let filter = Expr::Exists {
            join: Join {
                table: "tasks",
                local_column: "id",
                foreign_column: "project_id",
            },
            filter: Box::new(Expr::NotTrue(Box::new(Expr::eq("description", text("x"))))),
            negated: true,
        };
        let query = select(&Select::filtered("projects", &filter));
        assert!(query.sql.ends_with(
            "NOT EXISTS (SELECT 1 FROM \"tasks\" AS \"r1\" WHERE \"r1\".\"project_id\" = \"projects\".\"id\" AND (\"r1\".\"description\" = $1) IS NOT TRUE)"
        ));
    }

    #[test]
    fn test_count_wraps_select() {
        let filter = Expr::eq("user_id", Value::Uuid(Some(uuid::Uuid::nil())));
        let query = count(&Select::filtered("sessions", &filter).limit(5));
        assert_eq!(
            query.sql,
            "SELECT COUNT(*) FROM (SELECT \"sessions\".* FROM \"sessions\" WHERE \"sessions\".\"user_id\" = $1 LIMIT $2) AS \"sub\""
        );
    }

    #[test]
    fn test_insert_multiple_rows_with_defaults() {
        let query = insert(
            "tasks",
            &["id", "title", "status"],
            vec![
                vec![Value::Uuid(Some(uuid::Uuid::nil())), text("a"), Value::Default],
                vec![
                    Value::Uuid(Some(uuid::Uuid::nil())),
                    text("b"),
                    Value::Enum {
                        type_name: "task_status",
                        label: Some("FINISHED"),
                    },
                ],
            ],
            true,
            false,
        );
        assert_eq!(
            query.sql,
            "INSERT INTO \"tasks\" (\"id\", \"title\", \"status\") VALUES ($1, $2, DEFAULT), ($3, $4, $5::task_status) ON CONFLICT DO NOTHING"
        );
        assert_eq!(query.params.len(), 5);
    }

    #[test]
    fn test_insert_without_columns_uses_default_values() {
        let query = insert("users", &[], vec![vec![]], false, true);
        assert_eq!(query.sql, "INSERT INTO \"users\" DEFAULT VALUES RETURNING *");
    }

    #[test]
    fn test_update_touches_updated_at() {
        let key = Expr::eq("id", Value::Uuid(Some(uuid::Uuid::nil())));
        let query = update(
            "projects",
            Assignments {
                values: vec![("name", text("Renamed")), ("description", Value::Text(None))],
                touch: Some("updated_at"),
                fallback: "id",
            },
            &key,
            true,
        );
        assert_eq!(
            query.sql,
            "UPDATE \"projects\" SET \"name\" = $1, \"description\" = $2, \"updated_at\" = NOW() WHERE \"projects\".\"id\" = $3 RETURNING *"
        );
    }

    #[test]
    fn test_update_explicit_updated_at_is_not_overridden() {
        let key = Expr::Literal(true);
        let query = update(
            "posts",
            Assignments {
                values: vec![("updated_at", Value::Timestamp(Some(chrono::Utc::now())))],
                touch: Some("updated_at"),
                fallback: "id",
            },
            &key,
            false,
        );
        assert_eq!(
            query.sql,
            "UPDATE \"posts\" SET \"updated_at\" = $1 WHERE TRUE"
        );
    }

    #[test]
    fn test_empty_update_falls_back_to_self_assignment() {
        let key = Expr::eq("token", text("t"));
        let query = update(
            "verification_tokens",
            Assignments {
                values: vec![],
                touch: None,
                fallback: "token",
            },
            &key,
            true,
        );
        assert_eq!(
            query.sql,
            "UPDATE \"verification_tokens\" SET \"token\" = \"verification_tokens\".\"token\" WHERE \"verification_tokens\".\"token\" = $1 RETURNING *"
        );
    }

    #[test]
    fn test_touch_only_update() {
        let key = Expr::Literal(true);
        let query = update(
            "tasks",
            Assignments {
                values: vec![],
                touch: Some("updated_at"),
                fallback: "id",
            },
            &key,
            false,
        );
        assert_eq!(query.sql, "UPDATE \"tasks\" SET \"updated_at\" = NOW() WHERE TRUE");
    }

    #[test]
    fn test_delete_returning() {
        let key = Expr::eq("session_token", text("abc"));
        let query = delete("sessions", &key, true);
        assert_eq!(
            query.sql,
            "DELETE FROM \"sessions\" WHERE \"sessions\".\"session_token\" = $1 RETURNING *"
        );
    }

    #[test]
    fn test_upsert_statement_shape() {
        let key = Expr::eq("token", text("tok"));
        let query = upsert(
            "verification_tokens",
            &key,
            vec![("identifier", text("a@b.c")), ("token", text("tok"))],
            Assignments {
                values: vec![("identifier", text("c@d.e"))],
                touch: None,
                fallback: "token",
            },
        );
        assert_eq!(
            query.sql,
            "WITH \"updated\" AS (UPDATE \"verification_tokens\" SET \"identifier\" = $1 WHERE \"verification_tokens\".\"token\" = $2 RETURNING *), \"inserted\" AS (INSERT INTO \"verification_tokens\" (\"identifier\", \"token\") SELECT $3, $4 WHERE NOT EXISTS (SELECT 1 FROM \"updated\") RETURNING *) SELECT * FROM \"updated\" UNION ALL SELECT * FROM \"inserted\""
        );
        assert_eq!(query.params.len(), 4);
    }

    #[test]
    fn test_aggregate_builds_json_object() {
        let selection = AggregateSelection {
            count_all: true,
            count: vec!["scope"],
            avg: vec!["expires_at"],
            sum: vec![],
            min: vec![],
            max: vec!["expires_at"],
        };
        let query = aggregate(&Select::filtered("accounts", &Expr::Literal(true)), &selection);
        assert_eq!(
            query.sql,
            "SELECT jsonb_build_object('_count', jsonb_build_object('_all', COUNT(*), 'scope', COUNT(\"accounts\".\"scope\")), '_avg', jsonb_build_object('expires_at', AVG(\"accounts\".\"expires_at\")::float8), '_max', jsonb_build_object('expires_at', MAX(\"accounts\".\"expires_at\"))) FROM (SELECT \"accounts\".* FROM \"accounts\" WHERE TRUE) AS \"accounts\""
        );
    }

    #[test]
    fn test_group_by_with_having() {
        let selection = AggregateSelection {
            count_all: true,
            ..Default::default()
        };
        let having = [HavingTerm::Aggregate {
            func: AggFunc::Count,
            column: None,
            op: CompareOp::Gt,
            value: Value::BigInt(Some(1)),
        }];
        let order = [order("status", SortOrder::Asc)];
        let query = group_by(&GroupBy {
            table: "tasks",
            by: &["status"],
            filter: None,
            having: &having,
            order: &order,
            limit: Some(2),
            offset: None,
            selection: &selection,
        });
        assert_eq!(
            query.sql,
            "SELECT jsonb_build_object('status', \"tasks\".\"status\", '_count', jsonb_build_object('_all', COUNT(*))) FROM \"tasks\" GROUP BY \"tasks\".\"status\" HAVING COUNT(*) > $1 ORDER BY \"tasks\".\"status\" ASC LIMIT $2"
        );
    }

    #[test]
    fn test_identifier_and_literal_quoting() {
        let mut b = SqlBuilder::new("t");
        b.push_ident("we\"ird");
        b.push(" ");
        b.push_literal("it's");
        assert_eq!(b.sql, "\"we\"\"ird\" 'it''s'");
    }
}
