/// Per-model operations
///
/// A `Delegate<M>` is obtained from a [`Client`](crate::client::Client)
/// (`client.task()`, `client.user()`, ...) and runs every operation against
/// the client's pool or transaction. All operations are single statements.
///
/// # Operations
///
/// | Reads | Writes | Aggregates |
/// |---|---|---|
/// | `find_unique`, `find_unique_or_throw` | `create`, `create_many`, `create_many_and_return` | `count` |
/// | `find_first`, `find_first_or_throw` | `update`, `update_many`, `update_many_and_return` | `aggregate` |
/// | `find_many` | `upsert`, `delete`, `delete_many` | `group_by` |
///
/// # Example
///
/// ```no_run
/// use taskboard_db::client::Client;
/// use taskboard_db::models::task::{fields, TaskStatus, UpdateTask};
/// use taskboard_db::query::GroupByArgs;
/// use uuid::Uuid;
///
/// # async fn example(client: Client, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let in_project = fields::PROJECT_ID.equals(Some(project_id));
///
/// // Close every open task in the project
/// let closed = client
///     .task()
///     .update_many(
///         in_project.clone().with(fields::STATUS.not(TaskStatus::Finished)),
///         UpdateTask::status_change(TaskStatus::Finished),
///     )
///     .await?;
///
/// // Tasks per status
/// let groups = client
///     .task()
///     .group_by(GroupByArgs::by(fields::STATUS).filter(in_project).count_all())
///     .await?;
/// for group in &groups {
///     let status: TaskStatus = group.get(fields::STATUS)?;
///     println!("{:?}: {}", status, group.aggregates().count_all());
/// }
/// # Ok(())
/// # }
/// ```

use crate::client::Handle;
use crate::error::{DbError, DbResult};
use crate::models::{CreateInput, Model, UniqueKey, UpdateInput};
use crate::query::sql::{self, Select};
use crate::query::{
    AggregateArgs, AggregateResult, Assignments, Expr, Filter, FindArgs, GroupByArgs, GroupRow,
    Value,
};
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use tracing::debug;

/// Operations on model `M`
pub struct Delegate<M> {
    handle: Handle,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Delegate<M> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> Delegate<M> {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            _model: PhantomData,
        }
    }
}

/// Equality on every column of a unique key
fn key_filter(key: &impl UniqueKey) -> Expr {
    Expr::And(
        key.columns()
            .into_iter()
            .map(|(column, value)| Expr::eq(column, value))
            .collect(),
    )
}

/// Create values without the column-default markers, for single-row forms
fn explicit_values(values: Vec<(&'static str, Value)>) -> Vec<(&'static str, Value)> {
    values.into_iter().filter(|(_, v)| !v.is_default()).collect()
}

impl<M: Model> Delegate<M> {
    fn assignments(data: M::Update) -> Assignments<'static> {
        Assignments {
            values: data.into_assignments(),
            touch: M::UPDATED_AT,
            fallback: M::PRIMARY_KEY.first().copied().unwrap_or("id"),
        }
    }

    /// Rows of a multi-row insert, with one shared column list
    fn insert_rows(data: Vec<M::Create>) -> DbResult<(Vec<&'static str>, Vec<Vec<Value>>)> {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut rows = Vec::with_capacity(data.len());

        for input in data {
            input.validate_input()?;
            let values = input.into_values();
            if columns.is_empty() {
                columns = values.iter().map(|(c, _)| *c).collect();
            } else if values.len() != columns.len()
                || values.iter().zip(&columns).any(|((c, _), expected)| c != expected)
            {
                return Err(DbError::InvalidQuery(format!(
                    "{} create inputs do not share a column list",
                    M::NAME
                )));
            }
            rows.push(values.into_iter().map(|(_, v)| v).collect());
        }

        Ok((columns, rows))
    }

    /// The row matching a unique key, if any
    pub async fn find_unique(&self, key: M::Unique) -> DbResult<Option<M>> {
        let filter = key_filter(&key);
        let query = sql::select(&Select::filtered(M::TABLE, &filter).limit(1));
        self.handle.fetch_optional(M::NAME, "find_unique", query).await
    }

    /// Like `find_unique`, failing with `NotFound` when no row matches
    pub async fn find_unique_or_throw(&self, key: M::Unique) -> DbResult<M> {
        self.find_unique(key)
            .await?
            .ok_or_else(|| DbError::not_found(M::NAME, "find_unique_or_throw"))
    }

    /// The first row matching `args`
    ///
    /// With a negative `take` this is the last row in the requested order.
    pub async fn find_first(&self, args: impl Into<FindArgs<M>>) -> DbResult<Option<M>> {
        let args: FindArgs<M> = args.into();
        let (mut select, _) = args.to_select();
        select.limit = Some(select.limit.map_or(1, |limit| limit.min(1)));
        let query = sql::select(&select);
        self.handle.fetch_optional(M::NAME, "find_first", query).await
    }

    pub async fn find_first_or_throw(&self, args: impl Into<FindArgs<M>>) -> DbResult<M> {
        self.find_first(args)
            .await?
            .ok_or_else(|| DbError::not_found(M::NAME, "find_first_or_throw"))
    }

    /// All rows matching `args`, in the requested order
    pub async fn find_many(&self, args: impl Into<FindArgs<M>>) -> DbResult<Vec<M>> {
        let args: FindArgs<M> = args.into();
        let (select, reversed) = args.to_select();
        let query = sql::select(&select);
        let mut rows: Vec<M> = self.handle.fetch_all(M::NAME, "find_many", query).await?;
        if reversed {
            rows.reverse();
        }
        Ok(rows)
    }

    /// Inserts one row and returns it
    pub async fn create(&self, data: M::Create) -> DbResult<M> {
        data.validate_input()?;
        let values = explicit_values(data.into_values());
        let (columns, row): (Vec<_>, Vec<_>) = values.into_iter().unzip();
        let query = sql::insert(M::TABLE, &columns, vec![row], false, true);
        let created: M = self.handle.fetch_one(M::NAME, "create", query).await?;
        debug!(model = M::NAME, "Record created");
        Ok(created)
    }

    /// Inserts many rows in one statement and returns how many were inserted.
    ///
    /// With `skip_duplicates`, rows hitting a unique constraint are skipped.
    pub async fn create_many(&self, data: Vec<M::Create>, skip_duplicates: bool) -> DbResult<u64> {
        if data.is_empty() {
            return Ok(0);
        }
        let (columns, rows) = Self::insert_rows(data)?;
        let query = sql::insert(M::TABLE, &columns, rows, skip_duplicates, false);
        self.handle.execute(M::NAME, "create_many", query).await
    }

    /// Like `create_many`, returning the inserted rows
    pub async fn create_many_and_return(
        &self,
        data: Vec<M::Create>,
        skip_duplicates: bool,
    ) -> DbResult<Vec<M>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let (columns, rows) = Self::insert_rows(data)?;
        let query = sql::insert(M::TABLE, &columns, rows, skip_duplicates, true);
        self.handle
            .fetch_all(M::NAME, "create_many_and_return", query)
            .await
    }

    /// Updates the row matching a unique key and returns it
    pub async fn update(&self, key: M::Unique, data: M::Update) -> DbResult<M> {
        let filter = key_filter(&key);
        let query = sql::update(M::TABLE, Self::assignments(data), &filter, true);
        self.handle.fetch_one(M::NAME, "update", query).await
    }

    /// Updates every row matching `filter` and returns how many changed
    pub async fn update_many(&self, filter: Filter<M>, data: M::Update) -> DbResult<u64> {
        let query = sql::update(M::TABLE, Self::assignments(data), filter.expr(), false);
        self.handle.execute(M::NAME, "update_many", query).await
    }

    pub async fn update_many_and_return(
        &self,
        filter: Filter<M>,
        data: M::Update,
    ) -> DbResult<Vec<M>> {
        let query = sql::update(M::TABLE, Self::assignments(data), filter.expr(), true);
        self.handle
            .fetch_all(M::NAME, "update_many_and_return", query)
            .await
    }

    /// Updates the row matching `key`, or inserts `create` when there is none
    pub async fn upsert(&self, key: M::Unique, create: M::Create, update: M::Update) -> DbResult<M> {
        create.validate_input()?;
        let filter = key_filter(&key);
        let values = explicit_values(create.into_values());
        let query = sql::upsert(M::TABLE, &filter, values, Self::assignments(update));
        self.handle.fetch_one(M::NAME, "upsert", query).await
    }

    /// Deletes the row matching a unique key and returns it
    pub async fn delete(&self, key: M::Unique) -> DbResult<M> {
        let filter = key_filter(&key);
        let query = sql::delete(M::TABLE, &filter, true);
        self.handle.fetch_one(M::NAME, "delete", query).await
    }

    /// Deletes every row matching `filter` and returns how many were removed
    pub async fn delete_many(&self, filter: Filter<M>) -> DbResult<u64> {
        let query = sql::delete(M::TABLE, filter.expr(), false);
        self.handle.execute(M::NAME, "delete_many", query).await
    }

    /// Number of rows matching `args`, after take and skip
    pub async fn count(&self, args: impl Into<FindArgs<M>>) -> DbResult<i64> {
        let args: FindArgs<M> = args.into();
        let (select, _) = args.to_select();
        let query = sql::count(&select);
        self.handle.fetch_scalar(M::NAME, "count", query).await
    }

    /// Aggregates over the rows matching `args`
    pub async fn aggregate(&self, args: AggregateArgs<M>) -> DbResult<AggregateResult<M>> {
        let (select, selection) = args.to_select();
        let query = sql::aggregate(&select, selection);
        let json: JsonValue = self.handle.fetch_scalar(M::NAME, "aggregate", query).await?;
        Ok(AggregateResult::from_json(json))
    }

    /// Groups rows and aggregates each group
    pub async fn group_by(&self, args: GroupByArgs<M>) -> DbResult<Vec<GroupRow<M>>> {
        args.validate()?;
        let having = args.having_terms();
        let order = args.order_terms();
        let query = sql::group_by(&args.to_query(&having, &order));
        let groups: Vec<JsonValue> = self.handle.fetch_scalars(M::NAME, "group_by", query).await?;
        Ok(groups.into_iter().map(GroupRow::from_json).collect())
    }
}
