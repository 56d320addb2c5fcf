//! Typed CRUD operations over any [`Model`].
//!
//! Reads propagate validation and database errors, except that a missing
//! table or column yields `Ok(None)`. Writes report success as a `bool` and
//! log what went wrong.

use std::marker::PhantomData;

use datarepo_core::error::{DbError, RepoError, Result};
use datarepo_core::filter::{Filter, eq};
use datarepo_core::model::{MapKeys, Model, ModelDescriptor, Row, joined_value};
use datarepo_core::query::{
    OrderBy, SelectQuery, Selection, build_delete_by_id, build_delete_where, build_insert,
    build_select, build_update,
};
use datarepo_core::sql::CompiledQuery;
use datarepo_core::value::{FromValue, Value, encode_fields};
use datarepo_core::{
    datarepo_log_error, datarepo_log_warn, datarepo_trace_query, datarepo_trace_tx,
};

use crate::connection::{Connection, Connector, Hooks};

/// Data-access entry point. Opens one connection per operation.
///
/// ```ignore
/// let repo = DataRepo::new(RusqliteConnector::new("bookings.db"));
/// let confirmed = repo
///     .select::<Booking>()
///     .r#where(Filter::new().column("status", eq("confirmed")))
///     .order_by("created_at", "DESC")
///     .all()?;
/// ```
#[derive(Debug)]
pub struct DataRepo<C> {
    connector: C,
    hooks: Hooks,
}

/// Builder for a [`DataRepo`] with connection hooks.
#[derive(Debug)]
pub struct DataRepoBuilder<C> {
    connector: C,
    hooks: Hooks,
}

impl<C> DataRepoBuilder<C> {
    pub fn on_before_connect(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks = self.hooks.on_before_connect(hook);
        self
    }

    pub fn on_connect_error(mut self, hook: impl Fn(&DbError) + Send + Sync + 'static) -> Self {
        self.hooks = self.hooks.on_connect_error(hook);
        self
    }

    pub fn build(self) -> DataRepo<C> {
        DataRepo {
            connector: self.connector,
            hooks: self.hooks,
        }
    }
}

impl<C: Connector> DataRepo<C> {
    pub fn new(connector: C) -> Self {
        Self::builder(connector).build()
    }

    pub fn builder(connector: C) -> DataRepoBuilder<C> {
        DataRepoBuilder {
            connector,
            hooks: Hooks::new(),
        }
    }

    pub fn with_hooks(connector: C, hooks: Hooks) -> Self {
        Self { connector, hooks }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn connect(&self) -> std::result::Result<C::Connection, DbError> {
        self.hooks.before_connect();
        self.connector
            .connect()
            .inspect_err(|err| self.hooks.connect_error(err))
    }

    /// Starts a SELECT over `M`'s table.
    pub fn select<M: Model>(&self) -> SelectBuilder<'_, C, M> {
        SelectBuilder {
            repo: self,
            query: SelectQuery::default(),
            _model: PhantomData,
        }
    }

    /// Runs a compiled read. A missing table or column is `Ok(None)`.
    pub fn fetch(&self, table: &str, query: &CompiledQuery) -> Result<Option<Vec<Row>>> {
        let mut conn = self.connect().map_err(|err| {
            datarepo_log_error!("connect", table, err);
            RepoError::Connection(err)
        })?;
        datarepo_trace_query!("select", table, query);
        match conn.query(query) {
            Ok(rows) => Ok(Some(rows)),
            Err(err) if err.is_missing_relation() => {
                datarepo_log_warn!("select", table, err);
                Ok(None)
            }
            Err(err) => {
                datarepo_log_error!("select", table, err);
                Err(RepoError::Database(err))
            }
        }
    }

    /// Inserts `model` and writes the generated primary key back into it.
    pub fn insert<M: Model>(&self, model: &mut M) -> bool {
        let descriptor = M::descriptor();
        match self.try_insert(descriptor, model) {
            Ok(()) => true,
            Err(err) => {
                datarepo_log_error!("insert", descriptor.table_name, err);
                false
            }
        }
    }

    fn try_insert<M: Model>(&self, descriptor: &ModelDescriptor, model: &mut M) -> Result<()> {
        let fields = encode_fields(model.to_map(MapKeys::Column));
        let query = build_insert(descriptor, &fields)?;
        let mut conn = self.connect().map_err(RepoError::Connection)?;
        datarepo_trace_query!("insert", descriptor.table_name, query);
        let rows = conn.query(&query).map_err(RepoError::Database)?;
        let id = rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove(descriptor.primary_key_column()));
        if let Some(id) = id {
            model.set_id(id)?;
        }
        Ok(())
    }

    /// Writes every set field except the primary key to the row `model`
    /// identifies.
    pub fn update<M: Model>(&self, model: &M) -> bool {
        let descriptor = M::descriptor();
        match self.try_update(descriptor, model) {
            Ok(()) => true,
            Err(err) => {
                datarepo_log_error!("update", descriptor.table_name, err);
                false
            }
        }
    }

    fn try_update<M: Model>(&self, descriptor: &ModelDescriptor, model: &M) -> Result<()> {
        let id = model.id();
        if id.is_null() {
            return Err(RepoError::InvalidField {
                field: descriptor.primary_key.to_owned(),
                table: descriptor.table_name.to_owned(),
            });
        }
        let fields = encode_fields(model.to_map(MapKeys::Column));
        let query = build_update(descriptor, &fields, id)?;
        let mut conn = self.connect().map_err(RepoError::Connection)?;
        datarepo_trace_query!("update", descriptor.table_name, query);
        conn.execute(&query).map_err(RepoError::Database)?;
        Ok(())
    }

    /// Deletes the row `model` identifies.
    pub fn delete<M: Model>(&self, model: &M) -> bool {
        self.delete_many(std::slice::from_ref(model))
    }

    /// Deletes every instance by primary key inside one transaction. Any
    /// failure rolls the whole batch back.
    pub fn delete_many<M: Model>(&self, models: &[M]) -> bool {
        if models.is_empty() {
            return true;
        }
        let descriptor = M::descriptor();
        let table = descriptor.table_name;

        let mut conn = match self.connect() {
            Ok(conn) => conn,
            Err(err) => {
                datarepo_log_error!("delete", table, err);
                return false;
            }
        };

        if let Err(err) = conn.begin() {
            datarepo_log_error!("delete", table, err);
            return false;
        }
        datarepo_trace_tx!("begin", table, models.len());

        for model in models {
            let query = build_delete_by_id(descriptor, model.id());
            datarepo_trace_query!("delete", table, query);
            if let Err(err) = conn.execute(&query) {
                datarepo_log_error!("delete", table, err);
                rollback(&mut conn, table, models.len());
                return false;
            }
        }

        match conn.commit() {
            Ok(()) => {
                datarepo_trace_tx!("commit", table, models.len());
                true
            }
            Err(err) => {
                datarepo_log_error!("commit", table, err);
                rollback(&mut conn, table, models.len());
                false
            }
        }
    }

    /// Deletes every row of `M`'s table matching `filter`.
    ///
    /// An empty filter is refused before a connection is opened.
    pub fn delete_where<M: Model>(&self, filter: &Filter) -> Result<bool> {
        let descriptor = M::descriptor();
        let query = build_delete_where(descriptor, filter)?;

        let mut conn = match self.connect() {
            Ok(conn) => conn,
            Err(err) => {
                datarepo_log_error!("delete", descriptor.table_name, err);
                return Ok(false);
            }
        };
        datarepo_trace_query!("delete", descriptor.table_name, query);
        match conn.execute(&query) {
            Ok(_) => Ok(true),
            Err(err) => {
                datarepo_log_error!("delete", descriptor.table_name, err);
                Ok(false)
            }
        }
    }

    /// Loads the `T` that `model` references and stores it in the field
    /// named by the foreign key's `join`.
    pub fn load_join<M: Model, T: Model>(&self, model: &mut M) -> Result<()> {
        let descriptor = M::descriptor();
        let target = T::descriptor();
        let fk = descriptor
            .foreign_key_for(target)
            .ok_or_else(|| RepoError::MissingForeignKey(target.table_name.to_owned()))?;

        let key = model.get(fk.property).unwrap_or_default();
        let pk = target.primary_key_column();
        let related = self
            .select::<T>()
            .r#where(Filter::new().column(pk, eq(key.clone())))
            .first()?
            .ok_or_else(|| RepoError::RelatedNotFound {
                table: target.table_name,
                column: pk,
                value: key.to_string(),
            })?;

        model.set(fk.join_result_name(), joined_value(&related))?;
        Ok(())
    }
}

/// Rolls back the delete batch. A failed rollback is logged; the connection
/// is dropped either way.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn rollback<T: Connection>(conn: &mut T, table: &str, batch: usize) {
    match conn.rollback() {
        Ok(()) => {
            datarepo_trace_tx!("rollback", table, batch);
        }
        Err(err) => {
            datarepo_log_error!("rollback", table, err);
        }
    }
}

/// A SELECT under construction. Nothing is validated until it runs.
#[derive(Debug)]
#[must_use = "a select does nothing until it is run"]
pub struct SelectBuilder<'a, C, M> {
    repo: &'a DataRepo<C>,
    query: SelectQuery,
    _model: PhantomData<M>,
}

impl<'a, C: Connector, M: Model> SelectBuilder<'a, C, M> {
    /// Restricts the select list. Accepts column names, `COUNT(...)` and
    /// [`Selection::joined`].
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        self.query.select.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Joins `T` through `M`'s foreign key to it.
    pub fn join<T: Model>(mut self) -> Self {
        self.query.joins.push(T::descriptor());
        self
    }

    pub fn r#where(mut self, filter: Filter) -> Self {
        self.query.filter = filter;
        self
    }

    /// Adds an ORDER BY item; `direction` is `ASC` or `DESC` in any case.
    pub fn order_by(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.query.order_by.push(OrderBy::new(column, direction));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn query(&self) -> &SelectQuery {
        &self.query
    }

    /// Compiles without running.
    pub fn to_query(&self) -> Result<CompiledQuery> {
        build_select(M::descriptor(), &self.query)
    }

    /// Raw rows. `Ok(None)` when the table or a column does not exist.
    pub fn rows(self) -> Result<Option<Vec<Row>>> {
        let query = self.to_query()?;
        self.repo.fetch(M::descriptor().table_name, &query)
    }

    /// Decoded instances; `Ok(Some(vec![]))` when nothing matches.
    pub fn all(self) -> Result<Option<Vec<M>>> {
        let Some(rows) = self.rows()? else {
            return Ok(None);
        };
        let models = rows
            .iter()
            .map(M::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Some(models))
    }

    /// First decoded instance, if any. Fetches at most one row.
    pub fn first(mut self) -> Result<Option<M>> {
        self.query.limit = Some(1);
        Ok(self.all()?.and_then(|models| models.into_iter().next()))
    }

    /// `COUNT(*)` over the current filter and joins. Ordering and paging do
    /// not apply.
    pub fn count(mut self) -> Result<Option<i64>> {
        self.query.select = vec![Selection::column("COUNT(*)")];
        self.query.order_by.clear();
        self.query.limit = None;
        self.query.offset = None;
        let Some(rows) = self.rows()? else {
            return Ok(None);
        };
        let count = rows
            .into_iter()
            .next()
            .and_then(|mut row| row.remove("count"))
            .unwrap_or(Value::Integer(0));
        Ok(Some(i64::from_value(count)?))
    }
}
