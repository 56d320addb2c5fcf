//! SELECT / INSERT / UPDATE / DELETE statement builders.
//!
//! Every identifier that reaches the SQL text is checked against a
//! [`ModelDescriptor`] first; values only ever travel as named parameters.

use crate::error::{RepoError, Result};
use crate::filter::Filter;
use crate::model::{FieldSpec, ModelDescriptor};
use crate::sql::{
    CompiledQuery, ID_PLACEHOLDER, LIMIT_PLACEHOLDER, OFFSET_PLACEHOLDER, Params,
};
use crate::value::Value;

/// LIMIT bound when only an OFFSET was asked for. SQLite and MySQL both
/// accept it as "all remaining rows".
pub const UNBOUNDED_LIMIT: i64 = i64::MAX;

/// Aggregate functions accepted as plain selections.
pub const FUNCTIONS: &[&str] = &["COUNT"];

/// One item of a select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A column of the queried table, or an aggregate such as `COUNT(*)`
    Column(String),
    /// Columns of a joined table, selected as one JSON object
    Joined { table: String, fields: Vec<String> },
}

impl Selection {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Selects `fields` of the joined `table`; an empty list selects all of
    /// its columns.
    pub fn joined<I, S>(table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Joined {
            table: table.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Self::Column(name.to_owned())
    }
}

impl From<String> for Selection {
    fn from(name: String) -> Self {
        Self::Column(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Case-insensitive `asc` / `desc`.
    pub fn parse(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(RepoError::InvalidOrderDirection(s.to_owned()))
        }
    }
}

/// ORDER BY item. The direction is kept as given and checked when the
/// statement is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: String,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: direction.into(),
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, "ASC")
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, "DESC")
    }
}

/// Everything a SELECT can be asked for.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub select: Vec<Selection>,
    pub joins: Vec<&'static ModelDescriptor>,
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn foreign_key(
    descriptor: &ModelDescriptor,
    target: &ModelDescriptor,
) -> Result<&'static FieldSpec> {
    descriptor
        .foreign_key_for(target)
        .ok_or_else(|| RepoError::MissingForeignKey(target.table_name.to_owned()))
}

fn json_object<'a>(
    target: &ModelDescriptor,
    fields: impl IntoIterator<Item = &'a str>,
    alias: &str,
) -> String {
    let table = target.table_name;
    let pairs: Vec<String> = fields
        .into_iter()
        .map(|field| format!("'{field}', {table}.{field}"))
        .collect();
    format!("JSON_OBJECT({}) AS {alias}", pairs.join(", "))
}

/// Splits `NAME(arg)` into its parts.
fn function_call(selection: &str) -> Option<(&str, &str)> {
    let (name, rest) = selection.split_once('(')?;
    let arg = rest.strip_suffix(')')?;
    Some((name.trim(), arg.trim()))
}

fn aggregate(descriptor: &ModelDescriptor, selection: &str) -> Result<String> {
    let invalid = || RepoError::InvalidField {
        field: selection.to_owned(),
        table: descriptor.table_name.to_owned(),
    };
    let (name, arg) = function_call(selection).ok_or_else(invalid)?;
    if !FUNCTIONS.contains(&name) {
        return Err(invalid());
    }
    let arg = if arg == "*" {
        "*".to_owned()
    } else if descriptor.has_column(arg) {
        format!("{}.{arg}", descriptor.table_name)
    } else {
        return Err(invalid());
    };
    Ok(format!("{name}({arg}) AS {}", name.to_ascii_lowercase()))
}

fn select_list(descriptor: &ModelDescriptor, query: &SelectQuery) -> Result<Vec<String>> {
    let table = descriptor.table_name;
    let mut out = Vec::with_capacity(query.select.len().max(1 + query.joins.len()));

    if query.select.is_empty() {
        out.push(format!("{table}.*"));
        for target in &query.joins {
            let fk = foreign_key(descriptor, target)?;
            out.push(json_object(target, target.columns(), fk.join_result_name()));
        }
        return Ok(out);
    }

    for selection in &query.select {
        match selection {
            Selection::Column(name) if descriptor.has_column(name) => {
                out.push(format!("{table}.{name}"));
            }
            Selection::Column(name) => out.push(aggregate(descriptor, name)?),
            Selection::Joined {
                table: joined,
                fields,
            } => {
                let target = query
                    .joins
                    .iter()
                    .find(|j| j.table_name == joined.as_str())
                    .ok_or_else(|| RepoError::InvalidSelectTable(joined.clone()))?;
                if let Some(field) = fields.iter().find(|f| !target.has_column(f)) {
                    return Err(RepoError::InvalidField {
                        field: field.clone(),
                        table: target.table_name.to_owned(),
                    });
                }
                let fk = foreign_key(descriptor, target)?;
                let alias = fk.join_result_name();
                if fields.is_empty() {
                    out.push(json_object(target, target.columns(), alias));
                } else {
                    out.push(json_object(target, fields.iter().map(String::as_str), alias));
                }
            }
        }
    }
    Ok(out)
}

/// Builds a SELECT for `descriptor`'s table.
///
/// ```text
/// SELECT bookings.*, JSON_OBJECT('user_id', users.user_id, ...) AS user
/// FROM bookings JOIN users ON bookings.user_id = users.user_id
/// WHERE bookings.status = :__value0 ORDER BY bookings.created_at DESC
/// LIMIT :__limit OFFSET :__offset
/// ```
pub fn build_select(descriptor: &ModelDescriptor, query: &SelectQuery) -> Result<CompiledQuery> {
    let table = descriptor.table_name;
    let mut params = Params::new();

    let mut sql = format!(
        "SELECT {} FROM {table}",
        select_list(descriptor, query)?.join(", ")
    );

    for target in &query.joins {
        let fk = foreign_key(descriptor, target)?;
        sql.push_str(&format!(
            " JOIN {target_table} ON {table}.{fk_column} = {target_table}.{pk}",
            target_table = target.table_name,
            fk_column = fk.column,
            pk = target.primary_key_column(),
        ));
    }

    if !query.filter.is_empty() {
        let allowed = descriptor.fields_of();
        let filter = query.filter.compile(table, &allowed)?;
        if !filter.sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter.sql);
            params.extend(filter.params);
        }
    }

    if !query.order_by.is_empty() {
        let mut items = Vec::with_capacity(query.order_by.len());
        for order in &query.order_by {
            if !descriptor.has_column(&order.column) {
                return Err(RepoError::InvalidOrderColumn(order.column.clone()));
            }
            let direction = Direction::parse(&order.direction)?;
            items.push(format!("{table}.{} {}", order.column, direction.as_str()));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&items.join(", "));
    }

    // Both dialects require LIMIT before OFFSET.
    let limit = match (query.limit, query.offset) {
        (None, Some(_)) => Some(UNBOUNDED_LIMIT),
        (limit, _) => limit,
    };
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ");
        sql.push_str(LIMIT_PLACEHOLDER);
        params.push(LIMIT_PLACEHOLDER, Value::Integer(limit));
    }
    if let Some(offset) = query.offset {
        sql.push_str(" OFFSET ");
        sql.push_str(OFFSET_PLACEHOLDER);
        params.push(OFFSET_PLACEHOLDER, Value::Integer(offset));
    }

    Ok(CompiledQuery::new(sql, params))
}

/// `INSERT INTO table (cols) VALUES (:cols) RETURNING pk`.
///
/// `fields` are column-keyed, already encoded values. Columns the descriptor
/// does not persist are rejected.
pub fn build_insert(
    descriptor: &ModelDescriptor,
    fields: &[(&str, Value)],
) -> Result<CompiledQuery> {
    let mut columns = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    let mut params = Params::new();
    for (column, value) in fields {
        check_column(descriptor, column)?;
        let placeholder = format!(":{column}");
        columns.push(*column);
        placeholders.push(placeholder.clone());
        params.push(placeholder, value.clone());
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        descriptor.table_name,
        columns.join(", "),
        placeholders.join(", "),
        descriptor.primary_key_column(),
    );
    Ok(CompiledQuery::new(sql, params))
}

/// `UPDATE table SET col = :col, ... WHERE pk = :__id`.
///
/// The primary key is never part of the SET list.
pub fn build_update(
    descriptor: &ModelDescriptor,
    fields: &[(&str, Value)],
    id: Value,
) -> Result<CompiledQuery> {
    let pk = descriptor.primary_key_column();
    let mut assignments = Vec::with_capacity(fields.len());
    let mut params = Params::new();
    for (column, value) in fields.iter().filter(|(column, _)| *column != pk) {
        check_column(descriptor, column)?;
        let placeholder = format!(":{column}");
        assignments.push(format!("{column} = {placeholder}"));
        params.push(placeholder, value.clone());
    }
    if assignments.is_empty() {
        return Err(RepoError::NoFields(descriptor.table_name));
    }
    params.push(ID_PLACEHOLDER, id);
    let sql = format!(
        "UPDATE {} SET {} WHERE {pk} = {ID_PLACEHOLDER}",
        descriptor.table_name,
        assignments.join(", "),
    );
    Ok(CompiledQuery::new(sql, params))
}

/// `DELETE FROM table WHERE pk = :__id`.
pub fn build_delete_by_id(descriptor: &ModelDescriptor, id: Value) -> CompiledQuery {
    let mut params = Params::new();
    params.push(ID_PLACEHOLDER, id);
    CompiledQuery::new(
        format!(
            "DELETE FROM {} WHERE {} = {ID_PLACEHOLDER}",
            descriptor.table_name,
            descriptor.primary_key_column()
        ),
        params,
    )
}

/// DELETE restricted by `filter`. A filter that yields no condition is
/// refused with [`RepoError::EmptyFilter`]; there is no unrestricted delete.
pub fn build_delete_where(descriptor: &ModelDescriptor, filter: &Filter) -> Result<CompiledQuery> {
    if filter.is_empty() {
        return Err(RepoError::EmptyFilter);
    }
    let allowed = descriptor.fields_of();
    let compiled = filter.compile(descriptor.table_name, &allowed)?;
    if compiled.sql.is_empty() {
        return Err(RepoError::EmptyFilter);
    }
    Ok(CompiledQuery::new(
        format!("DELETE FROM {} WHERE {}", descriptor.table_name, compiled.sql),
        compiled.params,
    ))
}

fn check_column(descriptor: &ModelDescriptor, column: &str) -> Result<()> {
    if descriptor.has_column(column) {
        Ok(())
    } else {
        Err(RepoError::InvalidField {
            field: column.to_owned(),
            table: descriptor.table_name.to_owned(),
        })
    }
}
