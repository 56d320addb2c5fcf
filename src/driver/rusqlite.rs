//! Synchronous SQLite driver built on `rusqlite`.
//!
//! SQLite accepts the generated SQL as is: `JSON_OBJECT(...)`, `:name`
//! parameters, `RETURNING` and bound `LIMIT`/`OFFSET`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::rusqlite::types::{ToSql, Value as SqlValue, ValueRef};
use ::rusqlite::{ErrorCode, OpenFlags};

use datarepo_core::error::{DbError, DbErrorKind, DecodeError};
use datarepo_core::model::Row;
use datarepo_core::sql::{CompiledQuery, Params};
use datarepo_core::value::Value;

use crate::config::DatabaseConfig;
use crate::connection::{Connection, Connector};

/// Opens a `rusqlite` connection to one database file per call.
#[derive(Debug, Clone)]
pub struct RusqliteConnector {
    path: PathBuf,
    flags: OpenFlags,
    busy_timeout: Option<Duration>,
    foreign_keys: bool,
}

impl RusqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: OpenFlags::default(),
            busy_timeout: None,
            foreign_keys: true,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            flags: OpenFlags::default(),
            busy_timeout: config.busy_timeout(),
            foreign_keys: config.foreign_keys,
        }
    }

    /// Fails to connect instead of creating a missing database file.
    pub fn existing_only(mut self) -> Self {
        self.flags.remove(OpenFlags::SQLITE_OPEN_CREATE);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// `PRAGMA foreign_keys`, on by default.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connector for RusqliteConnector {
    type Connection = RusqliteConnection;

    fn connect(&self) -> Result<RusqliteConnection, DbError> {
        let conn = ::rusqlite::Connection::open_with_flags(&self.path, self.flags)
            .map_err(connect_error)?;
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout).map_err(connect_error)?;
        }
        conn.pragma_update(None, "foreign_keys", self.foreign_keys)
            .map_err(connect_error)?;
        Ok(RusqliteConnection { conn })
    }
}

/// A connection handed out by [`RusqliteConnector`].
#[derive(Debug)]
pub struct RusqliteConnection {
    conn: ::rusqlite::Connection,
}

impl RusqliteConnection {
    pub fn conn(&self) -> &::rusqlite::Connection {
        &self.conn
    }
}

impl Connection for RusqliteConnection {
    fn query(&mut self, query: &CompiledQuery) -> Result<Vec<Row>, DbError> {
        let values = bind_values(&query.params);
        let named = named_params(&values);

        let mut stmt = self.conn.prepare(&query.sql).map_err(db_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(named.as_slice()).map_err(db_error)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(db_error)? {
            let mut decoded = Row::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(db_error)?;
                let value = from_sql(value).map_err(|err| decode_error(err.in_field(name)))?;
                decoded.insert(name.clone(), value);
            }
            out.push(decoded);
        }
        Ok(out)
    }

    fn execute(&mut self, query: &CompiledQuery) -> Result<u64, DbError> {
        let values = bind_values(&query.params);
        let named = named_params(&values);

        let mut stmt = self.conn.prepare(&query.sql).map_err(db_error)?;
        let affected = stmt.execute(named.as_slice()).map_err(db_error)?;
        Ok(affected as u64)
    }
}

fn bind_values(params: &Params) -> Vec<(&str, SqlValue)> {
    params
        .iter()
        .map(|param| (param.name.as_str(), to_sql(&param.value)))
        .collect()
}

fn named_params<'a>(values: &'a [(&'a str, SqlValue)]) -> Vec<(&'a str, &'a dyn ToSql)> {
    values
        .iter()
        .map(|(name, value)| (*name, value as &dyn ToSql))
        .collect()
}

/// Storage form of a value for SQLite; booleans are stored as 0/1.
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Json(j) => SqlValue::Text(j.to_string()),
    }
}

/// Reads a stored value. Text and blobs must hold valid UTF-8.
pub fn from_sql(value: ValueRef<'_>) -> Result<Value, DecodeError> {
    let (bytes, found) = match value {
        ValueRef::Null => return Ok(Value::Null),
        ValueRef::Integer(i) => return Ok(Value::Integer(i)),
        ValueRef::Real(r) => return Ok(Value::Real(r)),
        ValueRef::Text(bytes) => (bytes, "text"),
        ValueRef::Blob(bytes) => (bytes, "blob"),
    };
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Value::Text(text.to_owned())),
        Err(_) => Err(DecodeError::TypeMismatch {
            expected: "utf-8 text",
            found,
        }),
    }
}

fn decode_error(err: DecodeError) -> DbError {
    DbError::new(DbErrorKind::Decode, err.to_string())
}

fn connect_error(err: ::rusqlite::Error) -> DbError {
    let classified = db_error(err);
    DbError {
        kind: DbErrorKind::Connection,
        ..classified
    }
}

/// Classifies a `rusqlite` error.
///
/// SQLite reports unknown tables and columns only through the message text
/// (`no such table: x`, `no such column: y`).
pub fn db_error(err: ::rusqlite::Error) -> DbError {
    let message = err.to_string();
    let code = err.sqlite_error().map(|e| e.extended_code);

    let kind = if message.contains("no such table") || message.contains("no such column") {
        DbErrorKind::MissingRelation
    } else if message.contains("syntax error") {
        DbErrorKind::Syntax
    } else {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => DbErrorKind::Constraint,
            Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::DatabaseBusy) => {
                DbErrorKind::Connection
            }
            _ => DbErrorKind::Other,
        }
    };

    let error = DbError::new(kind, message);
    match code {
        Some(code) => error.with_code(code.to_string()),
        None => error,
    }
}
