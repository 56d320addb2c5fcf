//! The driver seam: how the repository reaches a database.

use std::fmt;

use datarepo_core::error::DbError;
use datarepo_core::model::Row;
use datarepo_core::sql::{CompiledQuery, Params};

/// A live database connection.
///
/// Statements arrive as SQL text with named `:placeholder` parameters.
pub trait Connection {
    /// Runs a statement that returns rows, keyed by column name or alias.
    fn query(&mut self, query: &CompiledQuery) -> Result<Vec<Row>, DbError>;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&mut self, query: &CompiledQuery) -> Result<u64, DbError>;

    fn begin(&mut self) -> Result<(), DbError> {
        self.execute(&CompiledQuery::new("BEGIN", Params::new()))
            .map(|_| ())
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.execute(&CompiledQuery::new("COMMIT", Params::new()))
            .map(|_| ())
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.execute(&CompiledQuery::new("ROLLBACK", Params::new()))
            .map(|_| ())
    }
}

/// Opens connections. The repository asks for a new one per operation and
/// drops it when the operation ends.
pub trait Connector {
    type Connection: Connection;

    fn connect(&self) -> Result<Self::Connection, DbError>;
}

type BeforeConnect = Box<dyn Fn() + Send + Sync>;
type ConnectError = Box<dyn Fn(&DbError) + Send + Sync>;

/// Callbacks run around connection acquisition. Both default to no-ops.
#[derive(Default)]
pub struct Hooks {
    on_before_connect: Option<BeforeConnect>,
    on_connect_error: Option<ConnectError>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs before every connection attempt.
    pub fn on_before_connect(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_before_connect = Some(Box::new(hook));
        self
    }

    /// Runs when a connection attempt fails.
    pub fn on_connect_error(mut self, hook: impl Fn(&DbError) + Send + Sync + 'static) -> Self {
        self.on_connect_error = Some(Box::new(hook));
        self
    }

    pub(crate) fn before_connect(&self) {
        if let Some(hook) = &self.on_before_connect {
            hook();
        }
    }

    pub(crate) fn connect_error(&self, err: &DbError) {
        if let Some(hook) = &self.on_connect_error {
            hook(err);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_before_connect", &self.on_before_connect.is_some())
            .field("on_connect_error", &self.on_connect_error.is_some())
            .finish()
    }
}
