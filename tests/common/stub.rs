//! In-memory connector that records statements instead of running them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use datarepo::core::error::{DbError, DbErrorKind};
use datarepo::core::model::Row;
use datarepo::core::sql::CompiledQuery;
use datarepo::{Connection, Connector};

#[derive(Debug, Default, Clone)]
pub struct StubConnector {
    pub connects: Arc<AtomicUsize>,
    pub statements: Arc<Mutex<Vec<String>>>,
    /// Refuse every connection
    pub refuse: bool,
    /// Fail any statement containing one of these texts
    pub fail_on: Vec<String>,
}

impl StubConnector {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn failing_on(text: &str) -> Self {
        Self::default().and_failing_on(text)
    }

    pub fn and_failing_on(mut self, text: &str) -> Self {
        self.fail_on.push(text.to_owned());
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().expect("statement log").clone()
    }
}

impl Connector for StubConnector {
    type Connection = StubConnection;

    fn connect(&self) -> Result<StubConnection, DbError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(DbError::new(DbErrorKind::Connection, "connection refused"));
        }
        Ok(StubConnection {
            statements: Arc::clone(&self.statements),
            fail_on: self.fail_on.clone(),
        })
    }
}

pub struct StubConnection {
    statements: Arc<Mutex<Vec<String>>>,
    fail_on: Vec<String>,
}

impl StubConnection {
    fn record(&self, sql: &str) -> Result<(), DbError> {
        self.statements
            .lock()
            .expect("statement log")
            .push(sql.to_owned());
        if self.fail_on.iter().any(|text| sql.contains(text.as_str())) {
            return Err(DbError::new(DbErrorKind::Constraint, format!("stub failure: {sql}")));
        }
        Ok(())
    }
}

impl Connection for StubConnection {
    fn query(&mut self, query: &CompiledQuery) -> Result<Vec<Row>, DbError> {
        self.record(&query.sql)?;
        Ok(Vec::new())
    }

    fn execute(&mut self, query: &CompiledQuery) -> Result<u64, DbError> {
        self.record(&query.sql)?;
        Ok(1)
    }
}
