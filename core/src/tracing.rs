//! Structured log events for repository operations.
//!
//! Every event carries the table it concerns. The macros expand to `tracing`
//! events when the calling crate enables its `tracing` feature and to nothing
//! otherwise, so call sites need no `#[cfg]`.

/// Debug-level event for a statement about to run against `table`.
///
/// ```ignore
/// datarepo_trace_query!("select", descriptor.table_name, &query);
/// ```
#[macro_export]
macro_rules! datarepo_trace_query {
    ($op:literal, $table:expr, $query:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            op = $op,
            table = %$table,
            sql = %$query.sql,
            params = $query.params.len(),
            "datarepo.query"
        );
    };
}

/// Info-level event for the delete batch transaction (begin, commit,
/// rollback) and the number of rows in the batch.
///
/// ```ignore
/// datarepo_trace_tx!("rollback", "bookings", models.len());
/// ```
#[macro_export]
macro_rules! datarepo_trace_tx {
    ($event:literal, $table:expr, $batch:expr) => {
        #[cfg(feature = "tracing")]
        tracing::info!(event = $event, table = %$table, batch = $batch, "datarepo.transaction");
    };
}

/// Emit an error-level event for a failure the repository absorbs instead of
/// returning.
///
/// ```ignore
/// datarepo_log_error!("insert", descriptor.table_name, &err);
/// ```
#[macro_export]
macro_rules! datarepo_log_error {
    ($op:literal, $table:expr, $err:expr) => {
        #[cfg(feature = "tracing")]
        tracing::error!(op = $op, table = %$table, error = %$err, "datarepo.error");
    };
}

/// Emit a warn-level event; used where a failure maps onto a sentinel value.
#[macro_export]
macro_rules! datarepo_log_warn {
    ($op:literal, $table:expr, $err:expr) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(op = $op, table = %$table, error = %$err, "datarepo.warn");
    };
}
