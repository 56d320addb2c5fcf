//! Shipped [`Connector`](crate::connection::Connector) implementations.

#[cfg(feature = "rusqlite")]
pub mod rusqlite;
