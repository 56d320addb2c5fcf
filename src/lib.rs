//! # datarepo
//!
//! A descriptor-driven data-access layer: derive a table mapping for a
//! struct, then select, insert, update and delete instances with structured,
//! allow-listed filters.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datarepo::prelude::*;
//! use datarepo::RusqliteConnector;
//!
//! #[derive(Model, Debug, Default)]
//! #[model(table = "bookings", primary_key = "booking_id")]
//! struct Booking {
//!     booking_id: Option<i64>,
//!     event_id: i64,
//!     status: String,
//! }
//!
//! # fn main() -> datarepo::Result<()> {
//! let repo = DataRepo::new(RusqliteConnector::new("bookings.db"));
//!
//! let mut booking = Booking { event_id: 7, status: "pending".into(), ..Default::default() };
//! assert!(repo.insert(&mut booking));
//!
//! let pending = repo
//!     .select::<Booking>()
//!     .r#where(Filter::new().column("status", eq("pending")))
//!     .order_by("booking_id", "desc")
//!     .all()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Filters
//!
//! Filters are lists of column comparisons joined by `AND` (implicit) or by
//! explicit `AND`/`OR` markers, with no parenthesized grouping: nested groups
//! are inlined in order. See [`core::filter`].
//!
//! ## Errors
//!
//! Reads return [`Result`]. A missing table or column is `Ok(None)`; any
//! other database error is returned. Writes return `bool` and log failures
//! through `tracing` when the `tracing` feature is on.

extern crate self as datarepo;

pub mod config;
pub mod connection;
pub mod driver;
mod repo;

/// Result type for repository operations
pub use datarepo_core::error::Result;

/// Error types
pub mod error {
    pub use crate::config::ConfigError;
    pub use datarepo_core::error::{DbError, DbErrorKind, DecodeError, RepoError};
}

/// Descriptors, values, filters and statement builders.
pub use datarepo_core as core;

pub use datarepo_macros::Model;

pub use config::DatabaseConfig;
pub use connection::{Connection, Connector, Hooks};
pub use repo::{DataRepo, DataRepoBuilder, SelectBuilder};

#[cfg(feature = "rusqlite")]
pub use driver::rusqlite::{RusqliteConnection, RusqliteConnector};

pub mod prelude {
    pub use datarepo_core::prelude::*;
    pub use datarepo_macros::Model;

    pub use crate::connection::Connector;
    pub use crate::repo::DataRepo;
}
