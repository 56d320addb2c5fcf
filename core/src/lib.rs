//! Core of the `datarepo` data-access layer: model descriptors, the value
//! codec, the filter compiler and the statement builders.
//!
//! Nothing here talks to a database. The `datarepo` crate executes the
//! [`CompiledQuery`] values produced by this crate.

pub mod error;
pub mod filter;
pub mod model;
pub mod query;
pub mod sql;
pub mod tracing;
pub mod value;

pub use error::{DbError, DbErrorKind, DecodeError, RepoError, Result};
pub use filter::{Condition, Connective, Filter, Operator};
pub use model::{FieldSpec, MapKeys, Model, ModelDescriptor, Row};
pub use query::{OrderBy, SelectQuery, Selection};
pub use sql::{CompiledQuery, Param, Params};
pub use value::{FromValue, Json, ParamType, ToValue, Value};

pub mod prelude {
    pub use crate::error::{RepoError, Result};
    pub use crate::filter::{
        Condition, Filter, eq, ge, gt, le, like, lt, ne, not_eq, not_like,
    };
    pub use crate::model::{MapKeys, Model};
    pub use crate::query::{OrderBy, Selection};
    pub use crate::value::{Json, Value};
}
