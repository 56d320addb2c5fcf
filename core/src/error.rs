use thiserror::Error;

/// Classification of a database-side failure.
///
/// Callers branch on [`DbErrorKind::MissingRelation`] to tell a schema problem
/// (unknown table or column) apart from every other query failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// The referenced table or column does not exist
    MissingRelation,
    /// Malformed SQL
    Syntax,
    /// Constraint violation (unique, foreign key, not null, ...)
    Constraint,
    /// The connection could not be established or was lost
    Connection,
    /// A stored value could not be read back
    Decode,
    /// Anything else the driver reported
    Other,
}

/// An error reported by a database driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DbError {
    pub kind: DbErrorKind,
    /// SQLSTATE or driver specific code, when the driver reports one
    pub code: Option<String>,
    pub message: String,
}

impl DbError {
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Builds an error from a MySQL SQLSTATE code.
    ///
    /// `42S02` (unknown table) and `42S22` (unknown column) map to
    /// [`DbErrorKind::MissingRelation`].
    pub fn from_sqlstate(code: &str, message: impl Into<String>) -> Self {
        let kind = match code {
            "42S02" | "42S22" => DbErrorKind::MissingRelation,
            "42000" => DbErrorKind::Syntax,
            c if c.starts_with("23") => DbErrorKind::Constraint,
            c if c.starts_with("08") => DbErrorKind::Connection,
            _ => DbErrorKind::Other,
        };
        Self::new(kind, message).with_code(code)
    }

    #[inline]
    pub fn is_missing_relation(&self) -> bool {
        self.kind == DbErrorKind::MissingRelation
    }
}

/// A stored value could not be turned into the field's Rust type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unexpected NULL")]
    UnexpectedNull,

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Attaches the name of the field being decoded.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    /// Filter references a column the model does not persist
    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    /// Filter uses an operator outside the allowed set
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid order column: {0}")]
    InvalidOrderColumn(String),

    #[error("Invalid order direction: {0}")]
    InvalidOrderDirection(String),

    /// Joined selection names a table that is not part of the join list
    #[error("Invalid select table: {0}")]
    InvalidSelectTable(String),

    #[error("Invalid field: {field} for table: {table}")]
    InvalidField { field: String, table: String },

    #[error("No foreign key found for table: {0}")]
    MissingForeignKey(String),

    /// Delete-by-filter called without a filter
    #[error("No where clause provided.")]
    EmptyFilter,

    /// Wire-shaped filter input that is not a filter expression
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("No fields to write for table: {0}")]
    NoFields(&'static str),

    #[error("No object found for model '{table}' with {column} = {value}")]
    RelatedNotFound {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Error selecting data: {0}")]
    Database(DbError),

    #[error("Database server not accessible: {0}")]
    Connection(DbError),
}

impl RepoError {
    /// True for errors raised while compiling a query, before any SQL runs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidColumn(_)
                | Self::InvalidOperator(_)
                | Self::InvalidOrderColumn(_)
                | Self::InvalidOrderDirection(_)
                | Self::InvalidSelectTable(_)
                | Self::InvalidField { .. }
                | Self::MissingForeignKey(_)
                | Self::EmptyFilter
                | Self::InvalidFilter(_)
                | Self::NoFields(_)
        )
    }
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;
