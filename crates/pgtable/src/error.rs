//! Error types for pgtable

use thiserror::Error;

/// Result type alias for pgtable operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Per-value validation failures.
///
/// These are raised before a value is bound to a statement, so nothing that
/// fails validation is ever sent to the database.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A NULL was given for a NOT NULL column.
    #[error("column '{column}' violates NOT NULL constraint")]
    NotNull { column: String },

    /// A numeric value outside the column type's bounds.
    #[error("value {value} for column '{column}' is out of range for {sql_type} ({min} .. {max})")]
    OutOfRange {
        column: String,
        sql_type: String,
        value: String,
        min: String,
        max: String,
    },

    /// A value that cannot be converted to the column type.
    #[error("invalid value for column '{column}' of type {sql_type}: {value}")]
    InvalidType {
        column: String,
        sql_type: String,
        value: String,
    },
}

/// Error types for query construction and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Invalid declaration or query shape, detected before anything is rendered
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Value rejected by a column
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Value has no representation in the target type
    #[error("Conversion error: cannot convert {value} to {sql_type}")]
    Conversion { sql_type: String, value: String },

    /// Reference to a table or column that is not available
    #[error("Reference error: {0}")]
    Reference(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {}", query_message(.0))]
    Query(#[from] tokio_postgres::Error),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

/// The driver error, followed by the server message and SQLSTATE when the
/// server rejected the statement.
fn query_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => format!("{err}: {} ({})", db.message(), db.code().code()),
        None => err.to_string(),
    }
}

impl OrmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a reference error
    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a conversion error
    pub fn conversion(sql_type: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::Conversion {
            sql_type: sql_type.into(),
            value: value.to_string(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Check if this is a reference error
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}
