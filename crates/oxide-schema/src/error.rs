//! Error types for schema reading and changing.

use oxide_schema_core::DefinitionError;

use crate::pragma::ForeignKeyViolation;

/// Errors that can occur while reading or changing a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The requested change is invalid. Raised before any SQL runs.
    #[error("Invalid definition: {0}")]
    Definition(#[from] DefinitionError),

    /// Database error, passed through from the engine.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The table does not exist.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A rebuild left rows with dangling references; it was rolled back.
    #[error("Foreign key check failed:\n{}", .0.iter().map(|v| format!("  - {v}")).collect::<Vec<_>>().join("\n"))]
    ForeignKeyViolations(Vec<ForeignKeyViolation>),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
