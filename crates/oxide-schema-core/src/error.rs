//! Error types for schema definitions.

use crate::schema::ObjectType;

/// Errors raised while validating or rendering schema definitions.
///
/// Every variant is detected before any SQL reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    /// A table definition without columns cannot be rendered.
    #[error("Table '{0}' has no columns")]
    NoColumns(String),

    /// Two columns of one table share a name.
    #[error("Column '{column}' appears more than once in table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Duplicated column name.
        column: String,
    },

    /// An operation names a column the table does not have.
    #[error("Column '{column}' does not exist in table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Missing column name.
        column: String,
    },

    /// A row copy between two tables with different column counts.
    #[error(
        "Cannot copy {from_count} columns of '{from}' into {to_count} columns of '{to}'"
    )]
    ColumnCountMismatch {
        /// Source table.
        from: String,
        /// Source column count.
        from_count: usize,
        /// Destination table.
        to: String,
        /// Destination column count.
        to_count: usize,
    },

    /// Index names are limited to [`MAX_INDEX_NAME_LENGTH`](crate::schema::MAX_INDEX_NAME_LENGTH) characters.
    #[error("Index name '{name}' on table '{table}' is too long; the limit is {limit} characters")]
    IndexNameTooLong {
        /// Offending index name.
        name: String,
        /// Indexed table.
        table: String,
        /// Maximum allowed length.
        limit: usize,
    },

    /// A column that cannot be added with `ALTER TABLE ... ADD COLUMN`.
    #[error("Invalid definition for column '{column}': {reason}")]
    InvalidColumn {
        /// Column name.
        column: String,
        /// Why the column was rejected.
        reason: InvalidColumnReason,
    },

    /// A version string that is not `major.minor.patch`.
    #[error("Invalid SQLite version string '{0}'")]
    InvalidVersion(String),

    /// The table uses something a rebuild cannot carry over.
    #[error("Table '{table}' cannot be rebuilt: {feature}")]
    Unsupported {
        /// Table name.
        table: String,
        /// What the rebuild would lose.
        feature: UnsupportedFeature,
    },

    /// A view or trigger uses a column that a rebuild would drop or rename.
    #[error("Cannot change column '{column}' of table '{table}': {kind} '{object}' uses it")]
    DependentObject {
        /// Table name.
        table: String,
        /// Column being dropped or renamed.
        column: String,
        /// Kind of the dependent object.
        kind: ObjectType,
        /// Name of the dependent object.
        object: String,
    },
}

/// Table features a rebuild refuses to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedFeature {
    /// `STRICT` tables.
    #[error("STRICT tables are not supported")]
    Strict,
    /// Generated columns; `PRAGMA table_info` does not list them.
    #[error("generated columns are not supported")]
    GeneratedColumn,
    /// `DEFAULT (expr)`.
    #[error("expression defaults are not supported")]
    ExpressionDefault,
    /// `FOREIGN KEY (a, b) REFERENCES ...`.
    #[error("foreign keys over several columns are not supported")]
    CompositeForeignKey,
    /// `ON CONFLICT` on a `UNIQUE` or `NOT NULL` constraint.
    #[error("ON CONFLICT on UNIQUE or NOT NULL constraints is not supported")]
    ConflictClause,
    /// The stored `CREATE` text of the table or one of its indexes.
    #[error("its stored definition could not be parsed")]
    UnparseableDefinition,
}

/// Reasons an added column is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidColumnReason {
    /// The column declares a primary key.
    #[error("an added column cannot be a primary key")]
    PrimaryKey,
    /// The default is `CURRENT_TIME`, `CURRENT_DATE` or `CURRENT_TIMESTAMP`.
    #[error("an added column cannot default to the current time, date or timestamp")]
    NonConstantDefault,
    /// `NOT NULL` with a `NULL` default.
    #[error("an added NOT NULL column needs a non-NULL default")]
    NotNullWithNullDefault,
}

/// Result type for definition operations.
pub type Result<T> = std::result::Result<T, DefinitionError>;
