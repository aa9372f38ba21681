//! Alter-table operations and native-statement dispatch.

use std::fmt;

use crate::error::{DefinitionError, InvalidColumnReason, Result};
use crate::schema::{quote_identifier, ColumnDefinition};
use crate::version::{Capability, SqliteVersion};

/// One change requested against a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOperation {
    /// Append a column.
    AddColumn(ColumnDefinition),
    /// Remove a column.
    DropColumn(String),
    /// Rename a column.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
}

impl AlterOperation {
    /// Returns the single statement performing this operation on `version`,
    /// or `None` when the table has to be rebuilt instead.
    #[must_use]
    pub fn native_sql(&self, table: &str, version: SqliteVersion) -> Option<String> {
        let table = quote_identifier(table);
        match self {
            Self::AddColumn(column) => {
                Some(format!("ALTER TABLE {table} ADD COLUMN {}", column.to_sql()))
            }
            Self::RenameColumn { from, to } => version
                .supports(Capability::RenameColumn)
                .then(|| {
                    format!(
                        "ALTER TABLE {table} RENAME COLUMN {} TO {}",
                        quote_identifier(from),
                        quote_identifier(to)
                    )
                }),
            Self::DropColumn(name) => version
                .supports(Capability::DropColumn)
                .then(|| format!("ALTER TABLE {table} DROP COLUMN {}", quote_identifier(name))),
        }
    }

    /// Rejects added columns that `ALTER TABLE ... ADD COLUMN` cannot take.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidColumn`] when an added column is a
    /// primary key, defaults to the current time, date or timestamp, or is
    /// `NOT NULL` with a `NULL` default.
    pub fn validate(&self) -> Result<()> {
        let Self::AddColumn(column) = self else {
            return Ok(());
        };

        let reason = if column.primary_key.is_some() {
            Some(InvalidColumnReason::PrimaryKey)
        } else if column.default_value.is_current_time() {
            Some(InvalidColumnReason::NonConstantDefault)
        } else if !column.nullable && column.default_value.is_null() {
            Some(InvalidColumnReason::NotNullWithNullDefault)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(DefinitionError::InvalidColumn {
                column: column.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for AlterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddColumn(column) => write!(f, "add column {}", column.name),
            Self::DropColumn(name) => write!(f, "drop column {name}"),
            Self::RenameColumn { from, to } => write!(f, "rename column {from} to {to}"),
        }
    }
}
