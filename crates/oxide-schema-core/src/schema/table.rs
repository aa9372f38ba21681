//! Table definitions and the pure transforms that compute rebuild targets.

use std::collections::HashSet;

use super::{expression, quote_identifier, ColumnDefinition, IndexDefinition};
use crate::error::{DefinitionError, Result};
use crate::operation::AlterOperation;

/// Definition of a table: its columns, its table constraints and its
/// explicitly created indexes.
///
/// Definitions are values. Every transform returns a new definition and
/// leaves `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Columns, in declaration order.
    pub columns: Vec<ColumnDefinition>,
    /// Indexes, excluding the engine's automatic ones.
    pub indexes: Vec<IndexDefinition>,
    /// `UNIQUE (...)` constraints over more than one column.
    pub unique_constraints: Vec<Vec<String>>,
    /// `CHECK` expressions, rendered as table constraints.
    pub checks: Vec<String>,
    /// Order of a composite primary key when it differs from declaration
    /// order; empty otherwise.
    pub key_order: Vec<String>,
    /// `WITHOUT ROWID`.
    pub without_rowid: bool,
}

impl TableDefinition {
    /// Creates a new table definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDefinition>,
        indexes: Vec<IndexDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes,
            unique_constraints: Vec::new(),
            checks: Vec::new(),
            key_order: Vec::new(),
            without_rowid: false,
        }
    }

    /// Adds a `UNIQUE` constraint over `columns`.
    #[must_use]
    pub fn unique_constraint<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_constraints
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a `CHECK` constraint.
    #[must_use]
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.checks.push(expression.into());
        self
    }

    /// Orders the columns of a composite primary key.
    #[must_use]
    pub fn key_order<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_order = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Makes this a `WITHOUT ROWID` table.
    #[must_use]
    pub const fn without_rowid(mut self) -> Self {
        self.without_rowid = true;
        self
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if the table has a column named `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns the columns that make up the primary key.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.primary_key.is_some())
    }

    /// Checks column names for duplicates and index names for length.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::DuplicateColumn`] or
    /// [`DefinitionError::IndexNameTooLong`].
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DefinitionError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        self.indexes.iter().try_for_each(IndexDefinition::validate)
    }

    /// Renders the `CREATE TABLE` statement.
    ///
    /// A key spanning several columns is rendered as a table constraint,
    /// followed by the `UNIQUE` and `CHECK` constraints.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::NoColumns`] for a table without columns.
    pub fn to_sql(&self, if_not_exists: bool) -> Result<String> {
        if self.columns.is_empty() {
            return Err(DefinitionError::NoColumns(self.name.clone()));
        }

        let key_columns: Vec<&ColumnDefinition> = self.primary_key_columns().collect();
        let composite = key_columns.len() > 1;

        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| c.render(!composite))
            .collect();

        if composite {
            let names: Vec<String> = if self.key_order.is_empty() {
                key_columns.iter().map(|c| quote_identifier(&c.name)).collect()
            } else {
                self.key_order.iter().map(|c| quote_identifier(c)).collect()
            };
            let mut constraint = format!("PRIMARY KEY ({})", names.join(", "));
            if let Some(policy) = key_columns
                .iter()
                .find_map(|c| c.primary_key.and_then(|pk| pk.on_conflict))
            {
                constraint.push_str(" ON CONFLICT ");
                constraint.push_str(policy.as_str());
            }
            parts.push(constraint);
        }

        for columns in &self.unique_constraints {
            let names: Vec<String> = columns.iter().map(|c| quote_identifier(c)).collect();
            parts.push(format!("UNIQUE ({})", names.join(", ")));
        }
        for check in &self.checks {
            parts.push(format!("CHECK ({check})"));
        }

        let mut sql = String::from("CREATE TABLE ");
        if if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&quote_identifier(&self.name));
        sql.push_str(" (");
        sql.push_str(&parts.join(", "));
        sql.push(')');
        if self.without_rowid {
            sql.push_str(" WITHOUT ROWID");
        }
        Ok(sql)
    }

    /// Renders `DROP TABLE [IF EXISTS] "name"`.
    #[must_use]
    pub fn drop_sql(&self, if_exists: bool) -> String {
        drop_table_sql(&self.name, if_exists)
    }

    /// Quoted, comma-separated column names.
    #[must_use]
    pub fn quoted_column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders the statement copying every row of `self` into `to`.
    ///
    /// Columns are matched by position.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::ColumnCountMismatch`] when the two tables
    /// have a different number of columns.
    pub fn copy_sql(&self, to: &Self) -> Result<String> {
        if self.columns.len() != to.columns.len() {
            return Err(DefinitionError::ColumnCountMismatch {
                from: self.name.clone(),
                from_count: self.columns.len(),
                to: to.name.clone(),
                to_count: to.columns.len(),
            });
        }
        Ok(format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            quote_identifier(&to.name),
            to.quoted_column_list(),
            self.quoted_column_list(),
            quote_identifier(&self.name)
        ))
    }

    /// Returns a copy named `to`, with every index moved along.
    #[must_use]
    pub fn rename_table(&self, to: &str) -> Self {
        Self {
            name: to.to_string(),
            indexes: self.indexes.iter().map(|i| i.rename_table(to)).collect(),
            ..self.clone()
        }
    }

    /// Returns a copy with column `from` renamed to `to` in the column
    /// list, the table constraints and every index.
    #[must_use]
    pub fn rename_column(&self, from: &str, to: &str) -> Self {
        let rename = |column: &String| {
            if column == from {
                to.to_string()
            } else {
                column.clone()
            }
        };

        Self {
            name: self.name.clone(),
            columns: self.columns.iter().map(|c| c.rename(from, to)).collect(),
            indexes: self
                .indexes
                .iter()
                .map(|i| i.rename_column(from, to))
                .collect(),
            unique_constraints: self
                .unique_constraints
                .iter()
                .map(|columns| columns.iter().map(rename).collect())
                .collect(),
            checks: self
                .checks
                .iter()
                .map(|check| expression::rename_column(check, from, to))
                .collect(),
            key_order: self.key_order.iter().map(rename).collect(),
            without_rowid: self.without_rowid,
        }
    }

    /// Returns a copy without column `name`, and without the indexes and
    /// table constraints that use it.
    #[must_use]
    pub fn drop_column(&self, name: &str) -> Self {
        Self {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .filter(|c| c.name != name)
                .cloned()
                .collect(),
            indexes: self
                .indexes
                .iter()
                .filter(|i| !i.references_column(name))
                .cloned()
                .collect(),
            unique_constraints: self
                .unique_constraints
                .iter()
                .filter(|columns| !columns.iter().any(|c| c == name))
                .cloned()
                .collect(),
            checks: self
                .checks
                .iter()
                .filter(|check| !expression::mentions_column(check, name))
                .cloned()
                .collect(),
            key_order: self
                .key_order
                .iter()
                .filter(|c| *c != name)
                .cloned()
                .collect(),
            without_rowid: self.without_rowid,
        }
    }

    /// Returns a copy with a column appended.
    #[must_use]
    pub fn add_column(&self, column: ColumnDefinition) -> Self {
        let mut table = self.clone();
        table.columns.push(column);
        table
    }

    /// Applies one alter operation.
    #[must_use]
    pub fn apply(&self, operation: &AlterOperation) -> Self {
        match operation {
            AlterOperation::AddColumn(column) => self.add_column(column.clone()),
            AlterOperation::DropColumn(name) => self.drop_column(name),
            AlterOperation::RenameColumn { from, to } => self.rename_column(from, to),
        }
    }
}

/// Renders `DROP TABLE [IF EXISTS] "table"`.
#[must_use]
pub fn drop_table_sql(table: &str, if_exists: bool) -> String {
    if if_exists {
        format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
    } else {
        format!("DROP TABLE {}", quote_identifier(table))
    }
}

/// Renders `ALTER TABLE "table" RENAME TO "to"`.
#[must_use]
pub fn rename_table_sql(table: &str, to: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {}",
        quote_identifier(table),
        quote_identifier(to)
    )
}
