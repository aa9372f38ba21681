//! Syntax trees for stored `CREATE TABLE` and `CREATE INDEX` statements.
//!
//! Expressions (`CHECK`, `DEFAULT (...)`, generated columns, index
//! expressions and predicates) are not modelled; they are kept as the
//! exact source text they were written with.

use crate::error::UnsupportedFeature;
use crate::schema::{ForeignKeyAction, OnConflict, PrimaryKey, SortOrder};

/// `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    /// `TEMP` or `TEMPORARY`.
    pub temporary: bool,
    /// `IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Schema qualifier (`main`, `temp`, an attached name).
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Column definitions.
    pub columns: Vec<ColumnClause>,
    /// Table constraints.
    pub constraints: Vec<TableConstraint>,
    /// `WITHOUT ROWID`.
    pub without_rowid: bool,
    /// `STRICT`.
    pub strict: bool,
}

impl CreateTableStatement {
    /// Looks up a column definition by name (case-insensitive, as SQLite
    /// resolves column names).
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnClause> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Primary-key modifiers applying to `column`.
    ///
    /// A column-level `PRIMARY KEY` clause wins. Otherwise a table-level
    /// `PRIMARY KEY (...)` constraint listing the column supplies its
    /// conflict policy; a table constraint never carries `AUTOINCREMENT`.
    #[must_use]
    pub fn primary_key_for(&self, column: &str) -> Option<PrimaryKey> {
        if let Some(clause) = self.column(column).and_then(|c| c.primary_key) {
            return Some(PrimaryKey {
                auto_increment: clause.auto_increment,
                on_conflict: clause.on_conflict,
            });
        }

        self.constraints.iter().find_map(|constraint| match constraint {
            TableConstraint::PrimaryKey {
                columns,
                on_conflict,
            } if columns.iter().any(|c| c.is_column(column)) => Some(PrimaryKey {
                auto_increment: false,
                on_conflict: *on_conflict,
            }),
            _ => None,
        })
    }

    /// Every `CHECK` expression, column constraints first, in source order.
    #[must_use]
    pub fn checks(&self) -> Vec<String> {
        let column_checks = self.columns.iter().flat_map(|c| c.checks.iter().cloned());
        let table_checks = self.constraints.iter().filter_map(|constraint| match constraint {
            TableConstraint::Check(expression) => Some(expression.clone()),
            _ => None,
        });
        column_checks.chain(table_checks).collect()
    }

    /// The first feature of this statement that a rebuilt table could not
    /// reproduce, if any.
    #[must_use]
    pub fn unsupported_feature(&self) -> Option<UnsupportedFeature> {
        if self.strict {
            return Some(UnsupportedFeature::Strict);
        }
        for column in &self.columns {
            if column.generated.is_some() {
                return Some(UnsupportedFeature::GeneratedColumn);
            }
            if column.default.as_deref().is_some_and(|d| d.starts_with('(')) {
                return Some(UnsupportedFeature::ExpressionDefault);
            }
            if column.unique_on_conflict.is_some() || column.not_null_on_conflict.is_some() {
                return Some(UnsupportedFeature::ConflictClause);
            }
        }
        self.constraints.iter().find_map(|constraint| match constraint {
            TableConstraint::ForeignKey { columns, .. } if columns.len() > 1 => {
                Some(UnsupportedFeature::CompositeForeignKey)
            }
            TableConstraint::Unique {
                on_conflict: Some(_),
                ..
            } => Some(UnsupportedFeature::ConflictClause),
            _ => None,
        })
    }
}

/// One column definition inside `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnClause {
    /// Column name.
    pub name: String,
    /// Declared type, as written (`VARCHAR(255)`); `None` when omitted.
    pub type_name: Option<String>,
    /// Inline `PRIMARY KEY` clause.
    pub primary_key: Option<PrimaryKeyClause>,
    /// `NOT NULL`.
    pub not_null: bool,
    /// Conflict policy of the `NOT NULL` constraint.
    pub not_null_on_conflict: Option<OnConflict>,
    /// `UNIQUE`.
    pub unique: bool,
    /// Conflict policy of the `UNIQUE` constraint.
    pub unique_on_conflict: Option<OnConflict>,
    /// `DEFAULT` value, as written.
    pub default: Option<String>,
    /// `COLLATE` name.
    pub collation: Option<String>,
    /// `CHECK` expressions.
    pub checks: Vec<String>,
    /// `REFERENCES` clause.
    pub references: Option<ReferencesClause>,
    /// Generation expression of a generated column.
    pub generated: Option<String>,
}

/// `PRIMARY KEY [ASC|DESC] [ON CONFLICT ...] [AUTOINCREMENT]` on a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimaryKeyClause {
    /// Key order.
    pub order: Option<SortOrder>,
    /// Conflict policy.
    pub on_conflict: Option<OnConflict>,
    /// `AUTOINCREMENT`.
    pub auto_increment: bool,
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    /// `PRIMARY KEY (...) [ON CONFLICT ...]`
    PrimaryKey {
        /// Key columns.
        columns: Vec<IndexedColumn>,
        /// Conflict policy.
        on_conflict: Option<OnConflict>,
    },
    /// `UNIQUE (...) [ON CONFLICT ...]`
    Unique {
        /// Unique columns.
        columns: Vec<IndexedColumn>,
        /// Conflict policy.
        on_conflict: Option<OnConflict>,
    },
    /// `CHECK (...)`
    Check(String),
    /// `FOREIGN KEY (...) REFERENCES ...`
    ForeignKey {
        /// Child columns.
        columns: Vec<String>,
        /// Parent reference.
        references: ReferencesClause,
    },
}

/// `REFERENCES parent [(columns)] [ON DELETE ...] [ON UPDATE ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferencesClause {
    /// Parent table.
    pub table: String,
    /// Parent columns; empty for the parent's primary key.
    pub columns: Vec<String>,
    /// `ON UPDATE` action.
    pub on_update: Option<ForeignKeyAction>,
    /// `ON DELETE` action.
    pub on_delete: Option<ForeignKeyAction>,
}

/// `CREATE INDEX` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexStatement {
    /// `UNIQUE`.
    pub unique: bool,
    /// `IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Index name.
    pub name: String,
    /// Indexed table.
    pub table: String,
    /// Indexed columns or expressions.
    pub columns: Vec<IndexedColumn>,
    /// Partial-index predicate, as written.
    pub predicate: Option<String>,
}

impl CreateIndexStatement {
    /// Names of the plain columns declared `DESC`.
    #[must_use]
    pub fn descending_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.order == Some(SortOrder::Desc))
            .filter_map(|c| c.name.as_deref())
            .collect()
    }
}

/// An indexed column (or expression) with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedColumn {
    /// Column name; `None` for an expression.
    pub name: Option<String>,
    /// Source text of the column or expression.
    pub expression: String,
    /// `COLLATE` name.
    pub collation: Option<String>,
    /// Explicit order.
    pub order: Option<SortOrder>,
}

impl IndexedColumn {
    /// Returns true if this is the plain column `name`.
    #[must_use]
    pub fn is_column(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }
}
