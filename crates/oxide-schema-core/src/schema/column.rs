//! Column definitions.

use std::fmt;

use super::{quote_identifier, LiteralValue};

/// The preferred storage class of a column.
///
/// Affinity is advisory: any column can still store any value.
/// See <https://sqlite.org/datatype3.html#type_affinity>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Affinity {
    /// INTEGER affinity.
    Integer,
    /// NUMERIC affinity; also the fallback for unrecognized declared types.
    Numeric,
    /// REAL affinity.
    Real,
    /// TEXT affinity.
    Text,
    /// BLOB affinity.
    Blob,
}

impl Affinity {
    /// Maps a declared column type to its affinity.
    ///
    /// Applies SQLite's determination rules in order: `INT` gives INTEGER;
    /// `CHAR`, `CLOB` or `TEXT` give TEXT; `BLOB` or an empty type gives
    /// BLOB; `REAL`, `FLOA` or `DOUB` give REAL; anything else is NUMERIC.
    #[must_use]
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.contains("INT") {
            Self::Integer
        } else if ["CHAR", "CLOB", "TEXT"].iter().any(|s| upper.contains(s)) {
            Self::Text
        } else if upper.is_empty() || upper.contains("BLOB") {
            Self::Blob
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|s| upper.contains(s)) {
            Self::Real
        } else {
            Self::Numeric
        }
    }

    /// Returns the SQL keyword for this affinity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Numeric => "NUMERIC",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conflict resolution algorithm of an `ON CONFLICT` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OnConflict {
    /// ROLLBACK
    Rollback,
    /// ABORT
    Abort,
    /// FAIL
    Fail,
    /// IGNORE
    Ignore,
    /// REPLACE
    Replace,
}

impl OnConflict {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
            Self::Replace => "REPLACE",
        }
    }
}

/// Primary-key modifiers of a column.
///
/// `PRAGMA table_info` only says *whether* a column belongs to the primary
/// key; these modifiers are recovered from the table's `CREATE` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryKey {
    /// Whether the key is declared `AUTOINCREMENT`.
    pub auto_increment: bool,
    /// Optional `ON CONFLICT` policy.
    pub on_conflict: Option<OnConflict>,
}

impl PrimaryKey {
    /// A plain `PRIMARY KEY`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auto_increment: false,
            on_conflict: None,
        }
    }

    /// `PRIMARY KEY AUTOINCREMENT`.
    #[must_use]
    pub const fn auto_increment() -> Self {
        Self {
            auto_increment: true,
            on_conflict: None,
        }
    }

    /// Sets the conflict policy.
    #[must_use]
    pub const fn on_conflict(mut self, policy: OnConflict) -> Self {
        self.on_conflict = Some(policy);
        self
    }

    /// Renders the inline column constraint.
    ///
    /// The conflict clause precedes `AUTOINCREMENT`; SQLite rejects the
    /// reverse order.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("PRIMARY KEY");
        if let Some(policy) = self.on_conflict {
            sql.push_str(" ON CONFLICT ");
            sql.push_str(policy.as_str());
        }
        if self.auto_increment {
            sql.push_str(" AUTOINCREMENT");
        }
        sql
    }
}

/// Foreign key action (`ON DELETE`, `ON UPDATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForeignKeyAction {
    /// Set the child column to NULL.
    SetNull,
    /// Set the child column to its default value.
    SetDefault,
    /// Propagate the delete/update to child rows.
    Cascade,
    /// Refuse the change immediately.
    Restrict,
    /// Refuse the change at statement end (the engine default).
    NoAction,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }

    /// Parses the action text reported by `PRAGMA foreign_key_list`.
    #[must_use]
    pub fn from_sql(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "CASCADE" => Some(Self::Cascade),
            "RESTRICT" => Some(Self::Restrict),
            "NO ACTION" => Some(Self::NoAction),
            _ => None,
        }
    }
}

/// A single-column `REFERENCES` clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForeignKey {
    /// Parent table.
    pub table: String,
    /// Child column carrying the reference.
    pub column: String,
    /// Parent column; `None` references the parent's primary key.
    pub referenced_column: Option<String>,
    /// `ON UPDATE` action; `None` stands for the default `NO ACTION`.
    pub on_update: Option<ForeignKeyAction>,
    /// `ON DELETE` action; `None` stands for the default `NO ACTION`.
    pub on_delete: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Creates a reference from `column` to `table(referenced_column)`.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            referenced_column: Some(referenced_column.into()),
            on_update: None,
            on_delete: None,
        }
    }

    /// Sets the `ON UPDATE` action. `NO ACTION` is stored as `None`.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = explicit_action(action);
        self
    }

    /// Sets the `ON DELETE` action. `NO ACTION` is stored as `None`.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = explicit_action(action);
        self
    }

    /// Renders the `REFERENCES` clause.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = format!("REFERENCES {}", quote_identifier(&self.table));
        if let Some(ref column) = self.referenced_column {
            sql.push_str(&format!(" ({})", quote_identifier(column)));
        }
        if let Some(action) = self.on_update.and_then(explicit_action) {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_str());
        }
        if let Some(action) = self.on_delete.and_then(explicit_action) {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_str());
        }
        sql
    }
}

/// `NO ACTION` is the engine default and reads back as no action at all.
const fn explicit_action(action: ForeignKeyAction) -> Option<ForeignKeyAction> {
    match action {
        ForeignKeyAction::NoAction => None,
        other => Some(other),
    }
}

/// Definition of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnDefinition {
    /// Column name, unique within its table.
    pub name: String,
    /// Primary-key membership and modifiers.
    pub primary_key: Option<PrimaryKey>,
    /// Storage class preference.
    pub affinity: Affinity,
    /// `COLLATE` sequence; `None` for the default `BINARY`.
    pub collation: Option<String>,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Whether the column carries a `UNIQUE` constraint.
    pub unique: bool,
    /// Default value; `Null` when there is no `DEFAULT` clause.
    pub default_value: LiteralValue,
    /// Optional foreign key.
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// Creates a nullable column without constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, affinity: Affinity) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            affinity,
            collation: None,
            nullable: true,
            unique: false,
            default_value: LiteralValue::Null,
            references: None,
        }
    }

    /// Makes the column (part of) the primary key.
    #[must_use]
    pub const fn primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the column as UNIQUE.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the collating sequence.
    #[must_use]
    pub fn collate(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: LiteralValue) -> Self {
        self.default_value = value;
        self
    }

    /// Adds a foreign key; its child column is forced to this column.
    #[must_use]
    pub fn references(mut self, mut foreign_key: ForeignKey) -> Self {
        foreign_key.column.clone_from(&self.name);
        self.references = Some(foreign_key);
        self
    }

    /// Returns a copy renamed to `to` if this column is named `from`.
    #[must_use]
    pub fn rename(&self, from: &str, to: &str) -> Self {
        let mut column = self.clone();
        if column.name == from {
            column.name = to.to_string();
            if let Some(ref mut fk) = column.references {
                fk.column = to.to_string();
            }
        }
        column
    }

    /// Renders the column definition.
    ///
    /// The clause order is fixed so that re-introspecting the created table
    /// yields an equal definition.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.render(true)
    }

    /// Renders the column, optionally leaving out the inline primary key
    /// (used when the table renders a composite key constraint instead).
    pub(crate) fn render(&self, inline_primary_key: bool) -> String {
        let mut parts = vec![quote_identifier(&self.name), self.affinity.to_string()];

        if let Some(ref collation) = self.collation {
            parts.push(format!("COLLATE {}", quote_identifier(collation)));
        }

        if !self.default_value.is_null() {
            parts.push(format!("DEFAULT {}", self.default_value));
        }
        if inline_primary_key {
            if let Some(primary_key) = self.primary_key {
                parts.push(primary_key.to_sql());
            }
        }
        if !self.nullable {
            parts.push("NOT NULL".to_string());
        }
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        if let Some(ref fk) = self.references {
            parts.push(fk.to_sql());
        }

        parts.join(" ")
    }
}
