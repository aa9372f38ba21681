//! Rows of the schema catalog.

use std::fmt;

/// Kind of a schema object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectType {
    /// A table.
    Table,
    /// An index.
    Index,
    /// A view.
    View,
    /// A trigger.
    Trigger,
}

impl ObjectType {
    /// Returns the value used in the catalog's `type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Index => "index",
            Self::View => "view",
            Self::Trigger => "trigger",
        }
    }

    /// Parses a catalog `type` value.
    #[must_use]
    pub fn from_catalog(text: &str) -> Option<Self> {
        match text {
            "table" => Some(Self::Table),
            "index" => Some(Self::Index),
            "view" => Some(Self::View),
            "trigger" => Some(Self::Trigger),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `sqlite_master` (or `sqlite_temp_master`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectDefinition {
    /// Object kind.
    pub kind: ObjectType,
    /// Object name.
    pub name: String,
    /// Table the object belongs to; a table's own name for tables.
    pub table_name: String,
    /// B-tree root page, zero for views and triggers.
    pub root_page: i64,
    /// Creation DDL; `None` for automatic indexes.
    pub sql: Option<String>,
}

impl ObjectDefinition {
    /// Returns true for objects the engine manages itself.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.name.starts_with("sqlite_") || self.sql.is_none()
    }
}
