//! Schema model.
//!
//! Value types describing tables, columns, indexes and foreign keys, their
//! canonical SQL rendering, and the pure transforms used to compute the
//! target of a table rebuild.

mod column;
pub mod expression;
mod index;
mod literal;
mod object;
mod table;

pub use column::{Affinity, ColumnDefinition, ForeignKey, ForeignKeyAction, OnConflict, PrimaryKey};
pub use index::{IndexDefinition, IndexTerm, SortOrder};
pub use literal::LiteralValue;
pub use object::{ObjectDefinition, ObjectType};
pub use table::{drop_table_sql, rename_table_sql, TableDefinition};

/// Name prefix of the temporary table (and its indexes) during a rebuild.
pub const TEMP_TABLE_PREFIX: &str = "tmp_";

/// Longest accepted index name, in characters.
pub const MAX_INDEX_NAME_LENGTH: usize = 64;

/// Quotes an identifier for SQLite.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
