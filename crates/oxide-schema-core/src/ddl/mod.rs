//! Parser for the `CREATE TABLE` and `CREATE INDEX` text SQLite stores in
//! its schema catalog.
//!
//! The catalog keeps each statement exactly as it was written, which is the
//! only place some facts live: `AUTOINCREMENT`, conflict clauses, descending
//! index columns and partial-index predicates. This parser recovers them.
//!
//! # Example
//!
//! ```
//! use oxide_schema_core::ddl::parse_create_index;
//!
//! let index = parse_create_index(
//!     "CREATE INDEX recent ON events (created_at DESC) WHERE archived = 0",
//! )
//! .unwrap();
//! assert_eq!(index.descending_columns(), vec!["created_at"]);
//! assert_eq!(index.predicate.as_deref(), Some("archived = 0"));
//! ```

mod ast;
mod error;
mod parser;

pub use ast::{
    ColumnClause, CreateIndexStatement, CreateTableStatement, IndexedColumn, PrimaryKeyClause,
    ReferencesClause, TableConstraint,
};
pub use error::ParseError;
pub use parser::{parse_create_index, parse_create_table, Parser};
