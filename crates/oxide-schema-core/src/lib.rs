//! # oxide-schema-core
//!
//! The pure half of the SQLite schema engine: no connection, no I/O.
//!
//! This crate provides:
//! - Value types for tables, columns, indexes and foreign keys
//! - Canonical `CREATE` rendering that reads back into equal definitions
//! - The transforms that compute a rebuilt table from an alter operation
//! - A parser for the `CREATE` text stored in the schema catalog
//! - The version table deciding which alter operations run natively
//!
//! ## Computing a rebuild target
//!
//! ```rust
//! use oxide_schema_core::schema::{Affinity, ColumnDefinition, IndexDefinition, TableDefinition};
//! use oxide_schema_core::AlterOperation;
//!
//! let users = TableDefinition::new(
//!     "users",
//!     vec![
//!         ColumnDefinition::new("id", Affinity::Integer),
//!         ColumnDefinition::new("email", Affinity::Text).not_null(),
//!     ],
//!     vec![IndexDefinition::new("users", "users_email", ["email"]).unique()],
//! );
//!
//! let target = users
//!     .rename_table("tmp_users")
//!     .apply(&AlterOperation::RenameColumn {
//!         from: "email".into(),
//!         to: "mail".into(),
//!     });
//!
//! assert_eq!(target.indexes[0].name, "tmp_users_email");
//! assert_eq!(target.indexes[0].columns, vec!["mail"]);
//! ```
//!
//! ## Native or rebuild
//!
//! ```rust
//! use oxide_schema_core::{AlterOperation, SqliteVersion};
//!
//! let drop = AlterOperation::DropColumn("age".into());
//! assert!(drop.native_sql("users", SqliteVersion::new(3, 34, 1)).is_none());
//! assert_eq!(
//!     drop.native_sql("users", SqliteVersion::new(3, 35, 0)).as_deref(),
//!     Some("ALTER TABLE \"users\" DROP COLUMN \"age\"")
//! );
//! ```

pub mod ddl;
pub mod error;
pub mod lexer;
pub mod operation;
pub mod schema;
pub mod version;

pub use error::{DefinitionError, InvalidColumnReason, Result, UnsupportedFeature};
pub use operation::AlterOperation;
pub use schema::{
    Affinity, ColumnDefinition, ForeignKey, ForeignKeyAction, IndexDefinition, LiteralValue,
    ObjectDefinition, ObjectType, OnConflict, PrimaryKey, SortOrder, TableDefinition,
};
pub use version::{Capability, SqliteVersion};
