//! SQLite schema introspection and table-rebuild migrations.
//!
//! `oxide-schema` reads table definitions out of a live SQLite database and
//! applies `ALTER TABLE` changes to it, whatever the engine version:
//! - Operations the engine supports run as a single native statement
//! - Everything else rebuilds the table through a temporary copy, keeping
//!   rows, table constraints, indexes (expressions, collations, sort order,
//!   partial predicates), triggers and foreign key integrity
//!
//! # Architecture
//!
//! - **Reader** - Builds [`TableDefinition`]s from the catalog and pragmas
//! - **Changer** - Dispatches alter operations to native SQL or a rebuild
//! - **Pragma** - Foreign key settings, integrity checks and statement execution
//!
//! The definition types, SQL rendering and version table live in
//! [`oxide_schema_core`] and are re-exported here.
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_schema::prelude::*;
//! use sqlx::{Connection, SqliteConnection};
//!
//! let mut conn = SqliteConnection::connect("sqlite:app.db").await?;
//!
//! let mut changer = SchemaChanger::new(&mut conn).await?;
//! changer
//!     .alter_table("users", |t| {
//!         t.drop_column("age").rename_column("email", "contact");
//!     })
//!     .await?;
//!
//! let users = SchemaReader::new(&mut conn).table_definition("users").await?;
//! println!("{}", users.to_sql(false)?);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print every table as canonical CREATE statements
//! oxide-schema --database sqlite:app.db inspect
//!
//! # Drop a column, rebuilding the table on engines before 3.35.0
//! oxide-schema drop-column users age
//!
//! # Report dangling foreign keys
//! oxide-schema check
//! ```

pub mod changer;
pub mod error;
pub mod pragma;
pub mod reader;

pub use changer::{AlterTableDefinition, CreateTableDefinition, SchemaChanger};
pub use error::{Result, SchemaError};
pub use oxide_schema_core::{
    AlterOperation, Capability, ColumnDefinition, DefinitionError, IndexDefinition, SqliteVersion,
    TableDefinition, UnsupportedFeature,
};
pub use pragma::{ForeignKeyViolation, RebuildSettings};
pub use reader::SchemaReader;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::changer::{AlterTableDefinition, CreateTableDefinition, SchemaChanger};
    pub use crate::error::{Result, SchemaError};
    pub use crate::pragma::{ForeignKeyViolation, RebuildSettings};
    pub use crate::reader::SchemaReader;
    pub use oxide_schema_core::schema::{
        Affinity, ColumnDefinition, ForeignKey, ForeignKeyAction, IndexDefinition, IndexTerm,
        LiteralValue, ObjectDefinition, ObjectType, OnConflict, PrimaryKey, SortOrder,
        TableDefinition,
    };
    pub use oxide_schema_core::{
        AlterOperation, Capability, DefinitionError, SqliteVersion, UnsupportedFeature,
    };
}
