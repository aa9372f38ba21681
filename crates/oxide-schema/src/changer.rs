//! Schema changes.
//!
//! [`SchemaChanger`] runs `ALTER TABLE` natively when the linked SQLite
//! supports the operation. Otherwise it rebuilds the table:
//!
//! 1. turn `foreign_keys` off (outside the transaction, where it applies)
//!    and `legacy_alter_table` on
//! 2. `BEGIN`, defer foreign key checks
//! 3. read the table, its triggers and the views over it; refuse anything
//!    the rebuilt table could not reproduce
//! 4. create `tmp_<table>` with the target definition and its indexes
//! 5. copy the rows, drop the original, rename the copy
//! 6. swap the `tmp_` index names back and recreate the triggers
//! 7. run `PRAGMA foreign_key_check`; any violation rolls everything back
//! 8. `COMMIT`, then restore the pragmas

use oxide_schema_core::schema::{
    drop_table_sql, expression, quote_identifier, rename_table_sql, ColumnDefinition,
    IndexDefinition, ObjectType, TableDefinition, TEMP_TABLE_PREFIX,
};
use oxide_schema_core::{
    AlterOperation, Capability, DefinitionError, SqliteVersion, UnsupportedFeature,
};
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info, warn};

use crate::error::{Result, SchemaError};
use crate::pragma::{self, RebuildSettings};
use crate::reader::SchemaReader;

/// Operations collected by [`SchemaChanger::alter_table`].
#[derive(Debug, Clone)]
pub struct AlterTableDefinition {
    table: String,
    operations: Vec<AlterOperation>,
}

impl AlterTableDefinition {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            operations: Vec::new(),
        }
    }

    /// Name of the altered table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Appends a column.
    pub fn add_column(&mut self, column: ColumnDefinition) -> &mut Self {
        self.operations.push(AlterOperation::AddColumn(column));
        self
    }

    /// Removes a column.
    pub fn drop_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.operations.push(AlterOperation::DropColumn(name.into()));
        self
    }

    /// Renames a column.
    pub fn rename_column(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.operations.push(AlterOperation::RenameColumn {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Operations collected so far.
    #[must_use]
    pub fn operations(&self) -> &[AlterOperation] {
        &self.operations
    }
}

/// Columns and indexes collected by [`SchemaChanger::create_table`].
#[derive(Debug, Clone)]
pub struct CreateTableDefinition {
    definition: TableDefinition,
}

impl CreateTableDefinition {
    fn new(table: &str) -> Self {
        Self {
            definition: TableDefinition::new(table, Vec::new(), Vec::new()),
        }
    }

    /// Adds a column.
    pub fn column(&mut self, column: ColumnDefinition) -> &mut Self {
        self.definition.columns.push(column);
        self
    }

    /// Adds an index; it is attached to the created table whatever table
    /// name it carries.
    pub fn index(&mut self, mut index: IndexDefinition) -> &mut Self {
        index.table.clone_from(&self.definition.name);
        self.definition.indexes.push(index);
        self
    }

    /// The definition collected so far.
    #[must_use]
    pub const fn definition(&self) -> &TableDefinition {
        &self.definition
    }
}

/// Applies schema changes over a borrowed connection.
///
/// Each call runs its statements in order on the one connection and keeps
/// nothing between calls.
pub struct SchemaChanger<'c> {
    conn: &'c mut SqliteConnection,
    version: SqliteVersion,
}

impl<'c> SchemaChanger<'c> {
    /// Creates a changer for the SQLite version behind `conn`.
    pub async fn new(conn: &'c mut SqliteConnection) -> Result<Self> {
        let version = pragma::sqlite_version(&mut *conn).await?;
        Ok(Self { conn, version })
    }

    /// Creates a changer that behaves as if the engine were `version`.
    ///
    /// Pretending to be older than the linked library forces the rebuild
    /// path for operations the engine would run natively.
    pub fn with_version(conn: &'c mut SqliteConnection, version: SqliteVersion) -> Self {
        Self { conn, version }
    }

    /// The engine version used to pick native or rebuild paths.
    #[must_use]
    pub const fn version(&self) -> SqliteVersion {
        self.version
    }

    /// Alters `table` with the operations collected by `block`.
    ///
    /// Every operation is validated before any statement runs. Operations
    /// are then applied in order, each natively or by rebuilding the table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Definition`] for invalid operations and for
    /// tables a rebuild cannot reproduce,
    /// [`SchemaError::TableNotFound`] if a rebuild finds no table,
    /// [`SchemaError::ForeignKeyViolations`] if a rebuild broke references,
    /// and [`SchemaError::Database`] for engine errors.
    pub async fn alter_table<F>(&mut self, table: &str, block: F) -> Result<()>
    where
        F: FnOnce(&mut AlterTableDefinition),
    {
        let mut definition = AlterTableDefinition::new(table);
        block(&mut definition);

        for operation in &definition.operations {
            operation.validate()?;
        }

        for operation in &definition.operations {
            match operation.native_sql(table, self.version) {
                Some(sql) => pragma::execute(&mut *self.conn, &sql).await?,
                None => self.rebuild(table, operation).await?,
            }
        }
        Ok(())
    }

    /// Creates `table` with the columns and indexes collected by `block`.
    ///
    /// The table and its indexes are created in one transaction. Indexes
    /// are created with `IF NOT EXISTS`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Definition`] for duplicate column names, an
    /// index name over the length limit, or no columns at all.
    pub async fn create_table<F>(&mut self, table: &str, if_not_exists: bool, block: F) -> Result<()>
    where
        F: FnOnce(&mut CreateTableDefinition),
    {
        let mut definition = CreateTableDefinition::new(table);
        block(&mut definition);
        let definition = definition.definition;

        definition.validate()?;
        let create_sql = definition.to_sql(if_not_exists)?;

        let mut tx = self.conn.begin().await?;
        pragma::execute(&mut tx, &create_sql).await?;
        for index in &definition.indexes {
            pragma::execute(&mut tx, &index.to_sql(true)).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Drops `table`.
    pub async fn drop_table(&mut self, table: &str, if_exists: bool) -> Result<()> {
        pragma::execute(&mut *self.conn, &drop_table_sql(table, if_exists)).await
    }

    /// Renames `table` to `to`.
    ///
    /// Before 3.26.0 SQLite does not rewrite triggers and views that
    /// reference the old name; that is left to the caller.
    pub async fn rename_table(&mut self, table: &str, to: &str) -> Result<()> {
        if !self.version.supports(Capability::RenameTableCascade) {
            warn!(
                table = %table,
                to = %to,
                version = %self.version,
                "Triggers and views referencing the table are not updated by this SQLite version"
            );
        }
        pragma::execute(&mut *self.conn, &rename_table_sql(table, to)).await
    }

    async fn rebuild(&mut self, table: &str, operation: &AlterOperation) -> Result<()> {
        info!(table = %table, operation = %operation, "Rebuilding table");

        let settings = RebuildSettings::read(&mut *self.conn).await?;
        pragma::set_foreign_keys(&mut *self.conn, false).await?;

        let result = match pragma::set_legacy_alter_table(&mut *self.conn, true).await {
            Ok(()) => rebuild_in_transaction(&mut *self.conn, table, operation).await,
            Err(error) => Err(error),
        };
        let restored = settings.restore(&mut *self.conn).await;
        result?;
        restored?;

        info!(table = %table, operation = %operation, "Table rebuilt");
        Ok(())
    }
}

async fn rebuild_in_transaction(
    conn: &mut SqliteConnection,
    table: &str,
    operation: &AlterOperation,
) -> Result<()> {
    let mut tx = conn.begin().await?;
    match copy_through_temp_table(&mut tx, table, operation).await {
        Ok(()) => {
            tx.commit().await?;
            Ok(())
        }
        Err(error) => {
            warn!(table = %table, error = %error, "Rebuild failed, rolling back");
            if let Err(rollback_error) = tx.rollback().await {
                warn!(table = %table, error = %rollback_error, "Rollback failed");
            }
            Err(error)
        }
    }
}

/// A trigger on the rebuilt table, dropped with it and created again.
struct Trigger {
    schema: &'static str,
    name: String,
    sql: String,
}

async fn copy_through_temp_table(
    conn: &mut SqliteConnection,
    table: &str,
    operation: &AlterOperation,
) -> Result<()> {
    pragma::set_defer_foreign_keys(&mut *conn, true).await?;

    let (current, triggers) = {
        let mut reader = SchemaReader::new(&mut *conn);
        let current = reader.table_definition(table).await?;
        check_operation(&current, operation)?;
        check_rebuildable(&mut reader, &current).await?;
        let triggers = dependent_triggers(&mut reader, &current, operation).await?;
        (current, triggers)
    };
    // The name the table was created with, whatever case the caller used.
    let table = current.name.as_str();

    let temp_table = format!("{TEMP_TABLE_PREFIX}{table}");
    let target = current.rename_table(&temp_table).apply(operation);
    target.validate()?;

    // Rows are copied by position, so both sides must list the same columns.
    let (source, destination) = match operation {
        AlterOperation::DropColumn(name) => (current.drop_column(name), target.clone()),
        AlterOperation::RenameColumn { .. } => (current.clone(), target.clone()),
        AlterOperation::AddColumn(column) => (current.clone(), target.drop_column(&column.name)),
    };
    let copy_sql = source.copy_sql(&destination)?;

    pragma::execute(&mut *conn, &target.to_sql(false)?).await?;
    for index in &target.indexes {
        pragma::execute(&mut *conn, &index.to_sql(false)).await?;
    }
    pragma::execute(&mut *conn, &copy_sql).await?;
    for trigger in &triggers {
        let drop_sql = format!(
            "DROP TRIGGER IF EXISTS {}.{}",
            trigger.schema,
            quote_identifier(&trigger.name)
        );
        pragma::execute(&mut *conn, &drop_sql).await?;
    }
    pragma::execute(&mut *conn, &drop_table_sql(table, false)).await?;
    pragma::execute(&mut *conn, &rename_table_sql(&temp_table, table)).await?;

    let renamed = target.rename_table(table);
    for (temp_index, index) in target.indexes.iter().zip(&renamed.indexes) {
        pragma::execute(&mut *conn, &temp_index.drop_sql()).await?;
        pragma::execute(&mut *conn, &index.to_sql(false)).await?;
    }
    for trigger in &triggers {
        debug!(trigger = %trigger.name, "Recreating trigger");
        pragma::execute(&mut *conn, &trigger.sql).await?;
    }

    let violations = pragma::foreign_key_check(&mut *conn).await?;
    if !violations.is_empty() {
        return Err(SchemaError::ForeignKeyViolations(violations));
    }
    Ok(())
}

/// Refuses tables whose stored definition has parts the rebuilt table
/// would lose.
async fn check_rebuildable(reader: &mut SchemaReader<'_>, current: &TableDefinition) -> Result<()> {
    let unsupported = |feature: UnsupportedFeature| DefinitionError::Unsupported {
        table: current.name.clone(),
        feature,
    };

    let Some(statement) = reader.create_table_statement(&current.name).await? else {
        return Err(unsupported(UnsupportedFeature::UnparseableDefinition).into());
    };
    if let Some(feature) = statement.unsupported_feature() {
        return Err(unsupported(feature).into());
    }
    for index in &current.indexes {
        if reader.create_index_statement(&index.name).await?.is_none() {
            return Err(unsupported(UnsupportedFeature::UnparseableDefinition).into());
        }
    }
    Ok(())
}

/// Collects the triggers on `current`, rewritten for a renamed column.
///
/// A trigger or view still using a dropped or renamed column afterwards
/// refuses the change, as native `ALTER TABLE` does.
async fn dependent_triggers(
    reader: &mut SchemaReader<'_>,
    current: &TableDefinition,
    operation: &AlterOperation,
) -> Result<Vec<Trigger>> {
    let changed_column = match operation {
        AlterOperation::DropColumn(name) => Some(name.as_str()),
        AlterOperation::RenameColumn { from, .. } => Some(from.as_str()),
        AlterOperation::AddColumn(_) => None,
    };

    let mut triggers = Vec::new();
    for (schema, temp) in [("main", false), ("temp", true)] {
        for object in reader.object_definitions(None, None, temp).await? {
            let Some(sql) = object.sql else {
                continue;
            };
            let sql = match object.kind {
                ObjectType::Trigger if object.table_name.eq_ignore_ascii_case(&current.name) => {
                    match operation {
                        AlterOperation::RenameColumn { from, to } => {
                            expression::rename_trigger_column(&sql, &current.name, from, to)
                        }
                        _ => sql,
                    }
                }
                ObjectType::View if expression::mentions_column(&sql, &current.name) => sql,
                _ => continue,
            };

            if let Some(column) = changed_column.filter(|c| expression::mentions_column(&sql, c)) {
                return Err(DefinitionError::DependentObject {
                    table: current.name.clone(),
                    column: column.to_string(),
                    kind: object.kind,
                    object: object.name,
                }
                .into());
            }
            if object.kind == ObjectType::Trigger {
                triggers.push(Trigger {
                    schema,
                    name: object.name,
                    sql,
                });
            }
        }
    }
    Ok(triggers)
}

fn check_operation(current: &TableDefinition, operation: &AlterOperation) -> Result<()> {
    let unknown = |column: &str| DefinitionError::UnknownColumn {
        table: current.name.clone(),
        column: column.to_string(),
    };
    let duplicate = |column: &str| DefinitionError::DuplicateColumn {
        table: current.name.clone(),
        column: column.to_string(),
    };

    match operation {
        AlterOperation::DropColumn(name) if !current.has_column(name) => Err(unknown(name).into()),
        AlterOperation::RenameColumn { from, .. } if !current.has_column(from) => {
            Err(unknown(from).into())
        }
        AlterOperation::RenameColumn { to, .. } if current.has_column(to) => {
            Err(duplicate(to).into())
        }
        AlterOperation::AddColumn(column) if current.has_column(&column.name) => {
            Err(duplicate(&column.name).into())
        }
        _ => Ok(()),
    }
}
