//! Schema introspection.
//!
//! Builds [`TableDefinition`]s from a live database. Structural facts come
//! from the table-valued pragma functions. What the pragmas do not expose
//! (`AUTOINCREMENT`, conflict clauses, collations, `CHECK` constraints,
//! index expressions, descending index columns, partial index predicates)
//! is recovered by parsing the `CREATE` text stored in the schema catalog.
//! Unparseable text is logged and treated as "not present".
//!
//! Table names are matched case-insensitively, as SQLite does; definitions
//! carry the name the table was created with.

use oxide_schema_core::ddl::{self, CreateIndexStatement, CreateTableStatement};
use oxide_schema_core::schema::{
    Affinity, ColumnDefinition, ForeignKey, ForeignKeyAction, IndexDefinition, LiteralValue,
    ObjectDefinition, ObjectType, TableDefinition,
};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{Result, SchemaError};

#[derive(Debug, sqlx::FromRow)]
struct TableInfoRow {
    name: String,
    #[sqlx(rename = "type")]
    declared_type: String,
    #[sqlx(rename = "notnull")]
    not_null: i64,
    #[sqlx(rename = "dflt_value")]
    default_value: Option<String>,
    pk: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ForeignKeyRow {
    #[sqlx(rename = "table")]
    parent: String,
    #[sqlx(rename = "from")]
    column: String,
    #[sqlx(rename = "to")]
    referenced_column: Option<String>,
    on_update: String,
    on_delete: String,
}

#[derive(Debug, sqlx::FromRow)]
struct IndexListRow {
    name: String,
    unique: i64,
    origin: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    #[sqlx(rename = "type")]
    kind: String,
    name: String,
    tbl_name: String,
    rootpage: Option<i64>,
    sql: Option<String>,
}

/// Reads schema definitions over a borrowed connection.
pub struct SchemaReader<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SchemaReader<'c> {
    /// Creates a reader.
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Reads the full definition of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TableNotFound`] when no table has that name,
    /// whatever its case.
    pub async fn table_definition(&mut self, table: &str) -> Result<TableDefinition> {
        let name = self
            .canonical_table_name(table)
            .await?
            .ok_or_else(|| SchemaError::TableNotFound(table.to_string()))?;
        let columns = self.column_definitions(&name).await?;
        if columns.is_empty() {
            return Err(SchemaError::TableNotFound(table.to_string()));
        }
        let indexes = self.index_definitions(&name).await?;

        let mut definition = TableDefinition::new(&name, columns, indexes);
        definition.unique_constraints = self
            .unique_keys(&name)
            .await?
            .into_iter()
            .filter(|key| key.len() > 1)
            .collect();

        let key: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk",
        )
        .bind(&name)
        .fetch_all(&mut *self.conn)
        .await?;
        let reorder = {
            let declared = definition.primary_key_columns().map(|c| &c.name);
            key.len() > 1 && !key.iter().eq(declared)
        };
        if reorder {
            definition.key_order = key;
        }

        if let Some(statement) = self.create_table_statement(&name).await? {
            definition.checks = statement.checks();
            definition.without_rowid = statement.without_rowid;
        }
        Ok(definition)
    }

    /// Returns the name `table` was created with, or `None` if no table
    /// matches. Temporary tables shadow main ones, as in SQL.
    pub async fn canonical_table_name(&mut self, table: &str) -> Result<Option<String>> {
        Ok(sqlx::query_scalar(
            "SELECT name FROM sqlite_temp_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE \
             UNION ALL \
             SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        )
        .bind(table)
        .fetch_optional(&mut *self.conn)
        .await?)
    }

    /// Reads every user table, in catalog order.
    pub async fn table_definitions(&mut self) -> Result<Vec<TableDefinition>> {
        let tables = self
            .object_definitions(None, Some(ObjectType::Table), false)
            .await?;
        let mut definitions = Vec::new();
        for table in tables.iter().filter(|t| !t.is_internal()) {
            definitions.push(self.table_definition(&table.name).await?);
        }
        Ok(definitions)
    }

    /// Reads the columns of `table`. A missing table yields no columns.
    pub async fn column_definitions(&mut self, table: &str) -> Result<Vec<ColumnDefinition>> {
        let rows: Vec<TableInfoRow> = sqlx::query_as(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut *self.conn)
        .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let foreign_keys = self.foreign_keys(table).await?;
        let unique_columns: Vec<String> = self
            .unique_keys(table)
            .await?
            .into_iter()
            .filter(|key| key.len() == 1)
            .flatten()
            .collect();
        let statement = self.create_table_statement(table).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let primary_key = (row.pk > 0).then(|| {
                    statement
                        .as_ref()
                        .and_then(|s| s.primary_key_for(&row.name))
                        .unwrap_or_default()
                });
                let references = foreign_keys.iter().find(|fk| fk.column == row.name).cloned();
                let collation = statement
                    .as_ref()
                    .and_then(|s| s.column(&row.name))
                    .and_then(|c| c.collation.clone());
                ColumnDefinition {
                    unique: unique_columns.contains(&row.name),
                    affinity: Affinity::from_declared_type(&row.declared_type),
                    collation,
                    nullable: row.not_null == 0,
                    default_value: LiteralValue::from_default(row.default_value.as_deref()),
                    primary_key,
                    references,
                    name: row.name,
                }
            })
            .collect())
    }

    /// Reads the indexes of `table`, skipping the engine's automatic ones.
    /// Indexes are sorted by name.
    ///
    /// Key columns come from `pragma_index_info`. Expression terms, which
    /// the pragma reports without a name, and every term's order and
    /// collation come from the stored `CREATE INDEX` text.
    pub async fn index_definitions(&mut self, table: &str) -> Result<Vec<IndexDefinition>> {
        let mut indexes = Vec::new();
        for row in self.index_list(table).await? {
            if row.name.starts_with("sqlite_") {
                continue;
            }

            let names = self.index_columns(&row.name).await?;
            let statement = self.create_index_statement(&row.name).await?;
            let terms = statement
                .as_ref()
                .map(|s| s.columns.as_slice())
                .filter(|terms| terms.len() == names.len());

            let mut index = IndexDefinition::new(table, &row.name, Vec::<String>::new());
            index.unique = row.unique != 0;
            index.predicate = statement.as_ref().and_then(|s| s.predicate.clone());

            for (position, name) in names.into_iter().enumerate() {
                let term = terms.and_then(|terms| terms.get(position));
                let key = match (name, term) {
                    (Some(name), _) => {
                        index = index.column(name.as_str());
                        name
                    }
                    (None, Some(term)) => {
                        index = index.with_expression(term.expression.as_str());
                        term.expression.clone()
                    }
                    (None, None) => {
                        debug!(index = %row.name, position, "Skipping unreadable index expression");
                        continue;
                    }
                };
                if let Some(term) = term {
                    if let Some(ref collation) = term.collation {
                        index = index.collate(key.as_str(), collation.as_str());
                    }
                    if let Some(order) = term.order {
                        index = index.order(key, order);
                    }
                }
            }
            indexes.push(index);
        }
        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(indexes)
    }

    /// Reads the foreign keys declared by `table`.
    ///
    /// An explicit `NO ACTION` (the default) is reported as no action.
    pub async fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<ForeignKeyRow> = sqlx::query_as(
            "SELECT \"table\", \"from\", \"to\", on_update, on_delete \
             FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )
        .bind(table)
        .fetch_all(&mut *self.conn)
        .await?;

        let action = |text: &str| {
            ForeignKeyAction::from_sql(text).filter(|a| *a != ForeignKeyAction::NoAction)
        };

        Ok(rows
            .into_iter()
            .map(|row| ForeignKey {
                on_update: action(&row.on_update),
                on_delete: action(&row.on_delete),
                table: row.parent,
                column: row.column,
                referenced_column: row.referenced_column,
            })
            .collect())
    }

    /// Lists schema catalog entries, optionally filtered by name and kind.
    /// `temp` selects `sqlite_temp_master` instead of `sqlite_master`.
    pub async fn object_definitions(
        &mut self,
        name: Option<&str>,
        kind: Option<ObjectType>,
        temp: bool,
    ) -> Result<Vec<ObjectDefinition>> {
        let catalog = if temp { "sqlite_temp_master" } else { "sqlite_master" };
        let sql = format!(
            "SELECT type, name, tbl_name, rootpage, sql FROM {catalog} \
             WHERE (?1 IS NULL OR name = ?1 COLLATE NOCASE) AND (?2 IS NULL OR type = ?2)"
        );
        let rows: Vec<CatalogRow> = sqlx::query_as(&sql)
            .bind(name)
            .bind(kind.map(|k| k.as_str()))
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                Some(ObjectDefinition {
                    kind: ObjectType::from_catalog(&row.kind)?,
                    name: row.name,
                    table_name: row.tbl_name,
                    root_page: row.rootpage.unwrap_or(0),
                    sql: row.sql,
                })
            })
            .collect())
    }

    async fn index_list(&mut self, table: &str) -> Result<Vec<IndexListRow>> {
        Ok(sqlx::query_as(
            "SELECT name, \"unique\", origin FROM pragma_index_list(?1) ORDER BY seq DESC",
        )
        .bind(table)
        .fetch_all(&mut *self.conn)
        .await?)
    }

    /// Key terms of an index by position; `None` marks an expression.
    async fn index_columns(&mut self, index: &str) -> Result<Vec<Option<String>>> {
        Ok(
            sqlx::query_scalar("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
                .bind(index)
                .fetch_all(&mut *self.conn)
                .await?,
        )
    }

    /// Column lists of the `UNIQUE` constraints, oldest first.
    async fn unique_keys(&mut self, table: &str) -> Result<Vec<Vec<String>>> {
        let mut keys = Vec::new();
        for row in self.index_list(table).await? {
            if row.origin != "u" {
                continue;
            }
            let columns = self.index_columns(&row.name).await?;
            keys.push(columns.into_iter().flatten().collect());
        }
        Ok(keys)
    }

    async fn stored_sql(&mut self, kind: ObjectType, name: &str) -> Result<Option<String>> {
        let sql: Option<Option<String>> = sqlx::query_scalar(
            "SELECT sql FROM sqlite_temp_master WHERE type = ?1 AND name = ?2 COLLATE NOCASE \
             UNION ALL \
             SELECT sql FROM sqlite_master WHERE type = ?1 AND name = ?2 COLLATE NOCASE",
        )
        .bind(kind.as_str())
        .bind(name)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(sql.flatten())
    }

    /// Parses the stored `CREATE TABLE` text of `table`. Missing or
    /// unparseable text yields `None`.
    pub async fn create_table_statement(
        &mut self,
        table: &str,
    ) -> Result<Option<CreateTableStatement>> {
        let Some(sql) = self.stored_sql(ObjectType::Table, table).await? else {
            return Ok(None);
        };
        match ddl::parse_create_table(&sql) {
            Ok(statement) => Ok(Some(statement)),
            Err(error) => {
                debug!(table = %table, error = %error, "Could not parse table DDL");
                Ok(None)
            }
        }
    }

    /// Parses the stored `CREATE INDEX` text of `index`. Missing or
    /// unparseable text yields `None`.
    pub async fn create_index_statement(
        &mut self,
        index: &str,
    ) -> Result<Option<CreateIndexStatement>> {
        let Some(sql) = self.stored_sql(ObjectType::Index, index).await? else {
            return Ok(None);
        };
        match ddl::parse_create_index(&sql) {
            Ok(statement) => Ok(Some(statement)),
            Err(error) => {
                debug!(index = %index, error = %error, "Could not parse index DDL");
                Ok(None)
            }
        }
    }
}
