//! The connection boundary: pragmas, version lookup and statement execution.

use std::fmt;

use oxide_schema_core::SqliteVersion;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::Result;

/// One row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyViolation {
    /// Child table holding the dangling reference.
    pub table: String,
    /// Offending row; `None` for `WITHOUT ROWID` tables.
    pub row_id: Option<i64>,
    /// Parent table that should hold the referenced row.
    pub parent: String,
}

impl fmt::Display for ForeignKeyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_id {
            Some(row_id) => write!(f, "{} [{row_id}] => {}", self.table, self.parent),
            None => write!(f, "{} [] => {}", self.table, self.parent),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ForeignKeyCheckRow {
    table: String,
    rowid: Option<i64>,
    parent: String,
}

/// Executes one statement, logging it first.
pub async fn execute(conn: &mut SqliteConnection, sql: &str) -> Result<()> {
    debug!(sql = %sql, "Executing SQL");
    sqlx::query(sql).persistent(false).execute(conn).await?;
    Ok(())
}

/// Returns the version of the linked SQLite library.
pub async fn sqlite_version(conn: &mut SqliteConnection) -> Result<SqliteVersion> {
    let text: String = sqlx::query_scalar("SELECT sqlite_version()")
        .fetch_one(conn)
        .await?;
    Ok(text.parse()?)
}

/// Returns whether foreign key enforcement is on.
pub async fn foreign_keys(conn: &mut SqliteConnection) -> Result<bool> {
    read_flag(conn, "PRAGMA foreign_keys").await
}

/// Turns foreign key enforcement on or off.
///
/// SQLite ignores this inside a transaction.
pub async fn set_foreign_keys(conn: &mut SqliteConnection, on: bool) -> Result<()> {
    execute(conn, &format!("PRAGMA foreign_keys = {}", on_off(on))).await
}

/// Returns whether foreign key checks are deferred to commit.
pub async fn defer_foreign_keys(conn: &mut SqliteConnection) -> Result<bool> {
    read_flag(conn, "PRAGMA defer_foreign_keys").await
}

/// Defers foreign key checks to commit. Resets itself when the transaction
/// ends.
pub async fn set_defer_foreign_keys(conn: &mut SqliteConnection, on: bool) -> Result<()> {
    execute(conn, &format!("PRAGMA defer_foreign_keys = {}", on_off(on))).await
}

/// Returns whether `ALTER TABLE ... RENAME` leaves views and triggers alone.
pub async fn legacy_alter_table(conn: &mut SqliteConnection) -> Result<bool> {
    read_flag(conn, "PRAGMA legacy_alter_table").await
}

/// Turns the legacy `ALTER TABLE ... RENAME` behaviour on or off.
pub async fn set_legacy_alter_table(conn: &mut SqliteConnection, on: bool) -> Result<()> {
    execute(conn, &format!("PRAGMA legacy_alter_table = {}", on_off(on))).await
}

/// Runs `PRAGMA foreign_key_check` over the whole database.
pub async fn foreign_key_check(conn: &mut SqliteConnection) -> Result<Vec<ForeignKeyViolation>> {
    debug!(sql = "PRAGMA foreign_key_check", "Executing SQL");
    let rows: Vec<ForeignKeyCheckRow> = sqlx::query_as("PRAGMA foreign_key_check")
        .fetch_all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| ForeignKeyViolation {
            table: row.table,
            row_id: row.rowid,
            parent: row.parent,
        })
        .collect())
}

/// The pragmas a rebuild changes.
///
/// `legacy_alter_table` is turned on so that renaming the rebuilt table
/// into place does not re-check the views that refer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSettings {
    /// `PRAGMA foreign_keys`
    pub foreign_keys: bool,
    /// `PRAGMA defer_foreign_keys`
    pub defer_foreign_keys: bool,
    /// `PRAGMA legacy_alter_table`
    pub legacy_alter_table: bool,
}

impl RebuildSettings {
    /// Records the current settings.
    pub async fn read(conn: &mut SqliteConnection) -> Result<Self> {
        Ok(Self {
            foreign_keys: foreign_keys(&mut *conn).await?,
            defer_foreign_keys: defer_foreign_keys(&mut *conn).await?,
            legacy_alter_table: legacy_alter_table(&mut *conn).await?,
        })
    }

    /// Puts the recorded settings back. Must run outside a transaction for
    /// `foreign_keys` to take effect.
    pub async fn restore(self, conn: &mut SqliteConnection) -> Result<()> {
        set_foreign_keys(&mut *conn, self.foreign_keys).await?;
        set_defer_foreign_keys(&mut *conn, self.defer_foreign_keys).await?;
        set_legacy_alter_table(&mut *conn, self.legacy_alter_table).await
    }
}

async fn read_flag(conn: &mut SqliteConnection, sql: &str) -> Result<bool> {
    let value: i64 = sqlx::query_scalar(sql).fetch_one(conn).await?;
    Ok(value != 0)
}

const fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}
