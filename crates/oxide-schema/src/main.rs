//! oxide-schema CLI
//!
//! Command-line tool for inspecting and altering SQLite schemas.

use clap::{Parser, Subcommand};
use sqlx::{Connection, SqliteConnection};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_schema::prelude::*;
use oxide_schema::pragma;

/// SQLite schema introspection and table-rebuild migrations.
#[derive(Parser)]
#[command(name = "oxide-schema")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Enable verbose output (logs every executed statement).
    #[arg(short, long)]
    verbose: bool,

    /// Behave as if the engine were this version (e.g. 3.24.0).
    #[arg(long, value_name = "X.Y.Z")]
    assume_version: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print table definitions.
    Inspect {
        /// Table to print (all if not specified).
        #[arg(short, long)]
        table: Option<String>,

        /// Print JSON instead of SQL.
        #[arg(long)]
        json: bool,
    },

    /// Drop a column.
    DropColumn {
        /// Table name.
        table: String,
        /// Column to drop.
        column: String,
    },

    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Current column name.
        from: String,
        /// New column name.
        to: String,
    },

    /// Rename a table.
    RenameTable {
        /// Current table name.
        table: String,
        /// New table name.
        to: String,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        table: String,

        /// Do nothing if the table does not exist.
        #[arg(long)]
        if_exists: bool,
    },

    /// Report rows with dangling foreign keys.
    Check {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let assumed_version = cli
        .assume_version
        .as_deref()
        .map(str::parse::<SqliteVersion>)
        .transpose()?;

    let mut conn = SqliteConnection::connect(&cli.database).await?;

    let mut changer = match assumed_version {
        Some(version) => {
            info!(version = %version, "Assuming SQLite version");
            SchemaChanger::with_version(&mut conn, version)
        }
        None => SchemaChanger::new(&mut conn).await?,
    };

    match cli.command {
        Commands::Inspect { table, json } => {
            let mut reader = SchemaReader::new(&mut conn);
            let tables = match table {
                Some(table) => vec![reader.table_definition(&table).await?],
                None => reader.table_definitions().await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                for table in &tables {
                    println!("{};", table.to_sql(false)?);
                    for index in &table.indexes {
                        println!("{};", index.to_sql(false));
                    }
                    println!();
                }
            }
        }

        Commands::DropColumn { table, column } => {
            changer
                .alter_table(&table, |t| {
                    t.drop_column(column.as_str());
                })
                .await?;
            info!("Dropped column {table}.{column}");
        }

        Commands::RenameColumn { table, from, to } => {
            changer
                .alter_table(&table, |t| {
                    t.rename_column(from.as_str(), to.as_str());
                })
                .await?;
            info!("Renamed column {table}.{from} to {to}");
        }

        Commands::RenameTable { table, to } => {
            changer.rename_table(&table, &to).await?;
            info!("Renamed table {table} to {to}");
        }

        Commands::DropTable { table, if_exists } => {
            changer.drop_table(&table, if_exists).await?;
            info!("Dropped table {table}");
        }

        Commands::Check { json } => {
            let violations = pragma::foreign_key_check(&mut conn).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&violations)?);
            } else if violations.is_empty() {
                info!("No foreign key violations.");
            } else {
                println!("\nForeign key violations:");
                println!("{:-<60}", "");
                for violation in &violations {
                    println!(" {violation}");
                }
                println!();
            }

            if !violations.is_empty() {
                anyhow::bail!("{} foreign key violation(s)", violations.len());
            }
        }
    }

    Ok(())
}
