use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tablebrowser::config;
use tablebrowser::export::{export, ExportFormat};
use tablebrowser::{CellValue, Comparison, ConnectionManager, Criterion, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Browse and edit the tables of SQLite databases kept in one directory.
#[derive(Parser, Debug)]
#[command(name = "tablebrowser", version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user config if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the database files, overriding the configuration
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the databases in the storage directory
    Databases,
    /// List the tables of a database
    Tables { database: String },
    /// Print the columns and rows of a table
    Show {
        database: String,
        table: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Read one column of the row with the given key
    Get {
        database: String,
        table: String,
        column: String,
        key_column: String,
        key: String,
    },
    /// Set one column of the rows with the given key
    Set {
        database: String,
        table: String,
        key_column: String,
        key: String,
        column: String,
        value: String,
    },
    /// Insert a row, replacing any row with the same key
    Upsert {
        database: String,
        table: String,
        key_column: String,
        key: String,
        /// Further values as column=value
        #[arg(value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
    /// Delete the rows matching every column=value condition
    Delete {
        database: String,
        table: String,
        #[arg(value_parser = parse_assignment, required = true)]
        conditions: Vec<(String, String)>,
    },
}

fn parse_assignment(arg: &str) -> std::result::Result<(String, String), String> {
    arg.split_once('=')
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected column=value, got '{}'", arg))
}

fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting tablebrowser...");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = config::load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.dir {
        config.storage.directory = dir;
    }
    let mut manager = ConnectionManager::new(&config);

    match cli.command {
        Command::Databases => {
            for name in manager.list_database_names()? {
                println!("{}", name);
            }
        }
        Command::Tables { database } => {
            manager.open(&database)?;
            for name in manager.list_tables()? {
                println!("{}", name);
            }
        }
        Command::Show {
            database,
            table,
            format,
        } => {
            let format: ExportFormat = format.parse()?;
            manager.open(&database)?;
            let data = manager.table(&table).load()?;
            print!("{}", export(&data, format)?);
            if format == ExportFormat::Json {
                println!();
            }
        }
        Command::Get {
            database,
            table,
            column,
            key_column,
            key,
        } => {
            manager.open(&database)?;
            let text = manager
                .table(&table)
                .query_string_or_not_found(&column, &key_column, key)?;
            println!("{}", text);
        }
        Command::Set {
            database,
            table,
            key_column,
            key,
            column,
            value,
        } => {
            manager.open(&database)?;
            let changed = manager.table(&table).set_value(&key_column, key, &column, value)?;
            println!("{} rows updated", changed);
        }
        Command::Upsert {
            database,
            table,
            key_column,
            key,
            values,
        } => {
            manager.open(&database)?;
            let values: Vec<(&str, CellValue)> = values
                .iter()
                .map(|(column, value)| (column.as_str(), CellValue::from(value.as_str())))
                .collect();
            let written = manager.table(&table).upsert(&key_column, key, &values)?;
            println!("{} rows written", written);
        }
        Command::Delete {
            database,
            table,
            conditions,
        } => {
            manager.open(&database)?;
            let criterion = conditions
                .iter()
                .fold(Criterion::new(), |criterion, (column, value)| {
                    criterion.and(column, Comparison::Eq, value.as_str())
                });
            let deleted = manager.table(&table).delete(&criterion)?;
            println!("{} rows deleted", deleted);
        }
    }

    manager.close()
}
