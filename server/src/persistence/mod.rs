//! DB connection handling and schema bootstrap.
//!
//! Connections are scoped: the offline command path opens one per call and
//! releases it before returning. The schema DDL is embedded and executed at
//! server startup; every statement is idempotent.

pub(crate) mod character_row;
mod error;
mod schema;

use rusqlite::Connection;
use std::{path::PathBuf, time::Duration};
use tracing::{info, trace};

pub use error::PersistenceError;

/// Runtime SQL logging behaviour, adjustable while the server is up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlLogMode {
    Disabled,
    /// Logs every executed statement at TRACE level.
    Trace,
}

#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub db_dir: PathBuf,
    pub sql_log_mode: SqlLogMode,
}

impl DatabaseSettings {
    pub fn db_file(&self) -> PathBuf { self.db_dir.join("solstice.sqlite") }
}

/// A database connection blessed by the server.
pub struct GameDbConnection {
    pub(crate) connection: Connection,
}

fn sql_trace(statement: &str) { trace!("{}", statement); }

pub fn establish_connection(
    settings: &DatabaseSettings,
) -> Result<GameDbConnection, PersistenceError> {
    std::fs::create_dir_all(&settings.db_dir).map_err(|e| {
        PersistenceError::OtherError(format!(
            "Failed to create database directory {}: {}",
            settings.db_dir.display(),
            e
        ))
    })?;

    let mut connection = Connection::open(settings.db_file())
        .map_err(PersistenceError::DatabaseConnectionError)?;

    // Use Write-Ahead-Logging for improved concurrency: https://sqlite.org/wal.html
    // Set a busy timeout (in ms): https://sqlite.org/c3ref/busy_timeout.html
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(PersistenceError::DatabaseConnectionError)?;
    let _journal_mode: String = connection
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(PersistenceError::DatabaseConnectionError)?;
    connection
        .busy_timeout(Duration::from_millis(250))
        .map_err(PersistenceError::DatabaseConnectionError)?;

    if settings.sql_log_mode == SqlLogMode::Trace {
        connection.trace(Some(sql_trace));
    }

    Ok(GameDbConnection { connection })
}

/// Brings the schema up to date. Executed during server startup; a server
/// that cannot bootstrap its schema must not come up.
pub fn run_migrations(settings: &DatabaseSettings) -> Result<(), PersistenceError> {
    let conn = establish_connection(settings)?;
    conn.connection.execute_batch(schema::DDL)?;
    info!("Database schema is up to date");
    Ok(())
}
