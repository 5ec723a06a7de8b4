//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `qualcode_core` linkage and storage bootstrap from a shell.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `qualcode [DB_PATH]`. Without a path an in-memory database is used.

use qualcode_core::db::{open_db, open_db_in_memory, DbError};
use qualcode_core::{ResourceStore, SqliteStore};
use rusqlite::Connection;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("qualcode_core ping={}", qualcode_core::ping());
    println!("qualcode_core version={}", qualcode_core::core_version());

    let path = std::env::args().nth(1);
    match check_store(path.as_deref()) {
        Ok(version) => {
            println!("qualcode_core schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_check module=cli status=error error={err}");
            eprintln!("qualcode: {err}");
            ExitCode::FAILURE
        }
    }
}

fn check_store(path: Option<&str>) -> Result<u32, Box<dyn std::error::Error>> {
    let conn = open(path)?;
    let store = SqliteStore::try_new(&conn)?;
    store.begin_unit()?;
    store.rollback_unit()?;
    let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

fn open(path: Option<&str>) -> Result<Connection, DbError> {
    match path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
}
