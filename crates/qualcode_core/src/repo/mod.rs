//! Resource store contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define one repository trait per collection (`project`, `document`, `quote`, `code`).
//! - Keep SQL and row decoding inside the persistence boundary.
//! - Expose savepoint-based units so callers can group several writes.
//!
//! # Invariants
//! - Stores never apply authorization; callers pass a `ScopePredicate` computed upstream.
//! - Removal of a missing row is reported as `Ok(false)`, never as an error.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod code_repo;
pub mod document_repo;
pub mod project_repo;
pub mod quote_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::audit::AuditFields;
use crate::model::principal::Principal;
use crate::model::scope::ScopePredicate;
use log::warn;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use code_repo::CodeRepository;
pub use document_repo::DocumentRepository;
pub use project_repo::ProjectRepository;
pub use quote_repo::{QuoteFilter, QuoteRepository};

const UNIT_SAVEPOINT: &str = "qualcode_unit";
const REQUIRED_TABLES: &[&str] = &[
    "projects",
    "project_collaborators",
    "documents",
    "quotes",
    "codes",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "resource store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "resource store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Every collection plus unit-of-work control.
///
/// Units nest: each `begin_unit` must be matched by exactly one
/// `commit_unit` or `rollback_unit`.
pub trait ResourceStore:
    ProjectRepository + DocumentRepository + QuoteRepository + CodeRepository
{
    fn begin_unit(&self) -> RepoResult<()>;
    fn commit_unit(&self) -> RepoResult<()>;
    fn rollback_unit(&self) -> RepoResult<()>;
}

/// Runs `f` inside one store unit, rolling back when it fails.
pub fn run_in_unit<S, T, E>(store: &S, f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
where
    S: ResourceStore + ?Sized,
    E: From<RepoError>,
{
    store.begin_unit()?;
    match f() {
        Ok(value) => {
            store.commit_unit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = store.rollback_unit() {
                warn!(
                    "event=unit_rollback module=repo status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

/// SQLite-backed resource store over one migrated connection.
#[derive(Clone, Copy)]
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }

    /// Runs several statements atomically, nesting inside any open unit.
    pub(crate) fn with_savepoint<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.conn.execute_batch(&format!("SAVEPOINT {name};"))?;
        match f(self.conn) {
            Ok(value) => {
                self.conn.execute_batch(&format!("RELEASE SAVEPOINT {name};"))?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch(&format!(
                    "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name};"
                ))?;
                Err(err)
            }
        }
    }
}

impl ResourceStore for SqliteStore<'_> {
    fn begin_unit(&self) -> RepoResult<()> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {UNIT_SAVEPOINT};"))?;
        Ok(())
    }

    fn commit_unit(&self) -> RepoResult<()> {
        self.conn
            .execute_batch(&format!("RELEASE SAVEPOINT {UNIT_SAVEPOINT};"))?;
        Ok(())
    }

    fn rollback_unit(&self) -> RepoResult<()> {
        self.conn.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {UNIT_SAVEPOINT}; RELEASE SAVEPOINT {UNIT_SAVEPOINT};"
        ))?;
        Ok(())
    }
}

/// Appends the SQL condition for `scope` on `project_column` and its bind values.
pub(crate) fn scope_clause(
    scope: &ScopePredicate,
    project_column: &str,
    bind_values: &mut Vec<Value>,
) -> String {
    match scope {
        ScopePredicate::VisibleTo(principal) => {
            bind_values.push(Value::Text(principal.as_str().to_string()));
            bind_values.push(Value::Text(principal.as_str().to_string()));
            format!(
                "{project_column} IN (
                    SELECT p.project_uuid
                    FROM projects p
                    WHERE p.owner = ?
                       OR EXISTS (
                           SELECT 1
                           FROM project_collaborators c
                           WHERE c.project_uuid = p.project_uuid
                             AND c.email = ?
                       )
                )"
            )
        }
        ScopePredicate::InProject(project) => {
            bind_values.push(Value::Text(project.to_string()));
            format!("{project_column} = ?")
        }
        ScopePredicate::Unrestricted => "1 = 1".to_string(),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_principal(value: &str, column: &'static str) -> RepoResult<Principal> {
    Principal::parse(value)
        .map_err(|err| RepoError::InvalidData(format!("{err} in {column}")))
}

pub(crate) fn parse_audit(row: &Row<'_>, table: &'static str) -> RepoResult<AuditFields> {
    let created_by: String = row.get("created_by")?;
    let modified_by: String = row.get("modified_by")?;
    Ok(AuditFields {
        created_by: parse_principal(&created_by, table)?,
        modified_by: parse_principal(&modified_by, table)?,
        modified_at: row.get("modified_at")?,
    })
}

pub(crate) fn encode_json<T: Serialize>(value: &T, column: &'static str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode {column}: {err}")))
}

pub(crate) fn decode_json<T: DeserializeOwned>(value: &str, column: &'static str) -> RepoResult<T> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
