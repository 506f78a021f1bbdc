//! # lemon-db
//!
//! Synchronous SQLite access for the Little Lemon persistence layer.
//!
//! Two database files share this crate:
//! - the menu database, holding the `menuitems` cache table
//! - the preferences database, holding the `kv` slot table
//!
//! ## Persisted layout
//!
//! - WAL journal where the platform supports it
//! - Layout version stored in `PRAGMA user_version`
//! - Tables are created with `IF NOT EXISTS`, so applying a layout twice is
//!   harmless
//! - `unicode_lower(text)` is registered on every connection; SQLite's
//!   built-in `lower()` only folds ASCII

pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;

pub use schema::Layout;

/// Current persisted layout version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create a database file at the given path.
///
/// Only configures the connection; layouts are applied separately with
/// [`migrations::ensure`].
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    register_functions(conn)?;
    Ok(())
}

/// Name of the Unicode-aware lowercase SQL function.
pub const UNICODE_LOWER: &str = "unicode_lower";

/// Register SQL functions the queries depend on.
///
/// `unicode_lower` folds with Rust's `str::to_lowercase`, so SQL-side and
/// Rust-side comparisons agree on non-ASCII text. NULL stays NULL.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        UNICODE_LOWER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}
