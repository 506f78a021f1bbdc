//! Layout versioning.
//!
//! The layout version lives in `PRAGMA user_version`. Migrations are
//! forward-only: a file written by a newer release is refused rather than
//! guessed at.

use rusqlite::Connection;

use crate::{DbError, Layout, Result, SCHEMA_VERSION};

/// Create `layout`'s tables if absent and bring the version stamp up to date.
///
/// Safe to call on every startup and after a table was dropped.
pub fn ensure(conn: &Connection, layout: Layout) -> Result<()> {
    let current_version = version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "Database version {current_version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    let missing = !is_applied(conn, layout)?;
    conn.execute_batch(layout.ddl()).map_err(DbError::Sqlite)?;
    if missing && current_version != 0 {
        tracing::info!(?layout, "Recreated missing tables");
    }

    if current_version == 0 {
        tracing::info!(?layout, "Initializing database layout v{SCHEMA_VERSION}");
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(DbError::Sqlite)?;
    } else if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            tracing::info!(?layout, "Running migration to v{version}");
            run_migration(conn, layout, version)?;
            conn.pragma_update(None, "user_version", version)
                .map_err(DbError::Sqlite)?;
        }
    }

    Ok(())
}

/// Read the stored layout version (0 for a fresh file).
pub fn version(conn: &Connection) -> Result<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(DbError::Sqlite)
}

/// True if every table of `layout` exists.
pub fn is_applied(conn: &Connection, layout: Layout) -> Result<bool> {
    for table in layout.tables() {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [table],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Run a specific migration.
fn run_migration(_conn: &Connection, layout: Layout, version: u32) -> Result<()> {
    match version {
        // Future migrations go here:
        // 2 => migration_v2(conn, layout),
        _ => Err(DbError::Migration(format!(
            "Unknown migration version {version} for {layout:?}"
        ))),
    }
}
