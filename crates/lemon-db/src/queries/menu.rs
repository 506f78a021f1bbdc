//! Menu cache queries.

use std::collections::BTreeSet;

use lemon_types::MenuItem;
use rusqlite::{Connection, ErrorCode, Row};

use crate::{DbError, Result, UNICODE_LOWER};

const COLUMNS: &str = "id, name, description, price, image, category";

/// Insert one menu row.
///
/// An existing `id` is reported as [`DbError::Constraint`]; the stored row
/// is left untouched.
pub fn insert(conn: &Connection, item: &MenuItem) -> Result<()> {
    if item.name.trim().is_empty() {
        return Err(DbError::InvalidRow(format!("item {} has an empty name", item.id)));
    }

    conn.execute(
        "INSERT INTO menuitems (id, name, description, price, image, category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            item.id,
            item.name,
            item.description,
            item.price,
            item.image,
            item.category,
        ],
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            DbError::Constraint(format!("menu item {} already exists", item.id))
        }
        _ => DbError::Sqlite(e),
    })?;
    Ok(())
}

/// List every row in storage order.
pub fn list(conn: &Connection) -> Result<Vec<MenuItem>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM menuitems ORDER BY rowid"))?;

    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// List rows whose lowercased category is one of `categories`.
///
/// `categories` are expected lowercased with `str::to_lowercase`; the
/// stored side is folded the same way through `unicode_lower`. An empty set yields no
/// rows without touching the database.
pub fn list_by_categories(
    conn: &Connection,
    categories: &BTreeSet<String>,
) -> Result<Vec<MenuItem>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; categories.len()].join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM menuitems WHERE {UNICODE_LOWER}(category) IN ({placeholders}) ORDER BY rowid"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(categories.iter()), from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Distinct stored categories, in order of first appearance.
pub fn categories(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT category FROM menuitems
         WHERE category IS NOT NULL AND category != ''
         GROUP BY category ORDER BY MIN(rowid)",
    )?;

    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of cached rows.
pub fn count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM menuitems", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Drop the cache table. Missing table is not an error.
pub fn drop_table(conn: &Connection) -> Result<()> {
    conn.execute_batch("DROP TABLE IF EXISTS menuitems;")?;
    Ok(())
}

// Older releases declared every column but `id` nullable.
fn from_row(row: &Row<'_>) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        price: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        image: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        category: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}
