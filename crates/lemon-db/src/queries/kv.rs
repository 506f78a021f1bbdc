//! Key-value slot queries.

use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// Get the value stored under `key`, if any.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

/// Store `value` under `key`, replacing any previous value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// Remove `key`. Returns whether a value was present.
pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{migrations, Layout};

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        migrations::ensure(&conn, Layout::KeyValue).expect("ensure kv layout");
        conn
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert_eq!(get(&conn, "userData").expect("get"), None);
    }

    #[test]
    fn test_set_and_get() {
        let conn = test_db();
        set(&conn, "userData", "{}").expect("set");
        assert_eq!(get(&conn, "userData").expect("get").as_deref(), Some("{}"));

        set(&conn, "userData", r#"{"firstName":"Ana"}"#).expect("overwrite");
        assert_eq!(
            get(&conn, "userData").expect("get").as_deref(),
            Some(r#"{"firstName":"Ana"}"#)
        );
    }

    #[test]
    fn test_remove() {
        let conn = test_db();
        set(&conn, "userData", "{}").expect("set");
        assert!(remove(&conn, "userData").expect("remove"));
        assert!(!remove(&conn, "userData").expect("remove again"));
        assert_eq!(get(&conn, "userData").expect("get"), None);
    }
}
