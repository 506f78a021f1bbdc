//! SQL layout definitions.

/// Menu cache table. Columns mirror the menu rows shipped by earlier app
/// releases, so existing device databases open unchanged.
pub const MENU_V1: &str = r#"
CREATE TABLE IF NOT EXISTS menuitems (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT,
    description TEXT,
    price TEXT,
    image TEXT,
    category TEXT
);
"#;

/// Key-value slot table backing device preferences and the session record.
pub const KV_V1: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

/// Which set of tables a database file carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Menu,
    KeyValue,
}

impl Layout {
    /// DDL creating this layout's tables if they are absent.
    pub fn ddl(self) -> &'static str {
        match self {
            Self::Menu => MENU_V1,
            Self::KeyValue => KV_V1,
        }
    }

    /// Tables this layout owns.
    pub fn tables(self) -> &'static [&'static str] {
        match self {
            Self::Menu => &["menuitems"],
            Self::KeyValue => &["kv"],
        }
    }
}
