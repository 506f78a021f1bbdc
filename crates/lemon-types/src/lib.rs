//! # lemon-types
//!
//! Shared domain types for the Little Lemon local persistence layer.
//! Everything here is plain data: the SQLite access lives in `lemon-db`,
//! the async components in `lemon-store`.

pub mod events;
pub mod menu;
pub mod session;

pub use menu::{CategoryFilter, MenuItem};
pub use session::{AuthState, SessionSnapshot, UserProfile, NOTIFICATION_PREFERENCES};

/// Primary identity of a menu row, assigned by the remote menu source.
pub type MenuItemId = i64;

/// Key of the preferences slot holding the serialized session record.
pub const SESSION_KEY: &str = "userData";

/// Filter sections shown on the home screen, in display order.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["starters", "mains", "desserts", "drinks"];
