//! # lemon-store
//!
//! Async persistence components for the Little Lemon app.
//!
//! ## Modules
//!
//! - [`storage`]: a SQLite connection owned by a worker thread, driven
//!   through an async request/response channel.
//! - [`menu_cache`]: local copy of the remote menu with category and
//!   name filtering.
//! - [`session_store`]: the persisted session record and the snapshot
//!   published to observers.
//! - [`events`]: diagnostic event bus.
//! - [`lifecycle`]: flows spanning both components (logout).
//!
//! Each operation is its own unit of durability. Writes to one table are
//! serialized; reads and writes of different components are unordered
//! relative to each other.

pub mod events;
pub mod lifecycle;
pub mod menu_cache;
pub mod session_store;
pub mod storage;

pub use events::{EventBus, EventFilter};
pub use lifecycle::logout;
pub use menu_cache::{LoadReport, MenuCache, RowFailure, RowWriteFailed};
pub use session_store::SessionStore;
pub use storage::Storage;

/// Errors surfaced by the persistence components.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying store cannot be opened or reached. Fatal to every
    /// later operation on the same component.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A single read failed. Fatal to that call only.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A durable write did not happen; in-memory state was left unchanged.
    #[error("persistence write failed: {0}")]
    PersistenceWriteFailed(String),

    /// The session store has not finished hydrating.
    #[error("session store has not been hydrated")]
    NotHydrated,
}

pub type Result<T> = std::result::Result<T, StoreError>;
