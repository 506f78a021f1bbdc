//! Persisted session record and its published snapshot.
//!
//! State machine:
//!
//! ```text
//! Uninitialized --hydrate--> LoggedOut | LoggedIn
//! LoggedOut     --commit---> LoggedIn
//! LoggedIn      --commit---> LoggedIn   (record replaced)
//! LoggedIn      --clear----> LoggedOut
//! ```
//!
//! The snapshot only ever changes after the matching durable write
//! succeeded, so observers never see a state storage does not hold.

use lemon_db::queries::kv;
use lemon_db::{migrations, Layout};
use lemon_types::events::StoreEvent;
use lemon_types::{AuthState, SessionSnapshot, UserProfile, SESSION_KEY};
use tokio::sync::{watch, Mutex};

use crate::{EventBus, Result, Storage, StoreError};

/// Single source of truth for who is logged in.
///
/// Create one per process and hand it (or an `Arc` of it) to whatever needs
/// the session; observers use [`subscribe`](Self::subscribe).
pub struct SessionStore {
    storage: Storage,
    key: String,
    state: watch::Sender<SessionSnapshot>,
    events: EventBus,
    write_gate: Mutex<()>,
}

impl SessionStore {
    /// Create a store over `storage`. The record lives under `userData`.
    pub fn new(storage: Storage, events: EventBus) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::loading());
        Self {
            storage,
            key: SESSION_KEY.to_string(),
            state,
            events,
            write_gate: Mutex::new(()),
        }
    }

    /// Read the persisted record and publish the resolved state.
    ///
    /// A record that does not parse is discarded and reported through a
    /// `MalformedRecord` event; the session resolves as logged out. Calling
    /// this again re-reads storage without going back to loading.
    pub async fn hydrate(&self) -> Result<SessionSnapshot> {
        let _gate = self.write_gate.lock().await;

        let key = self.key.clone();
        let raw = self
            .storage
            .call(move |conn| {
                migrations::ensure(conn, Layout::KeyValue)?;
                kv::get(conn, &key)
            })
            .await
            .map_err(|e| e.or_unavailable(StoreError::StorageUnavailable))?;

        let user = match raw {
            None => None,
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    self.discard_malformed(e).await;
                    None
                }
            },
        };

        let snapshot = SessionSnapshot::from_record(user);
        tracing::info!(logged_in = snapshot.is_logged_in(), "session hydrated");
        self.state.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    async fn discard_malformed(&self, error: serde_json::Error) {
        tracing::warn!(key = %self.key, %error, "discarding malformed session record");
        self.events.emit(StoreEvent::MalformedRecord {
            key: self.key.clone(),
            error: error.to_string(),
        });

        let key = self.key.clone();
        if let Err(e) = self.storage.call(move |conn| kv::remove(conn, &key)).await {
            tracing::warn!(key = %self.key, error = %e, "could not remove malformed session record");
        }
    }

    /// Replace the persisted record wholesale and publish it.
    pub async fn commit(&self, user: UserProfile) -> Result<()> {
        self.ensure_hydrated()?;
        let _gate = self.write_gate.lock().await;

        let value = serde_json::to_string(&user)
            .map_err(|e| StoreError::PersistenceWriteFailed(e.to_string()))?;
        let key = self.key.clone();
        self.storage
            .call(move |conn| kv::set(conn, &key, &value))
            .await
            .map_err(|e| StoreError::PersistenceWriteFailed(e.to_string()))?;

        self.state.send_replace(SessionSnapshot::logged_in(user));
        self.events.emit(StoreEvent::SessionCommitted);
        tracing::info!("session committed");
        Ok(())
    }

    /// Delete the persisted record and publish the logged-out state.
    ///
    /// Nothing stored and nothing published is a no-op.
    pub async fn clear(&self) -> Result<()> {
        self.ensure_hydrated()?;
        let _gate = self.write_gate.lock().await;

        let key = self.key.clone();
        let removed = self
            .storage
            .call(move |conn| kv::remove(conn, &key))
            .await
            .map_err(|e| StoreError::PersistenceWriteFailed(e.to_string()))?;

        if !removed && !self.state.borrow().is_logged_in() {
            tracing::debug!("no session to clear");
            return Ok(());
        }

        self.state.send_replace(SessionSnapshot::logged_out());
        self.events.emit(StoreEvent::SessionCleared);
        tracing::info!("session cleared");
        Ok(())
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().state()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn ensure_hydrated(&self) -> Result<()> {
        if self.state.borrow().is_loading() {
            return Err(StoreError::NotHydrated);
        }
        Ok(())
    }
}
