//! Flows spanning the menu cache and the session store.

use lemon_types::events::StoreEvent;
use lemon_types::AuthState;

use crate::{MenuCache, Result, SessionStore, StoreError};

/// Log the user out.
///
/// The menu table is dropped first so the next login re-seeds it. A failed
/// drop is logged and reported as a `CacheDropFailed` event but does not
/// stop the logout; only the session result reaches the caller.
///
/// Before the session is hydrated nothing is touched and `NotHydrated` is
/// returned.
pub async fn logout(cache: &MenuCache, session: &SessionStore) -> Result<()> {
    if session.state() == AuthState::Uninitialized {
        return Err(StoreError::NotHydrated);
    }

    if let Err(e) = cache.drop_all().await {
        tracing::warn!(error = %e, "menu cache cleanup failed during logout");
        cache.events().emit(StoreEvent::CacheDropFailed {
            error: e.to_string(),
        });
    }

    session.clear().await
}
