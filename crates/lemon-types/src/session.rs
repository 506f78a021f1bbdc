//! Session record and the snapshot published to observers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Notification preferences offered on the profile screen, keyed by id.
pub const NOTIFICATION_PREFERENCES: [(&str, &str); 4] = [
    ("1", "Order statuses"),
    ("2", "Password changes"),
    ("3", "Special offers"),
    ("4", "Newsletter"),
];

/// The logged-in user's profile. Persisted wholesale as JSON.
///
/// Field names are camelCase on disk to stay compatible with records
/// written by earlier app releases.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    /// Image URI, or empty when the user has not picked one.
    #[serde(default)]
    pub avatar: String,
    /// Notification preference key to enabled flag.
    #[serde(default)]
    pub notification: BTreeMap<String, bool>,
}

impl UserProfile {
    /// Uppercased first letters of first and last name, shown in place of
    /// a missing avatar.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn has_avatar(&self) -> bool {
        !self.avatar.is_empty()
    }

    pub fn notification_enabled(&self, key: &str) -> bool {
        self.notification.get(key).copied().unwrap_or(false)
    }

    /// Return a copy with one notification preference flipped.
    ///
    /// A preference that was never set counts as disabled.
    pub fn toggle_notification(&self, key: &str) -> Self {
        let mut next = self.clone();
        let enabled = self.notification_enabled(key);
        next.notification.insert(key.to_string(), !enabled);
        next
    }
}

/// Coarse authentication state derived from a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Hydration has not resolved yet; auth-gated decisions must wait.
    Uninitialized,
    LoggedOut,
    LoggedIn,
}

/// What observers of the session store see.
///
/// `is_logged_in` is always `user.is_some()`; the constructors are the only
/// way to build one so the two cannot drift.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    is_loading: bool,
    is_logged_in: bool,
    user: Option<UserProfile>,
}

impl SessionSnapshot {
    /// Initial state before hydration resolves.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            is_logged_in: false,
            user: None,
        }
    }

    pub fn logged_out() -> Self {
        Self {
            is_loading: false,
            is_logged_in: false,
            user: None,
        }
    }

    pub fn logged_in(user: UserProfile) -> Self {
        Self {
            is_loading: false,
            is_logged_in: true,
            user: Some(user),
        }
    }

    /// Build a resolved snapshot from whatever record storage holds.
    pub fn from_record(user: Option<UserProfile>) -> Self {
        match user {
            Some(user) => Self::logged_in(user),
            None => Self::logged_out(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn state(&self) -> AuthState {
        if self.is_loading {
            AuthState::Uninitialized
        } else if self.is_logged_in {
            AuthState::LoggedIn
        } else {
            AuthState::LoggedOut
        }
    }
}
