//! Command handlers.
//!
//! Each handler prints its result to stdout; failures bubble up to `main`.

use std::path::Path;

use anyhow::{bail, Context};
use lemon_types::{MenuItem, UserProfile, NOTIFICATION_PREFERENCES};

use crate::app::App;

/// Profile fields a command may set. `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct ProfileFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileFields {
    /// Produce the full record to commit.
    fn apply(self, mut user: UserProfile) -> UserProfile {
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.phone_number {
            user.phone_number = v;
        }
        if let Some(v) = self.avatar {
            user.avatar = v;
        }
        user
    }
}

/// Load a menu document into the cache.
pub async fn seed(app: &App, file: &Path) -> anyhow::Result<()> {
    let report = app.load_menu_file(file).await?;
    println!(
        "stored {} item(s), {} failed",
        report.stored.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  item {}: {}", failure.id, failure.reason);
    }
    Ok(())
}

/// Print cached items matching `search` within `categories`.
///
/// Categories are passed through as given. None selects every configured
/// section plus any other category present in the cache.
pub async fn menu(app: &App, search: &str, categories: &[String]) -> anyhow::Result<()> {
    let items = find_items(app, search, categories).await?;
    if items.is_empty() {
        println!("no matching dishes");
    }
    for item in &items {
        println!("{}", format_item(item));
    }
    Ok(())
}

async fn find_items(
    app: &App,
    search: &str,
    categories: &[String],
) -> anyhow::Result<Vec<MenuItem>> {
    if categories.is_empty() {
        let filter = app.full_category_filter().await?;
        return Ok(app.menu.query(search, filter.active_categories()).await?);
    }
    Ok(app.menu.query(search, categories).await?)
}

fn format_item(item: &MenuItem) -> String {
    format!(
        "{:>4}  {:<24} {:<10} ${}",
        item.id, item.name, item.category, item.price
    )
}

/// Log in with a new profile. Every notification starts enabled.
pub async fn login(app: &App, fields: ProfileFields) -> anyhow::Result<()> {
    if app.session.snapshot().is_logged_in() {
        bail!("already logged in; use `profile` to edit or `logout` first");
    }
    let mut user = fields.apply(UserProfile::default());
    if user.first_name.is_empty() || user.email.is_empty() {
        bail!("first name and email are required");
    }
    user.notification = NOTIFICATION_PREFERENCES
        .iter()
        .map(|(key, _)| (key.to_string(), true))
        .collect();

    app.session.commit(user.clone()).await?;
    println!("welcome, {}", user.first_name);
    Ok(())
}

/// Replace the stored profile with edited fields.
pub async fn update_profile(app: &App, fields: ProfileFields) -> anyhow::Result<()> {
    let current = current_user(app)?;
    app.session.commit(fields.apply(current)).await?;
    println!("profile saved");
    Ok(())
}

/// Flip one notification preference by id.
pub async fn toggle_notification(app: &App, key: &str) -> anyhow::Result<()> {
    let (_, label) = NOTIFICATION_PREFERENCES
        .iter()
        .find(|(id, _)| *id == key)
        .with_context(|| format!("unknown notification preference {key}"))?;
    let next = current_user(app)?.toggle_notification(key);
    let enabled = next.notification_enabled(key);
    app.session.commit(next).await?;
    println!("{label}: {}", if enabled { "on" } else { "off" });
    Ok(())
}

/// Print the logged-in user.
pub fn whoami(app: &App) {
    let snapshot = app.session.snapshot();
    let Some(user) = snapshot.user() else {
        println!("not logged in");
        return;
    };

    let avatar = if user.has_avatar() {
        user.avatar.clone()
    } else {
        format!("[{}]", user.initials())
    };
    println!("{avatar} {} {} <{}>", user.first_name, user.last_name, user.email);
    if !user.phone_number.is_empty() {
        println!("phone: {}", user.phone_number);
    }
    for (key, label) in NOTIFICATION_PREFERENCES {
        let mark = if user.notification_enabled(key) { "x" } else { " " };
        println!("[{mark}] {label}");
    }
}

/// Drop the menu cache and clear the session.
pub async fn logout(app: &App) -> anyhow::Result<()> {
    lemon_store::logout(&app.menu, &app.session).await?;
    println!("logged out");
    Ok(())
}

fn current_user(app: &App) -> anyhow::Result<UserProfile> {
    app.session
        .snapshot()
        .user()
        .cloned()
        .context("not logged in")
}
