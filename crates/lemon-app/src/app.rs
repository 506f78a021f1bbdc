//! App-wide state: both persistence components wired to one event bus.

use std::path::Path;

use anyhow::Context;
use lemon_store::{EventBus, LoadReport, MenuCache, SessionStore, Storage};
use lemon_types::CategoryFilter;

use crate::config::AppConfig;
use crate::remote;

/// Owned by `main` and passed by reference to every command.
pub struct App {
    pub config: AppConfig,
    pub events: EventBus,
    pub menu: MenuCache,
    pub session: SessionStore,
}

impl App {
    /// Open both databases, make sure the menu table exists and hydrate the
    /// session. Any storage failure here stops startup.
    pub async fn start(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;

        let events = EventBus::new(256);

        let menu_storage = Storage::open(config.menu_db_path()).await?;
        let menu = MenuCache::new(menu_storage, events.clone());
        menu.ensure_schema().await?;

        let preferences = Storage::open(config.preferences_db_path()).await?;
        let session = SessionStore::new(preferences, events.clone());
        session.hydrate().await?;

        let app = Self {
            config,
            events,
            menu,
            session,
        };
        app.seed_if_empty().await?;
        Ok(app)
    }

    /// Load the configured seed file when the cache holds no rows.
    async fn seed_if_empty(&self) -> anyhow::Result<Option<LoadReport>> {
        let Some(path) = self.config.menu.seed_file.as_deref() else {
            return Ok(None);
        };
        if self.menu.count().await? > 0 {
            return Ok(None);
        }
        tracing::info!(path = %path.display(), "seeding empty menu cache");
        self.load_menu_file(path).await.map(Some)
    }

    /// Parse a remote menu document from disk and bulk-load it.
    pub async fn load_menu_file(&self, path: &Path) -> anyhow::Result<LoadReport> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading menu file {}", path.display()))?;
        let items = remote::parse_menu(&json)?;
        Ok(self.menu.bulk_load(items).await?)
    }

    /// Configured sections followed by any other cached category, all
    /// selected.
    pub async fn full_category_filter(&self) -> anyhow::Result<CategoryFilter> {
        let mut sections = self.config.menu.categories.clone();
        for stored in self.menu.categories().await? {
            let folded = stored.to_lowercase();
            if !sections.iter().any(|s| s.to_lowercase() == folded) {
                sections.push(stored);
            }
        }

        let mut filter = CategoryFilter::new(sections);
        filter.select_all();
        Ok(filter)
    }
}
