//! Mapping of the remote menu document to cache rows.
//!
//! The remote feed looks like `{"menu": [{...}, ...]}`; older dumps are a
//! bare array. Prices arrive as numbers or strings and are kept as text.

use anyhow::{bail, Context};
use lemon_types::{MenuItem, MenuItemId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteDocument {
    Wrapped { menu: Vec<RemoteItem> },
    Bare(Vec<RemoteItem>),
}

#[derive(Debug, Deserialize)]
struct RemoteItem {
    id: MenuItemId,
    name: String,
    #[serde(default)]
    description: String,
    price: serde_json::Value,
    #[serde(default)]
    image: String,
    category: String,
}

impl RemoteItem {
    fn into_menu_item(self) -> anyhow::Result<MenuItem> {
        let price = match self.price {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => bail!("item {}: unsupported price {other}", self.id),
        };
        Ok(MenuItem {
            id: self.id,
            name: self.name,
            description: self.description,
            price,
            image: self.image,
            category: self.category,
        })
    }
}

/// Parse a remote menu document into canonical rows.
pub fn parse_menu(json: &str) -> anyhow::Result<Vec<MenuItem>> {
    let document: RemoteDocument =
        serde_json::from_str(json).context("menu document is not valid JSON")?;
    let items = match document {
        RemoteDocument::Wrapped { menu } => menu,
        RemoteDocument::Bare(items) => items,
    };
    items.into_iter().map(RemoteItem::into_menu_item).collect()
}
