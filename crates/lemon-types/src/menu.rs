//! Menu cache rows and the category filter state that drives queries.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::MenuItemId;

/// A single cached menu row.
///
/// `price` stays textual: locale handling and numeric parsing belong to
/// whoever renders it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub image: String,
    pub category: String,
}

impl MenuItem {
    /// Case-insensitive substring match on the item name.
    ///
    /// An empty needle matches every name.
    pub fn name_contains(&self, needle: &str) -> bool {
        needle.is_empty() || self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Selection state of the category chips on the home screen.
///
/// Each section has one flag; the selected sections form the category set
/// passed to a menu query. Nothing selected means nothing matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryFilter {
    sections: Vec<String>,
    selections: Vec<bool>,
}

impl CategoryFilter {
    /// Create a filter over `sections` with nothing selected.
    pub fn new<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sections: Vec<String> = sections.into_iter().map(Into::into).collect();
        let selections = vec![false; sections.len()];
        Self {
            sections,
            selections,
        }
    }

    /// Flip the selection of the section at `index`. Out-of-range indexes
    /// are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(selected) = self.selections.get_mut(index) {
            *selected = !*selected;
        }
    }

    /// Select every section.
    pub fn select_all(&mut self) {
        self.selections.fill(true);
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Lowercased names of the selected sections.
    pub fn active_categories(&self) -> BTreeSet<String> {
        self.sections
            .iter()
            .zip(&self.selections)
            .filter(|(_, selected)| **selected)
            .map(|(section, _)| section.to_lowercase())
            .collect()
    }
}
