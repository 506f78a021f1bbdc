//! Query functions organized by table.

pub mod kv;
pub mod menu;
