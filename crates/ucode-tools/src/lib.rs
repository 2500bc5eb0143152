//! Ucode tools: typed clients for the ucode public API, exposed as invocable tools.

pub mod client;
pub mod dbml;
pub mod fields;
pub mod menus;
pub mod tables;
pub mod tool;
pub mod types;

use std::sync::Arc;

pub use client::{UcodeClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use tool::{parse_args, Tool};
pub use types::*;

/// Every tool this crate provides, in the order they are advertised.
pub fn all_tools(client: &UcodeClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(fields::CreateField::new(client.clone())),
        Arc::new(tables::CreateTable::new(client.clone())),
        Arc::new(menus::CreateMenu::new(client.clone())),
        Arc::new(tables::CreateTableItem::new(client.clone())),
        Arc::new(dbml::DbmlToUcode::new(client.clone())),
        Arc::new(dbml::GetDbml::new(client.clone())),
        Arc::new(menus::GetMenus::new(client.clone())),
        Arc::new(tables::GetTableDetails::new(client.clone())),
        Arc::new(tables::UpdateTable::new(client.clone())),
    ]
}
