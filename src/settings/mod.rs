//! Persistent window settings
//!
//! Settings are an explicit value handed to the window at construction and
//! written back when it closes. Loading and saving go through a
//! [`store::SettingsStore`] so the window never touches global state.

pub mod store;

use serde::{Deserialize, Serialize};

/// Name of the setting holding the browser search patterns
pub const BROWSER_SEARCHES_KEY: &str = "realtime.browser_searches";

/// Settings consumed and produced by the display window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Channel browser search patterns in effect when the window last closed
    #[serde(rename = "realtime.browser_searches", default)]
    pub browser_searches: Vec<String>,
    /// Keys owned by other tools sharing the settings file
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

pub use store::{JsonFileStore, MemoryStore, SettingsError, SettingsStore};
