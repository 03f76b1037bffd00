//! Photon Elf - live coincidence-count display
//!
//! A small GUI that shows count rates coming from a photon counting
//! instrument. The host application talks to it through [`GuiProcess`],
//! which runs the [`DisplayWindow`] in its own process and exchanges
//! `(key, value)` messages over a pipe.

pub mod ipc;
pub mod settings;
pub mod ui;

pub use ipc::{CountRates, GuiProcess, IpcError, Message, Transport};
pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsStore};
pub use ui::{ChannelBrowser, CountGraph, DisplayWindow};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
