//! User interface module
//!
//! Contains:
//! - The display window and its poll loop ([`window`])
//! - Channel browser with pattern filtering ([`browser`])
//! - Count rate graph ([`graph`])

pub mod browser;
pub mod graph;
pub mod window;

pub use browser::ChannelBrowser;
pub use graph::CountGraph;
pub use window::{DisplayWindow, PollSchedule, TickReport, WindowState};
