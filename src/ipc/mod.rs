//! Inter-process communication between the host and the GUI process
//!
//! Contains:
//! - The message type and its line-delimited JSON wire format ([`message`])
//! - Transport capabilities used by the display window ([`transport`])
//! - The process wrapper that runs the GUI in a child process ([`process`])

pub mod message;
pub mod process;
pub mod transport;

use thiserror::Error;

/// Errors that can occur on the message pipe
#[derive(Error, Debug)]
pub enum IpcError {
    #[error("Malformed message: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Invalid value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Pipe I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Peer disconnected")]
    Disconnected,

    #[error("Failed to spawn GUI process: {0}")]
    SpawnFailed(String),
}

pub use message::{CountRates, Message};
pub use process::GuiProcess;
pub use transport::{MemoryTransport, NullTransport, PipeTransport, Transport};
