//! Transport capabilities for the display window
//!
//! The window never blocks on its inbound side: a [`Transport`] only offers a
//! non-blocking `try_recv`. Implementations:
//! - [`PipeTransport`]: line-delimited JSON over a reader/writer pair
//!   (stdin/stdout of the GUI process)
//! - [`NullTransport`]: receives nothing, discards everything (standalone mode)
//! - [`MemoryTransport`]: in-process channel pair, used to drive the window
//!   from tests or an embedding host

use super::message::{write_message, Message};
use super::IpcError;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::io::{BufRead, BufReader, Read, Write};
use std::thread::JoinHandle;

/// Messages buffered between a pipe reader thread and its consumer
///
/// When the queue is full the reader stops reading, so the OS pipe fills and
/// the writing process blocks.
pub const INBOUND_CAPACITY: usize = 256;

/// Duplex message endpoint used by the display window
pub trait Transport: Send {
    /// Return the next pending message, if any, without blocking
    fn try_recv(&mut self) -> Result<Option<Message>, IpcError>;

    /// Send a message to the peer
    fn send(&mut self, message: &Message) -> Result<(), IpcError>;
}

/// Spawn a thread that decodes lines from `reader` into `sender`
///
/// Malformed lines are logged and skipped. The thread exits on EOF, on a
/// read error, or once the receiving side is dropped; the sender is dropped
/// with it so the receiver observes a disconnect.
pub(crate) fn spawn_reader<R>(
    name: &str,
    reader: R,
    sender: Sender<Message>,
) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Pipe read failed: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Message::decode(&line) {
                    Ok(message) => {
                        if sender.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(line = %line, error = %e, "Dropping malformed message"),
                }
            }
            tracing::debug!("Pipe reader finished");
        })
}

/// Transport over a byte stream pair
pub struct PipeTransport {
    inbound: Receiver<Message>,
    outbound: Box<dyn Write + Send>,
    _reader: JoinHandle<()>,
}

impl PipeTransport {
    /// Create a transport that reads from `reader` and writes to `writer`
    pub fn new<R, W>(reader: R, writer: W) -> Result<Self, IpcError>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(INBOUND_CAPACITY);
        let handle = spawn_reader("photon-elf-pipe-reader", BufReader::new(reader), tx)?;
        Ok(Self {
            inbound: rx,
            outbound: Box::new(writer),
            _reader: handle,
        })
    }

    /// Number of decoded messages waiting to be received
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Transport over this process's stdin/stdout
    pub fn stdio() -> Result<Self, IpcError> {
        Self::new(std::io::stdin(), std::io::stdout())
    }
}

impl Transport for PipeTransport {
    fn try_recv(&mut self) -> Result<Option<Message>, IpcError> {
        match self.inbound.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(IpcError::Disconnected),
        }
    }

    fn send(&mut self, message: &Message) -> Result<(), IpcError> {
        write_message(&mut self.outbound, message)
    }
}

/// Transport used when the window runs without a host
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn try_recv(&mut self) -> Result<Option<Message>, IpcError> {
        Ok(None)
    }

    fn send(&mut self, _message: &Message) -> Result<(), IpcError> {
        Ok(())
    }
}

/// One end of an in-process duplex channel
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

impl MemoryTransport {
    /// Create two connected ends
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = crossbeam_channel::unbounded();
        let (b_tx, a_rx) = crossbeam_channel::unbounded();
        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }

    /// Drain every message currently queued for this end
    pub fn drain(&self) -> Vec<Message> {
        self.rx.try_iter().collect()
    }
}

impl Transport for MemoryTransport {
    fn try_recv(&mut self) -> Result<Option<Message>, IpcError> {
        match self.rx.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(IpcError::Disconnected),
        }
    }

    fn send(&mut self, message: &Message) -> Result<(), IpcError> {
        self.tx
            .send(message.clone())
            .map_err(|_| IpcError::Disconnected)
    }
}
