//! Runs the display window in a child process
//!
//! The child is this executable re-invoked with the `gui` subcommand. Messages
//! go to it over its stdin and come back over its stdout, so a slow or
//! crashing window never blocks the host.

use super::message::{write_message, Message};
use super::transport::{spawn_reader, INBOUND_CAPACITY};
use super::IpcError;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::io::BufReader;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

/// Poll interval while waiting for the GUI process to exit
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Host-side handle to a GUI process
pub struct GuiProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    inbound: Receiver<Message>,
    reader: Option<JoinHandle<()>>,
}

impl GuiProcess {
    /// Start the display window in a new process
    ///
    /// # Arguments
    /// * `settings` - Settings file for the window (None = default location)
    pub fn spawn(settings: Option<&Path>) -> Result<Self, IpcError> {
        let exe = std::env::current_exe()?;
        let mut command = Command::new(exe);
        command.arg("gui");
        if let Some(path) = settings {
            command.arg("--settings").arg(path);
        }
        Self::spawn_command(command)
    }

    /// Start any command that speaks the line-delimited message protocol
    /// on its stdin/stdout
    pub fn spawn_command(mut command: Command) -> Result<Self, IpcError> {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = command
            .spawn()
            .map_err(|e| IpcError::SpawnFailed(format!("{:?}: {}", command.get_program(), e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| IpcError::SpawnFailed("stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| IpcError::SpawnFailed("stdout was not captured".to_string()))?;

        let (tx, rx) = crossbeam_channel::bounded(INBOUND_CAPACITY);
        let reader = spawn_reader("photon-elf-host-reader", BufReader::new(stdout), tx)?;

        tracing::info!(pid = child.id(), "GUI process started");

        Ok(Self {
            child,
            stdin: Some(stdin),
            inbound: rx,
            reader: Some(reader),
        })
    }

    /// Send a message to the GUI without waiting for it to be handled
    ///
    /// Failures are logged, never returned: the display is best-effort.
    pub fn send(&mut self, message: Message) {
        let Some(stdin) = self.stdin.as_mut() else {
            tracing::debug!(key = message.key(), "GUI pipe closed, dropping message");
            return;
        };
        if let Err(e) = write_message(stdin, &message) {
            tracing::warn!(key = message.key(), error = %e, "Failed to send message to GUI");
            self.stdin = None;
        }
    }

    /// Wait up to `timeout` for a message from the GUI
    ///
    /// A zero timeout checks once and returns immediately. `Ok(None)` means
    /// the timeout elapsed; once the GUI has exited and every message it
    /// sent has been received, this returns [`IpcError::Disconnected`].
    pub fn recv(&self, timeout: Duration) -> Result<Option<Message>, IpcError> {
        if timeout.is_zero() {
            match self.inbound.try_recv() {
                Ok(message) => Ok(Some(message)),
                Err(TryRecvError::Empty) => Ok(None),
                Err(TryRecvError::Disconnected) => Err(IpcError::Disconnected),
            }
        } else {
            match self.inbound.recv_timeout(timeout) {
                Ok(message) => Ok(Some(message)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(IpcError::Disconnected),
            }
        }
    }

    /// Ask the GUI to close
    pub fn shutdown(&mut self) {
        self.send(Message::Shutdown);
    }

    /// OS process id of the GUI
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Check whether the GUI process is still alive
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Close the pipe to the GUI and wait for the process to exit
    ///
    /// Messages still arriving are discarded so a GUI blocked on a full pipe
    /// can finish.
    pub fn wait(mut self) -> Result<ExitStatus, IpcError> {
        self.stdin = None;
        let status = loop {
            self.discard_pending();
            if let Some(status) = self.child.try_wait()? {
                break status;
            }
            std::thread::sleep(WAIT_POLL_INTERVAL);
        };
        if let Some(reader) = self.reader.take() {
            while !reader.is_finished() {
                self.discard_pending();
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
            if reader.join().is_err() {
                tracing::warn!("GUI pipe reader panicked");
            }
        }
        tracing::info!(?status, "GUI process exited");
        Ok(status)
    }
}

impl GuiProcess {
    fn discard_pending(&self) {
        for message in self.inbound.try_iter() {
            tracing::debug!(key = message.key(), "Discarding message received during shutdown");
        }
    }
}

impl Drop for GuiProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            tracing::debug!(pid = self.child.id(), "Dropping handle to running GUI process");
        }
    }
}
