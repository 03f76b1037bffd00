//! Photon Elf - live coincidence-count display
//!
//! `photon-elf gui` runs the window (spawned by the host with its stdin/stdout
//! as the message pipe). `photon-elf demo` plays the host role with synthetic
//! count rates.

use anyhow::Result;
use clap::{Parser, Subcommand};
use photon_elf::ipc::{GuiProcess, IpcError, Message, NullTransport, PipeTransport, Transport};
use photon_elf::settings::JsonFileStore;
use photon_elf::ui::window::{self, DisplayWindow};
use photon_elf::CountRates;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long the demo host waits for the window to acknowledge shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Live coincidence-count display
#[derive(Parser, Debug)]
#[command(name = "photon-elf", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the display window, reading messages from stdin
    Gui {
        /// Run without a host (no pipe on stdin/stdout)
        #[arg(long)]
        standalone: bool,

        /// Settings file (defaults to the per-user config directory)
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Start a window process and feed it synthetic count rates
    Demo {
        /// Number of single channels (pairs are added automatically)
        #[arg(short, long, default_value_t = 4)]
        channels: usize,

        /// Milliseconds between count rate updates
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,

        /// Settings file passed to the window process
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr: stdout is the message pipe in the GUI process
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("photon_elf=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Gui {
            standalone,
            settings,
        }) => run_gui(standalone, settings),
        Some(Commands::Demo {
            channels,
            interval_ms,
            settings,
        }) => run_demo(channels, Duration::from_millis(interval_ms), settings),
        None => run_gui(true, None),
    }
}

fn run_gui(standalone: bool, settings: Option<PathBuf>) -> Result<()> {
    let store = settings
        .map(JsonFileStore::new)
        .unwrap_or_else(JsonFileStore::at_default_path);
    info!(
        settings = %store.path().display(),
        standalone,
        "Starting Photon Elf v{}",
        photon_elf::VERSION
    );

    let transport: Box<dyn Transport> = if standalone {
        Box::new(NullTransport)
    } else {
        Box::new(PipeTransport::stdio()?)
    };

    window::run(DisplayWindow::new(transport, Box::new(store)))
}

fn run_demo(channels: usize, interval: Duration, settings: Option<PathBuf>) -> Result<()> {
    let names = demo_channels(channels);
    info!(channels = names.len(), "Starting demo host");

    let mut gui = GuiProcess::spawn(settings.as_deref())?;

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .ok();

    gui.send(Message::Status("Connected".to_string()));

    let start = Instant::now();
    let mut gui_gone = false;
    while running.load(Ordering::SeqCst) {
        let t = start.elapsed().as_secs_f64();
        gui.send(Message::CountRates(demo_rates(&names, t)));

        match gui.recv(interval) {
            Ok(Some(Message::GuiQuit)) => {
                info!("Window closed by user");
                gui_gone = true;
                break;
            }
            Ok(Some(other)) => debug!(key = other.key(), "Ignoring message from GUI"),
            Ok(None) => {}
            Err(IpcError::Disconnected) => {
                warn!("GUI process exited without saying goodbye");
                gui_gone = true;
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !gui_gone {
        info!("Stopping...");
        gui.shutdown();
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("GUI did not acknowledge shutdown");
                break;
            }
            match gui.recv(remaining) {
                Ok(Some(Message::GuiQuit)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    gui.wait()?;
    Ok(())
}

/// Single channels `a`, `b`, ... followed by every two-fold coincidence
fn demo_channels(singles: usize) -> Vec<String> {
    let letters: Vec<char> = ('a'..='z').take(singles.clamp(1, 26)).collect();
    let mut names: Vec<String> = letters.iter().map(|c| c.to_string()).collect();
    for (i, a) in letters.iter().enumerate() {
        for b in &letters[i + 1..] {
            names.push(format!("{}{}", a, b));
        }
    }
    names
}

/// Smoothly varying fake rates: singles near 1000/s, pairs near 20/s
fn demo_rates(names: &[String], t: f64) -> CountRates {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let phase = t + i as f64;
            let rate = if name.len() == 1 {
                1000.0 + 200.0 * phase.sin()
            } else {
                20.0 + 5.0 * (0.5 * phase).cos()
            };
            (name.clone(), rate.round())
        })
        .collect()
}
