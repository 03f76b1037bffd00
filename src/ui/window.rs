//! The display window
//!
//! Owns the status label, the channel browser and the graph. Inbound
//! messages are drained from a [`Transport`] on a fixed schedule; the same
//! [`DisplayWindow::tick`] runs under eframe or under a test calling it
//! directly.

use super::browser::ChannelBrowser;
use super::graph::CountGraph;
use crate::ipc::{IpcError, Message, NullTransport, Transport};
use crate::settings::{Settings, SettingsStore};
use std::time::{Duration, Instant};

/// How often the inbound transport is drained
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Window title
pub const WINDOW_TITLE: &str = "PHOTON ELF";

/// Status text shown before the host reports anything
pub const INITIAL_STATUS: &str = "DPC230 status";

/// Initial window size
pub const WINDOW_SIZE: [f32; 2] = [700.0, 500.0];

/// Minimum window size
pub const MIN_WINDOW_SIZE: [f32; 2] = [400.0, 300.0];

/// Minimum width of the status/browser panel
pub const LEFT_PANEL_MIN_WIDTH: f32 = 250.0;

/// Lifecycle of the display window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Handling messages
    Running,
    /// Saving settings and notifying the host
    ClosingPersist,
    /// Closed; nothing further is processed
    Destroyed,
}

/// Fixed-interval schedule for polling the transport
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl PollSchedule {
    /// Schedule firing every `interval`, first at the first check
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check whether a tick is due at `now`, and if so consume it
    pub fn due(&mut self, now: Instant) -> bool {
        let due = match self.last_tick {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_tick = Some(now);
        }
        due
    }

    /// Time left until the next tick
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }
}

/// What one poll tick did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Messages taken off the transport and handled
    pub dispatched: usize,
    /// Whether the window closed during this tick
    pub closed: bool,
}

/// The coincidence-count display window
pub struct DisplayWindow {
    status: String,
    browser: ChannelBrowser,
    graph: CountGraph,
    transport: Box<dyn Transport>,
    store: Box<dyn SettingsStore>,
    settings: Settings,
    state: WindowState,
    schedule: PollSchedule,
    repaint_requested: bool,
}

impl DisplayWindow {
    /// Build the window around a transport and a settings store
    ///
    /// Stored browser patterns are applied immediately. A store that cannot
    /// be read falls back to default settings.
    pub fn new(transport: Box<dyn Transport>, store: Box<dyn SettingsStore>) -> Self {
        let settings = match store.load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };

        let mut browser = ChannelBrowser::new();
        browser.set_patterns(settings.browser_searches.clone());

        Self {
            status: INITIAL_STATUS.to_string(),
            browser,
            graph: CountGraph::new(),
            transport,
            store,
            settings,
            state: WindowState::Running,
            schedule: PollSchedule::new(POLL_INTERVAL),
            repaint_requested: false,
        }
    }

    /// Build a window with no host; sends and receives are no-ops
    pub fn standalone(store: Box<dyn SettingsStore>) -> Self {
        Self::new(Box::new(NullTransport), store)
    }

    /// Handle one message
    ///
    /// Unknown keys are ignored. Nothing is handled once the window has
    /// started closing.
    pub fn handle_input(&mut self, message: Message) {
        if self.state != WindowState::Running {
            tracing::debug!(key = message.key(), "Window closed, ignoring message");
            return;
        }

        match message {
            Message::Status(text) => self.status = text,
            Message::CountRates(rates) => {
                let visible = self.browser.update_count_rates(&rates);
                self.graph.add_counts(&visible);
            }
            Message::Shutdown => {
                tracing::info!("Shutdown requested by host");
                self.close();
            }
            other => tracing::trace!(key = other.key(), "Ignoring message"),
        }
    }

    /// Drain every pending message in arrival order, then request a redraw
    ///
    /// Never blocks. A disconnected host closes the window.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        while self.state == WindowState::Running {
            match self.transport.try_recv() {
                Ok(Some(message)) => {
                    report.dispatched += 1;
                    self.handle_input(message);
                }
                Ok(None) => break,
                Err(IpcError::Disconnected) => {
                    tracing::warn!("Host disconnected, closing window");
                    self.close();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to receive message");
                    break;
                }
            }
        }

        report.closed = self.state == WindowState::Destroyed;
        self.repaint_requested = true;
        report
    }

    /// Run a tick if one is due at `now`
    pub fn poll(&mut self, now: Instant) -> Option<TickReport> {
        if self.schedule.due(now) {
            Some(self.tick())
        } else {
            None
        }
    }

    /// Run the close sequence: save settings, notify the host, destroy
    ///
    /// Calling it again after the window is destroyed does nothing.
    pub fn close(&mut self) {
        if self.state != WindowState::Running {
            return;
        }
        self.state = WindowState::ClosingPersist;

        self.settings.browser_searches = self.browser.patterns().to_vec();
        if let Err(e) = self.store.save(&self.settings) {
            tracing::warn!(error = %e, "Failed to save settings");
        }

        if let Err(e) = self.transport.send(&Message::GuiQuit) {
            tracing::warn!(error = %e, "Failed to notify host of shutdown");
        }

        self.state = WindowState::Destroyed;
        tracing::info!("Display window closed");
    }

    /// Current status label text
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Channel browser
    pub fn browser(&self) -> &ChannelBrowser {
        &self.browser
    }

    /// Channel browser, mutable
    pub fn browser_mut(&mut self) -> &mut ChannelBrowser {
        &mut self.browser
    }

    /// Count graph
    pub fn graph(&self) -> &CountGraph {
        &self.graph
    }

    /// Settings as loaded, or as saved if the window has closed
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Lifecycle state
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Check whether the close sequence has completed
    pub fn is_destroyed(&self) -> bool {
        self.state == WindowState::Destroyed
    }

    /// Take the pending redraw request raised by the last tick
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    /// Lay out the status panel, browser and graph
    fn render(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("left_panel")
            .min_width(LEFT_PANEL_MIN_WIDTH)
            .resizable(true)
            .show(ctx, |ui| {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(&self.status).monospace());
                ui.separator();
                if self.browser.render(ui) {
                    // TODO: clear the graph here once clearing on pattern
                    // change is confirmed as the intended behavior
                    tracing::debug!(patterns = ?self.browser.patterns(), "Browser patterns changed");
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.graph.render(ui);
        });
    }
}

impl eframe::App for DisplayWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.close();
        }

        let now = Instant::now();
        self.poll(now);

        if self.is_destroyed() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        self.render(ctx);

        if self.take_repaint_request() {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(self.schedule.until_next(now));
    }
}

/// Open the window and run the event loop until it closes
pub fn run(window: DisplayWindow) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(WINDOW_SIZE)
            .with_min_inner_size(MIN_WINDOW_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(window))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}
