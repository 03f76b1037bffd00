//! Count rate graph
//!
//! Keeps a bounded time series per channel and plots them with `egui_plot`.

use crate::ipc::CountRates;
use chrono::{DateTime, Utc};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use std::collections::{BTreeMap, VecDeque};

/// Maximum number of points kept per channel
pub const MAX_HISTORY_SIZE: usize = 3600;

/// A single rate sample
#[derive(Debug, Clone)]
pub struct RatePoint {
    /// Time the rate arrived
    pub timestamp: DateTime<Utc>,
    /// Rate in counts per second
    pub value: f64,
}

/// Graph of count rates over time
#[derive(Debug)]
pub struct CountGraph {
    /// History per channel
    series: BTreeMap<String, VecDeque<RatePoint>>,
    /// Maximum history size per channel
    max_size: usize,
    /// Number of `add_counts` calls since the last clear
    updates: u64,
}

impl CountGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }

    /// Create an empty graph keeping at most `max_size` points per channel
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            series: BTreeMap::new(),
            max_size: max_size.max(1),
            updates: 0,
        }
    }

    /// Append the given rates, timestamped now
    pub fn add_counts(&mut self, rates: &CountRates) {
        self.add_counts_at(rates, Utc::now());
    }

    /// Append the given rates with an explicit timestamp
    pub fn add_counts_at(&mut self, rates: &CountRates, timestamp: DateTime<Utc>) {
        for (channel, rate) in rates {
            let history = self
                .series
                .entry(channel.clone())
                .or_insert_with(|| VecDeque::with_capacity(self.max_size.min(256)));
            if history.len() >= self.max_size {
                history.pop_front();
            }
            history.push_back(RatePoint {
                timestamp,
                value: *rate,
            });
        }
        self.updates += 1;
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.series.clear();
        self.updates = 0;
    }

    /// Channels with at least one point
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// History of one channel
    pub fn series(&self, channel: &str) -> Option<&VecDeque<RatePoint>> {
        self.series.get(channel)
    }

    /// Most recent rate of one channel
    pub fn latest(&self, channel: &str) -> Option<f64> {
        self.series
            .get(channel)
            .and_then(|h| h.back())
            .map(|p| p.value)
    }

    /// Number of `add_counts` calls since the last clear
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Plot data for one channel, x in seconds relative to `now`
    ///
    /// # Returns
    /// Points ordered oldest first
    pub fn plot_data(&self, channel: &str, now: DateTime<Utc>) -> Vec<[f64; 2]> {
        self.series
            .get(channel)
            .map(|history| {
                history
                    .iter()
                    .map(|p| {
                        let offset = (now - p.timestamp).num_milliseconds() as f64 / 1000.0;
                        [-offset, p.value]
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Render the plot filling the available space
    pub fn render(&self, ui: &mut egui::Ui) {
        let now = Utc::now();
        Plot::new("count_rates")
            .legend(Legend::default())
            .x_axis_label("Time (s)")
            .y_axis_label("Counts / s")
            .show(ui, |plot_ui| {
                for channel in self.channels() {
                    let points = PlotPoints::from(self.plot_data(channel, now));
                    plot_ui.line(Line::new(points).name(channel));
                }
            });
    }
}

impl Default for CountGraph {
    fn default() -> Self {
        Self::new()
    }
}
