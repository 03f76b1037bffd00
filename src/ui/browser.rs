//! Channel browser
//!
//! Lists every channel seen so far with its latest rate and decides which
//! channels are visible on the graph. Visibility is controlled by a list of
//! case-insensitive glob patterns (`*` = any run of characters, `?` = one
//! character). A channel is visible when it matches any pattern; with no
//! patterns every channel is visible.

use crate::ipc::CountRates;

/// Channel browser state
#[derive(Debug, Default)]
pub struct ChannelBrowser {
    /// Active search patterns
    patterns: Vec<String>,
    /// Text currently in the search box
    pattern_text: String,
    /// Latest rate for every channel seen
    rates: CountRates,
}

impl ChannelBrowser {
    /// Create a browser with no patterns
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the search patterns
    pub fn set_patterns(&mut self, patterns: Vec<String>) {
        self.patterns = patterns
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self.pattern_text = self.patterns.join(", ");
    }

    /// Current search patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check whether a channel passes the current patterns
    pub fn is_visible(&self, channel: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| glob_match(p, channel))
    }

    /// Record new rates and return the visible subset
    pub fn update_count_rates(&mut self, rates: &CountRates) -> CountRates {
        for (channel, rate) in rates {
            self.rates.insert(channel.clone(), *rate);
        }
        rates
            .iter()
            .filter(|(channel, _)| self.is_visible(channel))
            .map(|(channel, rate)| (channel.clone(), *rate))
            .collect()
    }

    /// Latest rate for every channel seen
    pub fn rates(&self) -> &CountRates {
        &self.rates
    }

    /// Render the search box and channel list
    ///
    /// # Returns
    /// `true` if the patterns were edited this frame
    pub fn render(&mut self, ui: &mut egui::Ui) -> bool {
        let mut changed = false;

        ui.horizontal(|ui| {
            ui.label("Search:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.pattern_text)
                    .hint_text("a*, ab, ?c")
                    .desired_width(f32::INFINITY),
            );
            if response.changed() {
                self.patterns = parse_patterns(&self.pattern_text);
                changed = true;
            }
        });

        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("channel_browser")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (channel, rate) in &self.rates {
                        let text = egui::RichText::new(channel).monospace();
                        if self.is_visible(channel) {
                            ui.label(text.strong());
                        } else {
                            ui.label(text.weak());
                        }
                        ui.label(format!("{:.0}", rate));
                        ui.end_row();
                    }
                });
        });

        changed
    }
}

/// Split comma-separated search text into patterns
pub fn parse_patterns(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive glob match supporting `*` and `?`
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` and the name index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, n));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            n = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(pairs: &[(&str, f64)]) -> CountRates {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_glob_literal() {
        assert!(glob_match("ch1", "ch1"));
        assert!(glob_match("CH1", "ch1"));
        assert!(!glob_match("ch1", "ch10"));
        assert!(!glob_match("ch10", "ch1"));
    }

    #[test]
    fn test_glob_wildcards() {
        assert!(glob_match("a*", "abc"));
        assert!(glob_match("a*", "a"));
        assert!(glob_match("*c", "abc"));
        assert!(glob_match("a*c", "abbbc"));
        assert!(!glob_match("a*c", "abcd"));
        assert!(glob_match("?b", "ab"));
        assert!(!glob_match("?b", "b"));
        assert!(glob_match("*", ""));
        assert!(glob_match("**ab*", "xxabyy"));
    }

    #[test]
    fn test_glob_star_against_literal_star() {
        assert!(glob_match("*b", "*xb"));
        assert!(glob_match("a*", "a*"));
        assert!(glob_match("*", "*"));
        assert!(!glob_match("*b", "*xc"));
    }

    #[test]
    fn test_render_without_input_reports_no_change() {
        let mut browser = ChannelBrowser::new();
        browser.set_patterns(vec!["a*".to_string()]);
        browser.update_count_rates(&rates(&[("a", 1.0), ("b", 2.0)]));

        let ctx = egui::Context::default();
        let mut changed = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                changed = Some(browser.render(ui));
            });
        });

        assert_eq!(changed, Some(false));
        assert_eq!(browser.patterns(), &["a*".to_string()]);
    }

    #[test]
    fn test_no_patterns_shows_everything() {
        let mut browser = ChannelBrowser::new();
        let input = rates(&[("ch1", 10.0), ("ch2", 0.0)]);
        assert_eq!(browser.update_count_rates(&input), input);
    }

    #[test]
    fn test_patterns_filter_rates() {
        let mut browser = ChannelBrowser::new();
        browser.set_patterns(vec!["ch1".to_string()]);

        let filtered = browser.update_count_rates(&rates(&[("ch1", 10.0), ("ch2", 0.0)]));
        assert_eq!(filtered, rates(&[("ch1", 10.0)]));

        // Hidden channels are still listed
        assert_eq!(browser.rates().len(), 2);
    }

    #[test]
    fn test_any_pattern_makes_visible() {
        let mut browser = ChannelBrowser::new();
        browser.set_patterns(vec!["a".to_string(), "b*".to_string()]);
        assert!(browser.is_visible("a"));
        assert!(browser.is_visible("bc"));
        assert!(!browser.is_visible("ab"));
    }

    #[test]
    fn test_rates_accumulate() {
        let mut browser = ChannelBrowser::new();
        browser.update_count_rates(&rates(&[("a", 1.0)]));
        browser.update_count_rates(&rates(&[("b", 2.0), ("a", 3.0)]));
        assert_eq!(browser.rates(), &rates(&[("a", 3.0), ("b", 2.0)]));
    }

    #[test]
    fn test_set_patterns_drops_blanks() {
        let mut browser = ChannelBrowser::new();
        browser.set_patterns(vec![" ab ".to_string(), "".to_string(), "  ".to_string()]);
        assert_eq!(browser.patterns(), &["ab".to_string()]);
        assert!(!browser.is_visible("a"));
    }

    #[test]
    fn test_parse_patterns() {
        assert_eq!(parse_patterns("a, b*,, ?c "), vec!["a", "b*", "?c"]);
        assert!(parse_patterns("  ").is_empty());
    }
}
