use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use logsplit_filter::{
    BoundedBuffer, FilterError, FilterRegistry, LineRouter, PASSTHROUGH_CHANNEL, RetentionPolicy,
    RouteStats, input,
};

/// Capacity and policy shared by every channel buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Retention {
    pub capacity: usize,
    pub policy: RetentionPolicy,
}

impl Retention {
    pub fn new(capacity: usize, policy: RetentionPolicy) -> Self {
        Self { capacity, policy }
    }

    fn buffer(&self) -> Result<BoundedBuffer<String>, FilterError> {
        BoundedBuffer::new(self.capacity, self.policy)
    }
}

/// One tab: a channel's buffer plus its scroll position
pub struct ChannelView {
    pub name: String,

    /// Retained lines
    pub buffer: BoundedBuffer<String>,

    /// Index of the first visible line
    pub scroll: usize,

    /// The unfiltered tab rather than a filter channel
    pub is_passthrough: bool,
}

impl ChannelView {
    fn new(name: impl Into<String>, buffer: BoundedBuffer<String>, is_passthrough: bool) -> Self {
        Self {
            name: name.into(),
            buffer,
            scroll: 0,
            is_passthrough,
        }
    }

    /// Tab title: line count, or "shown/matched" once lines were dropped
    pub fn title(&self) -> String {
        if self.buffer.dropped() > 0 {
            format!(
                "{} ({}/{})",
                self.name,
                self.buffer.len(),
                self.buffer.total_added()
            )
        } else {
            format!("{} ({})", self.name, self.buffer.len())
        }
    }
}

/// The file currently shown
pub struct LoadedFile {
    pub path: PathBuf,
    pub loaded_at: DateTime<Local>,
    pub stats: RouteStats,
}

/// UI-specific transient state
pub struct UiState {
    /// Index into `AppState::channels`
    pub selected_tab: usize,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Is the open-file prompt active?
    pub prompt_active: bool,

    /// Current prompt input text
    pub prompt_input: String,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Visible lines in the channel body, updated on render
    pub page_size: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selected_tab: 0,
            help_visible: false,
            prompt_active: false,
            prompt_input: String::new(),
            error_message: None,
            page_size: 20,
        }
    }
}

/// Global application state
pub struct AppState {
    /// `original` first, then one view per filter channel in registry order
    pub channels: Vec<ChannelView>,

    /// Last successfully loaded file
    pub loaded: Option<LoadedFile>,

    pub retention: Retention,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    /// Create empty views for every channel; fails on a zero capacity
    pub fn new(registry: &FilterRegistry, retention: Retention) -> Result<Self, FilterError> {
        let mut channels = vec![ChannelView::new(
            PASSTHROUGH_CHANNEL,
            retention.buffer()?,
            true,
        )];
        for name in registry.names() {
            channels.push(ChannelView::new(name, retention.buffer()?, false));
        }

        Ok(Self {
            channels,
            loaded: None,
            retention,
            ui_state: UiState::default(),
            should_quit: false,
        })
    }

    /// Route a file into fresh buffers and swap them in
    ///
    /// On failure the current buffers are left as they were.
    pub fn load_file(
        &mut self,
        registry: &FilterRegistry,
        path: &Path,
    ) -> Result<&RouteStats, FilterError> {
        let lines = input::open_lines(path)?;
        let retention = self.retention;

        let mut router = LineRouter::open(registry, |_| retention.buffer())?
            .with_passthrough(retention.buffer()?);
        router.process(lines)?;
        let routed = router.finish()?;

        let mut channels = Vec::with_capacity(routed.channels.len() + 1);
        if let Some(original) = routed.passthrough {
            channels.push(ChannelView::new(PASSTHROUGH_CHANNEL, original, true));
        }
        for (name, buffer) in routed.channels {
            channels.push(ChannelView::new(name, buffer, false));
        }
        self.channels = channels;
        self.ui_state.selected_tab = self.ui_state.selected_tab.min(self.channels.len() - 1);

        tracing::info!(
            path = %path.display(),
            lines = routed.stats.lines_read,
            blank = routed.stats.blank_skipped,
            "loaded file"
        );

        let loaded = self.loaded.insert(LoadedFile {
            path: path.to_path_buf(),
            loaded_at: Local::now(),
            stats: routed.stats,
        });
        Ok(&loaded.stats)
    }

    pub fn current_channel(&self) -> Option<&ChannelView> {
        self.channels.get(self.ui_state.selected_tab)
    }

    pub fn current_channel_mut(&mut self) -> Option<&mut ChannelView> {
        self.channels.get_mut(self.ui_state.selected_tab)
    }

    pub fn next_tab(&mut self) {
        if !self.channels.is_empty() {
            self.ui_state.selected_tab = (self.ui_state.selected_tab + 1) % self.channels.len();
        }
    }

    pub fn prev_tab(&mut self) {
        let len = self.channels.len();
        if len > 0 {
            self.ui_state.selected_tab = (self.ui_state.selected_tab + len - 1) % len;
        }
    }

    pub fn select_tab(&mut self, idx: usize) {
        if idx < self.channels.len() {
            self.ui_state.selected_tab = idx;
        }
    }

    /// Largest scroll offset that still fills the page
    fn max_scroll(&self) -> usize {
        let page = self.ui_state.page_size.max(1);
        self.current_channel()
            .map(|c| c.buffer.len().saturating_sub(page))
            .unwrap_or(0)
    }

    pub fn scroll_up(&mut self, n: usize) {
        if let Some(channel) = self.current_channel_mut() {
            channel.scroll = channel.scroll.saturating_sub(n);
        }
    }

    pub fn scroll_down(&mut self, n: usize) {
        let max = self.max_scroll();
        if let Some(channel) = self.current_channel_mut() {
            channel.scroll = (channel.scroll + n).min(max);
        }
    }

    pub fn scroll_to_top(&mut self) {
        if let Some(channel) = self.current_channel_mut() {
            channel.scroll = 0;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        let max = self.max_scroll();
        if let Some(channel) = self.current_channel_mut() {
            channel.scroll = max;
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.ui_state.page_size.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.ui_state.page_size.max(1));
    }

    pub fn open_prompt(&mut self) {
        self.ui_state.prompt_active = true;
        self.ui_state.prompt_input.clear();
    }

    pub fn close_prompt(&mut self) {
        self.ui_state.prompt_active = false;
        self.ui_state.prompt_input.clear();
    }

    /// Close the prompt and return what was typed, if anything
    pub fn take_prompt(&mut self) -> Option<PathBuf> {
        let input = std::mem::take(&mut self.ui_state.prompt_input);
        self.ui_state.prompt_active = false;
        let input = input.trim();
        (!input.is_empty()).then(|| PathBuf::from(input))
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.ui_state.error_message = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsplit_filter::{Combinator, FilterSetConfig};
    use std::fs;

    fn registry() -> FilterRegistry {
        FilterRegistry::build([
            FilterSetConfig::new("A", Combinator::Any).rule("alpha", false),
            FilterSetConfig::new("B", Combinator::Any).rule("beta", false),
        ])
        .unwrap()
    }

    fn state(capacity: usize) -> AppState {
        AppState::new(&registry(), Retention::new(capacity, RetentionPolicy::KeepFirst)).unwrap()
    }

    fn names(state: &AppState) -> Vec<&str> {
        state.channels.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_new_creates_original_tab_first() {
        let state = state(10);
        assert_eq!(names(&state), vec!["original", "A", "B"]);
        assert!(state.channels[0].is_passthrough);
        assert!(state.loaded.is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = AppState::new(&registry(), Retention::new(0, RetentionPolicy::KeepLast));
        assert!(matches!(result, Err(FilterError::InvalidCapacity { .. })));
    }

    #[test]
    fn test_load_file_fills_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.log");
        fs::write(&path, "alpha 1\n\nbeta 2\n  \nalpha beta 3\ngamma\n").unwrap();

        let registry = registry();
        let mut state = state(10);
        state.select_tab(2);
        let stats = state.load_file(&registry, &path).unwrap();
        assert_eq!(stats.blank_skipped, 2);

        assert_eq!(names(&state), vec!["original", "A", "B"]);
        assert_eq!(
            state.channels[0].buffer.snapshot(),
            vec!["alpha 1", "beta 2", "alpha beta 3", "gamma"]
        );
        assert_eq!(
            state.channels[1].buffer.snapshot(),
            vec!["alpha 1", "alpha beta 3"]
        );
        assert_eq!(
            state.channels[2].buffer.snapshot(),
            vec!["beta 2", "alpha beta 3"]
        );
        assert_eq!(state.ui_state.selected_tab, 2);
        assert_eq!(state.loaded.as_ref().unwrap().path, path);
    }

    #[test]
    fn test_failed_load_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.log");
        fs::write(&path, "alpha\n").unwrap();

        let registry = registry();
        let mut state = state(10);
        state.load_file(&registry, &path).unwrap();

        let err = state
            .load_file(&registry, &dir.path().join("missing.log"))
            .unwrap_err();
        assert!(matches!(err, FilterError::Open { .. }));
        assert_eq!(state.channels[1].buffer.snapshot(), vec!["alpha"]);
        assert_eq!(state.loaded.as_ref().unwrap().path, path);
    }

    #[test]
    fn test_title_shows_dropped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.log");
        fs::write(&path, "alpha 1\nalpha 2\nalpha 3\n").unwrap();

        let mut state = state(2);
        state.load_file(&registry(), &path).unwrap();
        assert_eq!(state.channels[1].title(), "A (2/3)");
        assert_eq!(state.channels[2].title(), "B (0)");
    }

    #[test]
    fn test_tab_cycling_wraps() {
        let mut state = state(10);
        state.prev_tab();
        assert_eq!(state.ui_state.selected_tab, 2);
        state.next_tab();
        assert_eq!(state.ui_state.selected_tab, 0);
        state.select_tab(7);
        assert_eq!(state.ui_state.selected_tab, 0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut state = state(100);
        for i in 0..30 {
            state.channels[0].buffer.add(format!("line {i}"));
        }
        state.ui_state.page_size = 10;

        state.scroll_down(5);
        assert_eq!(state.channels[0].scroll, 5);
        state.page_down();
        state.page_down();
        assert_eq!(state.channels[0].scroll, 20);
        state.scroll_up(100);
        assert_eq!(state.channels[0].scroll, 0);
        state.scroll_to_bottom();
        assert_eq!(state.channels[0].scroll, 20);
        state.scroll_to_top();
        assert_eq!(state.channels[0].scroll, 0);
    }

    #[test]
    fn test_take_prompt() {
        let mut state = state(10);
        state.open_prompt();
        state.ui_state.prompt_input.push_str("  logs/app.log ");
        assert_eq!(state.take_prompt(), Some(PathBuf::from("logs/app.log")));
        assert!(!state.ui_state.prompt_active);

        state.open_prompt();
        assert_eq!(state.take_prompt(), None);
    }
}
