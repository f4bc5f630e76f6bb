use ratatui::{
    Frame,
    layout::{Margin, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs},
};

use logsplit_filter::FilterRegistry;

use crate::app::AppState;
use crate::ui::components::{FilePrompt, StatusBar, viewer_hints};
use crate::ui::{Layout, Theme};

/// Tabbed view over every channel buffer
pub struct ChannelViewerScreen;

impl ChannelViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, registry: &FilterRegistry) {
        let areas = Layout::viewer(frame.area(), state.ui_state.prompt_active);

        Self::render_header(frame, areas.header, state);
        Self::render_tabs(frame, areas.tabs, state);
        Self::render_lines(frame, areas.body, state, registry);
        if let Some(prompt_area) = areas.prompt {
            FilePrompt::render(frame, prompt_area, state);
        }
        Self::render_status_bar(frame, areas.status, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![Span::styled("logsplit", Theme::title())];

        match &state.loaded {
            Some(loaded) => {
                spans.push(Span::styled(" │ ", Theme::text_dim()));
                spans.push(Span::styled(
                    loaded.path.display().to_string(),
                    Theme::text_highlight(),
                ));
                spans.push(Span::styled(" │ ", Theme::text_dim()));
                spans.push(Span::styled(
                    format!("loaded {}", loaded.loaded_at.format("%H:%M:%S")),
                    Theme::text(),
                ));
                spans.push(Span::styled(" │ ", Theme::text_dim()));
                spans.push(Span::styled(
                    format!("{} lines", loaded.stats.lines_read),
                    Theme::text(),
                ));
            }
            None => {
                spans.push(Span::styled(" │ ", Theme::text_dim()));
                spans.push(Span::styled("no file", Theme::text_dim()));
            }
        }

        spans.push(Span::styled(" │ ", Theme::text_dim()));
        spans.push(Span::styled(
            format!("{} channels", state.channels.len().saturating_sub(1)),
            Theme::text(),
        ));
        spans.push(Span::styled(" │ ", Theme::text_dim()));
        spans.push(Span::styled(
            format!(
                "keep {} {}",
                state.retention.policy.label(),
                state.retention.capacity
            ),
            Theme::text_dim(),
        ));

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_tabs(frame: &mut Frame, area: Rect, state: &AppState) {
        let titles: Vec<String> = state.channels.iter().map(|c| c.title()).collect();

        let tabs = Tabs::new(titles)
            .select(state.ui_state.selected_tab)
            .style(Theme::tab())
            .highlight_style(Theme::tab_selected())
            .divider(Span::styled("│", Theme::text_dim()));

        frame.render_widget(tabs, area);
    }

    fn render_lines(
        frame: &mut Frame,
        area: Rect,
        state: &mut AppState,
        registry: &FilterRegistry,
    ) {
        // Visible rows inside the border
        let inner_height = area.height.saturating_sub(2) as usize;
        state.ui_state.page_size = inner_height.max(1);
        let has_file = state.loaded.is_some();

        let Some(channel) = state.current_channel_mut() else {
            return;
        };

        let total = channel.buffer.len();
        let max_scroll = total.saturating_sub(inner_height);
        if channel.scroll > max_scroll {
            channel.scroll = max_scroll;
        }
        let scroll = channel.scroll;

        // The original tab has no filter to highlight
        let filter = if channel.is_passthrough {
            None
        } else {
            registry.get(&channel.name)
        };

        let lines: Vec<Line> = if total == 0 {
            let hint = if has_file {
                "No lines matched this channel."
            } else {
                "No file loaded. Press [o] to open one."
            };
            vec![Line::from(Span::styled(hint, Theme::text_dim()))]
        } else {
            channel
                .buffer
                .range(scroll, inner_height)
                .map(|line| match filter {
                    Some(filter) => highlight_line(line, &filter.find_matches(line)),
                    None => Line::from(Span::styled(line.as_str(), Theme::text())),
                })
                .collect()
        };

        let title = if channel.buffer.dropped() > 0 {
            format!(
                " {} ({} of {} kept, {}) ",
                channel.name,
                total,
                channel.buffer.total_added(),
                channel.buffer.policy().label()
            )
        } else {
            format!(" {} ({}) ", channel.name, total)
        };

        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let right = match state.current_channel() {
            Some(channel) if !channel.buffer.is_empty() => {
                let last = (channel.scroll + state.ui_state.page_size).min(channel.buffer.len());
                format!("{}-{}/{}", channel.scroll + 1, last, channel.buffer.len())
            }
            _ => String::new(),
        };

        frame.render_widget(StatusBar::new().hints(viewer_hints()).right(right), area);
    }
}

/// Split a line into plain and highlighted spans
///
/// `ranges` must be sorted, non-overlapping byte ranges on char boundaries.
fn highlight_line<'a>(line: &'a str, ranges: &[(usize, usize)]) -> Line<'a> {
    let mut spans = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut pos = 0;

    for &(start, end) in ranges {
        if start > pos {
            spans.push(Span::styled(&line[pos..start], Theme::text()));
        }
        spans.push(Span::styled(&line[start..end], Theme::keyword_match()));
        pos = end;
    }
    if pos < line.len() {
        spans.push(Span::styled(&line[pos..], Theme::text()));
    }

    Line::from(spans)
}
