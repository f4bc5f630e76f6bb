use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::AppState;
use crate::ui::Theme;

/// Input bar for the path of the file to load
pub struct FilePrompt;

impl FilePrompt {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let spans = vec![
            Span::styled(
                " path: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(state.ui_state.prompt_input.as_str(), Theme::text_highlight()),
            Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled("  [Enter] Load  [Esc] Cancel", Theme::text_dim()),
        ];

        let prompt = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(Span::styled(" Open file ", Theme::title())),
        );

        frame.render_widget(prompt, area);
    }
}
