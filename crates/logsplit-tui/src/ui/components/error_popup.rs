use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::{Layout, Theme};

/// Error banner; any key dismisses it
pub struct ErrorPopup;

impl ErrorPopup {
    pub fn render(frame: &mut Frame, message: &str) {
        let popup_area = Layout::popup(frame.area(), 60, 7);
        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(Span::styled(message, Theme::text())),
            Line::from(""),
            Line::from(Span::styled("Press any key to dismiss", Theme::text_dim())),
        ];

        let widget = Paragraph::new(text).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::error())
                .title(Span::styled(" Error ", Theme::error())),
        );

        frame.render_widget(widget, popup_area);
    }
}
