use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Areas of the channel viewer, top to bottom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewerAreas {
    pub header: Rect,
    pub tabs: Rect,
    pub body: Rect,
    pub prompt: Option<Rect>,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Split the screen into header, tab bar, body, optional prompt and status bar
    pub fn viewer(area: Rect, show_prompt: bool) -> ViewerAreas {
        let mut constraints = vec![
            Constraint::Length(3), // Header
            Constraint::Length(1), // Tabs
            Constraint::Min(1),    // Channel lines
        ];
        if show_prompt {
            constraints.push(Constraint::Length(3)); // Open-file prompt
        }
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        ViewerAreas {
            header: chunks[0],
            tabs: chunks[1],
            body: chunks[2],
            prompt: show_prompt.then(|| chunks[3]),
            status: chunks[chunks.len() - 1],
        }
    }

    /// A centered popup of at most `width` x `height`, leaving a margin
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}
