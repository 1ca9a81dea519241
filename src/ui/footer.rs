use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, ApplicationScope, ViewMode};
use crate::ui::theme::level_color;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![hint("←→", "views"), hint("↑↓", "navigate")];

    match &app.view_mode {
        ViewMode::Tickets => {
            spans.push(hint("s", "next status"));
            spans.push(hint("n", "new"));
            spans.push(hint("l", "log time"));
            spans.push(hint("p", "applicants"));
            spans.push(hint("d", "delete"));
        }
        ViewMode::Applications(ApplicationScope::Mine) => {
            spans.push(hint("w", "withdraw"));
        }
        ViewMode::Applications(ApplicationScope::ForTask(_)) => {
            spans.push(hint("a", "accept"));
            spans.push(hint("x", "reject"));
            spans.push(hint("esc", "tickets"));
        }
        ViewMode::Cvs => {
            if app.bucket.status().is_ready() {
                spans.push(hint("u", "upload"));
                spans.push(hint("d", "delete"));
            }
        }
    }
    spans.push(hint("r", "refresh"));
    spans.push(hint("q", "quit"));

    if let Some((notification, _)) = &app.flash_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            notification.message.as_str(),
            Style::default().fg(level_color(notification.level)),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn hint(key: &str, desc: &str) -> Span<'static> {
    Span::styled(
        format!(" {key}:{desc} "),
        Style::default().fg(ratatui::style::Color::DarkGray),
    )
}
