use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(prompt) = &app.prompt else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ratatui::style::Color::Yellow))
        .title(prompt.label());

    f.render_widget(Paragraph::new(prompt.buffer.as_str()).block(block), area);

    let cursor = prompt.buffer.chars().count() as u16;
    let x = area.x + 1 + cursor;
    f.set_cursor_position((x.min(area.x + area.width.saturating_sub(2)), area.y + 1));
}
