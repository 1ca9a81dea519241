use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::App;
use crate::ui::theme::{health_color, status_color};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .tickets
        .iter()
        .enumerate()
        .map(|(i, ticket)| {
            let selected = i == app.selected_ticket;
            let status = ticket.status();

            let health = Span::styled("● ", Style::default().fg(health_color(&ticket.health)));
            let status_span = Span::styled(
                format!("{:<11} ", status.as_str()),
                Style::default().fg(status_color(status)),
            );

            let max_title = area.width.saturating_sub(30) as usize;
            let title: String = ticket.title.chars().take(max_title).collect();
            let title_style = if selected {
                Style::default()
                    .fg(ratatui::style::Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let kind = Span::styled(
                format!(" [{}]", ticket.ticket_type),
                Style::default().fg(ratatui::style::Color::DarkGray),
            );

            ListItem::new(Line::from(vec![
                health,
                status_span,
                Span::styled(title, title_style),
                kind,
            ]))
        })
        .collect();

    let title = if app.loading {
        " Tickets (loading...) "
    } else {
        " Tickets "
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Cyan))
            .title(title),
    );

    f.render_widget(list, area);
}
