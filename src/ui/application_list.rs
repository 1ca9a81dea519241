use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::App;
use crate::ui::theme::application_color;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .applications
        .iter()
        .enumerate()
        .map(|(i, application)| {
            let selected = i == app.selected_application;

            let status = Span::styled(
                format!("{:<9} ", application.status),
                Style::default().fg(application_color(&application.status)),
            );

            let role = if application.role.title.is_empty() {
                application.task_id.clone()
            } else {
                application.role.title.clone()
            };
            let role_style = if selected {
                Style::default()
                    .fg(ratatui::style::Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = vec![status, Span::styled(role, role_style)];
            if !application.role.project_title.is_empty() {
                spans.push(Span::styled(
                    format!(" · {}", application.role.project_title),
                    Style::default().fg(ratatui::style::Color::DarkGray),
                ));
            }
            if !application.message.is_empty() {
                let preview: String = application.message.chars().take(60).collect();
                spans.push(Span::styled(
                    format!("  \"{preview}\""),
                    Style::default().fg(ratatui::style::Color::Gray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = format!(
        " {}{} ",
        app.view_mode.title(),
        if app.loading { " (loading...)" } else { "" }
    );

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ratatui::style::Color::Cyan))
            .title(title),
    );

    f.render_widget(list, area);
}
