use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::theme::{health_color, priority_color, status_color};

fn field<'a>(label: &'a str, value: Span<'a>) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(ratatui::style::Color::Gray)),
        value,
    ])
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ratatui::style::Color::Cyan))
        .title(" Details ");

    let Some(ticket) = app.tickets.get(app.selected_ticket) else {
        f.render_widget(block, area);
        return;
    };

    let status = ticket.status();
    let mut lines = vec![
        field(
            "Status: ",
            Span::styled(status.as_str(), Style::default().fg(status_color(status))),
        ),
        field(
            "Health: ",
            Span::styled(&ticket.health, Style::default().fg(health_color(&ticket.health))),
        ),
        field("Type: ", Span::raw(&ticket.ticket_type)),
    ];

    if !ticket.priority.is_empty() {
        lines.push(field(
            "Priority: ",
            Span::styled(
                &ticket.priority,
                Style::default().fg(priority_color(&ticket.priority)),
            ),
        ));
    }

    if let Some(task_id) = &ticket.task_id {
        lines.push(field("Task: ", Span::raw(task_id)));
    } else if let Some(project_id) = &ticket.project_id {
        lines.push(field("Project: ", Span::raw(project_id)));
    }

    if !ticket.updated_at.is_empty() {
        lines.push(field("Updated: ", Span::raw(&ticket.updated_at)));
    }

    if !ticket.description.is_empty() {
        lines.push(Line::raw(""));
        let truncated: String = ticket.description.chars().take(300).collect();
        lines.push(Line::raw(truncated));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
