pub mod application_list;
pub mod command_bar;
pub mod cv_panel;
pub mod detail_panel;
pub mod footer;
pub mod theme;
pub mod ticket_list;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, ApplicationScope, ViewMode};

pub fn render(f: &mut Frame, app: &App) {
    let bottom_height = if app.prompt.is_some() { 3 } else { 1 };

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // tabs
            Constraint::Min(6),                // main content
            Constraint::Length(bottom_height), // footer or command bar
        ])
        .split(f.area());

    render_tabs(f, vertical[0], app);

    let main_area = vertical[1];
    match &app.view_mode {
        ViewMode::Tickets => {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(main_area);
            ticket_list::render(f, horizontal[0], app);
            detail_panel::render(f, horizontal[1], app);
        }
        ViewMode::Applications(_) => application_list::render(f, main_area, app),
        ViewMode::Cvs => cv_panel::render(f, main_area, app),
    }

    if app.prompt.is_some() {
        command_bar::render(f, vertical[2], app);
    } else {
        footer::render(f, vertical[2], app);
    }
}

fn render_tabs(f: &mut Frame, area: ratatui::layout::Rect, app: &App) {
    let tabs = [
        ViewMode::Tickets,
        ViewMode::Applications(ApplicationScope::Mine),
        ViewMode::Cvs,
    ];
    let spans: Vec<Span> = tabs
        .iter()
        .map(|tab| {
            let active = std::mem::discriminant(tab) == std::mem::discriminant(&app.view_mode);
            let label = if active { app.view_mode.title() } else { tab.title() };
            if active {
                Span::styled(
                    format!(" {label} "),
                    Style::default()
                        .fg(ratatui::style::Color::Black)
                        .bg(ratatui::style::Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled(
                    format!(" {label} "),
                    Style::default().fg(ratatui::style::Color::Gray),
                )
            }
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
