use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::services::bucket::BucketStatus;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ratatui::style::Color::Cyan))
        .title(" CVs ");

    match app.bucket.status() {
        BucketStatus::Checking => {
            let paragraph = Paragraph::new(Line::styled(
                "Checking CV storage...",
                Style::default().fg(ratatui::style::Color::Gray),
            ))
            .block(block);
            f.render_widget(paragraph, area);
        }
        status @ BucketStatus::Unavailable(_) => {
            let banner = status.banner().unwrap_or_default();
            let paragraph = Paragraph::new(Line::styled(
                banner,
                Style::default()
                    .fg(ratatui::style::Color::Black)
                    .bg(ratatui::style::Color::Yellow),
            ))
            .block(block);
            f.render_widget(paragraph, area);
        }
        BucketStatus::Ready => render_files(f, area, app, block),
    }
}

fn render_files(f: &mut Frame, area: Rect, app: &App, block: Block) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(block.inner(area));
    f.render_widget(block, area);

    let items: Vec<ListItem> = app
        .cvs
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let style = if i == app.selected_cv {
                Style::default()
                    .fg(ratatui::style::Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(file.name.clone(), style),
                Span::styled(
                    format!("  {}", file.size_label()),
                    Style::default().fg(ratatui::style::Color::DarkGray),
                ),
            ]))
        })
        .collect();
    f.render_widget(List::new(items), rows[0]);

    if app.cvs.is_empty() && !app.loading {
        f.render_widget(Paragraph::new("No CVs uploaded yet"), rows[0]);
    }
    if let Some(url) = app.selected_public_url() {
        f.render_widget(
            Paragraph::new(Span::styled(url, Style::default().fg(ratatui::style::Color::Blue))),
            rows[1],
        );
    }
}
