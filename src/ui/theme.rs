use ratatui::style::Color;

use crate::model::ticket::TicketStatus;
use crate::services::Level;

pub fn status_color(status: TicketStatus) -> Color {
    match status {
        TicketStatus::Todo => Color::Gray,
        TicketStatus::InProgress => Color::Cyan,
        TicketStatus::Review => Color::Yellow,
        TicketStatus::Done => Color::Green,
        TicketStatus::Blocked => Color::Red,
    }
}

pub fn health_color(health: &str) -> Color {
    match health {
        "good" => Color::Green,
        "at_risk" => Color::Yellow,
        "off_track" | "critical" => Color::Red,
        _ => Color::Gray,
    }
}

pub fn priority_color(priority: &str) -> Color {
    match priority.to_ascii_lowercase().as_str() {
        "urgent" => Color::Red,
        "high" => Color::Yellow,
        "medium" => Color::Blue,
        _ => Color::Gray,
    }
}

pub fn application_color(status: &str) -> Color {
    match status {
        "accepted" => Color::Green,
        "rejected" => Color::Red,
        "pending" => Color::Yellow,
        _ => Color::Gray,
    }
}

pub fn level_color(level: Level) -> Color {
    match level {
        Level::Success => Color::Green,
        Level::Failure => Color::Red,
    }
}
