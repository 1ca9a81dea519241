use serde::Serialize;
use std::fmt;

use super::raw::RawRecord;

pub const DEFAULT_TICKET_TYPE: &str = "task";
pub const DEFAULT_HEALTH: &str = "good";

/// Canonical ticket. Both spellings of the type tag are kept and always
/// hold the same value, so code written against either name keeps working.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub health: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ticket_type: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "isTaskTicket")]
    pub is_task_ticket: bool,
    #[serde(rename = "isProjectTicket")]
    pub is_project_ticket: bool,
}

impl From<&RawRecord> for Ticket {
    fn from(raw: &RawRecord) -> Self {
        let kind = raw
            .first_text(&["type", "ticket_type"])
            .unwrap_or_else(|| DEFAULT_TICKET_TYPE.to_string());
        let project_id = raw.text("project_id");
        let task_id = raw.text("task_id");

        Ticket {
            id: raw.text_or("id", ""),
            title: raw.text_or("title", ""),
            description: raw.text_or("description", ""),
            status: raw.text_or("status", ""),
            priority: raw.text_or("priority", ""),
            health: raw.text_or("health", DEFAULT_HEALTH),
            ticket_type: kind.clone(),
            kind,
            created_at: raw.text_or("created_at", ""),
            updated_at: raw.text_or("updated_at", ""),
            is_task_ticket: task_id.is_some(),
            is_project_ticket: project_id.is_some() && task_id.is_none(),
            project_id,
            task_id,
        }
    }
}

impl Ticket {
    pub fn status(&self) -> TicketStatus {
        TicketStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Todo,
        TicketStatus::InProgress,
        TicketStatus::Review,
        TicketStatus::Done,
        TicketStatus::Blocked,
    ];

    /// Unrecognised strings are treated as `Todo`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "in_progress" => TicketStatus::InProgress,
            "review" | "in_review" => TicketStatus::Review,
            "done" | "closed" => TicketStatus::Done,
            "blocked" => TicketStatus::Blocked,
            _ => TicketStatus::Todo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Todo => "todo",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Review => "review",
            TicketStatus::Done => "done",
            TicketStatus::Blocked => "blocked",
        }
    }

    /// Next status on the board's forward cycle.
    pub fn next(&self) -> Self {
        match self {
            TicketStatus::Todo => TicketStatus::InProgress,
            TicketStatus::InProgress => TicketStatus::Review,
            TicketStatus::Review => TicketStatus::Done,
            TicketStatus::Done | TicketStatus::Blocked => TicketStatus::Todo,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
