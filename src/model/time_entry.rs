use serde::Serialize;

use super::raw::RawRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEntry {
    pub id: String,
    pub ticket_id: String,
    pub user_id: String,
    pub hours: f64,
    pub note: String,
    pub logged_at: String,
}

impl From<&RawRecord> for TimeEntry {
    fn from(raw: &RawRecord) -> Self {
        TimeEntry {
            id: raw.text_or("id", ""),
            ticket_id: raw.text_or("ticket_id", ""),
            user_id: raw.text_or("user_id", ""),
            hours: raw.number("hours").filter(|h| h.is_finite()).unwrap_or(0.0),
            note: raw.first_text(&["note", "description"]).unwrap_or_default(),
            logged_at: raw.first_text(&["logged_at", "created_at"]).unwrap_or_default(),
        }
    }
}

/// Sum of hours across entries.
pub fn total_hours(entries: &[TimeEntry]) -> f64 {
    entries.iter().map(|e| e.hours).sum()
}
