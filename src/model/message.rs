use serde::Serialize;

use super::raw::RawRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub created_at: String,
    pub read: bool,
}

impl From<&RawRecord> for Message {
    fn from(raw: &RawRecord) -> Self {
        Message {
            id: raw.text_or("id", ""),
            sender_id: raw.text_or("sender_id", ""),
            recipient_id: raw.first_text(&["recipient_id", "receiver_id"]).unwrap_or_default(),
            body: raw.first_text(&["body", "content"]).unwrap_or_default(),
            created_at: raw.text_or("created_at", ""),
            read: raw.flag("read").unwrap_or(false),
        }
    }
}
