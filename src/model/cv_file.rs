use serde::Serialize;

use super::raw::RawRecord;

/// A CV object in the user's storage prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvFile {
    pub name: String,
    pub size: u64,
    pub updated_at: String,
}

impl From<&RawRecord> for CvFile {
    fn from(raw: &RawRecord) -> Self {
        let size = raw
            .nested("metadata")
            .and_then(|m| m.number("size"))
            .or_else(|| raw.number("size"))
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(|s| s as u64)
            .unwrap_or(0);
        CvFile {
            name: raw.text_or("name", ""),
            size,
            updated_at: raw.first_text(&["updated_at", "created_at"]).unwrap_or_default(),
        }
    }
}

impl CvFile {
    pub fn size_label(&self) -> String {
        match self.size {
            s if s >= 1024 * 1024 => format!("{:.1} MB", s as f64 / (1024.0 * 1024.0)),
            s if s >= 1024 => format!("{:.1} KB", s as f64 / 1024.0),
            s => format!("{s} B"),
        }
    }
}
