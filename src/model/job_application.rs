use serde::Serialize;

use super::raw::RawRecord;

pub const DEFAULT_APPLICATION_STATUS: &str = "pending";

/// Canonical job application. `id` and `job_app_id` always carry the same
/// identifier; nothing is generated when the row has neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobApplication {
    pub id: String,
    pub job_app_id: String,
    pub applicant_id: String,
    pub task_id: String,
    pub status: String,
    pub message: String,
    pub created_at: String,
    pub role: RoleSummary,
}

/// The task (role) an application targets, with the project it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleSummary {
    pub title: String,
    pub project_id: String,
    pub project_title: String,
}

impl From<&RawRecord> for JobApplication {
    fn from(raw: &RawRecord) -> Self {
        let id = raw.first_text(&["id", "job_app_id"]).unwrap_or_default();
        let role = raw
            .nested("task")
            .or_else(|| raw.nested("role"))
            .map(|r| RoleSummary::from(&r))
            .unwrap_or_default();

        JobApplication {
            job_app_id: id.clone(),
            id,
            applicant_id: raw.first_text(&["applicant_id", "user_id"]).unwrap_or_default(),
            task_id: raw.text_or("task_id", ""),
            status: raw.text_or("status", DEFAULT_APPLICATION_STATUS),
            message: raw.text_or("message", ""),
            created_at: raw.text_or("created_at", ""),
            role,
        }
    }
}

impl From<&RawRecord> for RoleSummary {
    fn from(raw: &RawRecord) -> Self {
        let project = raw.nested("project");
        RoleSummary {
            title: raw.first_text(&["title", "name"]).unwrap_or_default(),
            project_id: raw
                .text("project_id")
                .or_else(|| project.as_ref().and_then(|p| p.text("id")))
                .unwrap_or_default(),
            project_title: project
                .as_ref()
                .and_then(|p| p.first_text(&["title", "name"]))
                .unwrap_or_default(),
        }
    }
}

impl JobApplication {
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case(DEFAULT_APPLICATION_STATUS)
    }
}
