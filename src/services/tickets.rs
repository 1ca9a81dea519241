use chrono::Utc;

use super::ActionContext;
use crate::backend::{BackendError, Filter};
use crate::model::raw::RawRecord;
use crate::model::ticket::{Ticket, TicketStatus, DEFAULT_HEALTH, DEFAULT_TICKET_TYPE};
use crate::model::time_entry::TimeEntry;

pub const TICKETS: &str = "tickets";
pub const TIME_ENTRIES: &str = "time_entries";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTicket {
    pub title: String,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
}

impl NewTicket {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn into_record(self, created_by: &str) -> RawRecord {
        let mut record = RawRecord::new()
            .with("title", self.title.trim())
            .with("description", self.description.unwrap_or_default())
            .with("status", TicketStatus::Todo.as_str())
            .with("health", DEFAULT_HEALTH)
            .with(
                "ticket_type",
                self.kind.unwrap_or_else(|| DEFAULT_TICKET_TYPE.to_string()),
            )
            .with("created_by", created_by);
        if let Some(priority) = self.priority {
            record.insert("priority", priority);
        }
        if let Some(project_id) = self.project_id {
            record.insert("project_id", project_id);
        }
        if let Some(task_id) = self.task_id {
            record.insert("task_id", task_id);
        }
        record
    }
}

/// Fields to change on an existing ticket; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub health: Option<String>,
    pub kind: Option<String>,
    pub status: Option<TicketStatus>,
}

impl TicketPatch {
    fn into_record(self) -> RawRecord {
        let mut record = RawRecord::new();
        if let Some(title) = self.title {
            record.insert("title", title);
        }
        if let Some(description) = self.description {
            record.insert("description", description);
        }
        if let Some(priority) = self.priority {
            record.insert("priority", priority);
        }
        if let Some(health) = self.health {
            record.insert("health", health);
        }
        if let Some(kind) = self.kind {
            record.insert("ticket_type", kind);
        }
        if let Some(status) = self.status {
            record.insert("status", status.as_str());
        }
        record.insert("updated_at", Utc::now().to_rfc3339());
        record
    }
}

/// Tickets, newest first, optionally limited to one project.
pub async fn fetch_tickets(
    ctx: &ActionContext,
    project_id: Option<&str>,
) -> Result<Vec<Ticket>, BackendError> {
    let mut filter = Filter::new().order_by("created_at", false);
    if let Some(project_id) = project_id {
        filter = filter.eq("project_id", project_id);
    }
    let rows = ctx.call(ctx.backend.select(TICKETS, &filter)).await?;
    Ok(rows.iter().map(Ticket::from).collect())
}

pub async fn create_ticket(ctx: &ActionContext, ticket: NewTicket) -> Option<Ticket> {
    if ticket.title.trim().is_empty() {
        ctx.reject("create ticket", "title is empty");
        return None;
    }
    let record = ticket.into_record(ctx.user_id());
    ctx.act("create ticket", ctx.backend.insert(TICKETS, record), |row| {
        format!("Ticket created: {}", Ticket::from(row).title)
    })
    .await
    .map(|row| Ticket::from(&row))
}

pub async fn update_ticket(ctx: &ActionContext, id: &str, patch: TicketPatch) -> Option<Ticket> {
    let filter = Filter::by_id(id);
    ctx.act(
        "update ticket",
        ctx.backend.update(TICKETS, &filter, patch.into_record()),
        |_| "Ticket updated".to_string(),
    )
    .await
    .map(|row| Ticket::from(&row))
}

pub async fn set_ticket_status(
    ctx: &ActionContext,
    id: &str,
    status: TicketStatus,
) -> Option<Ticket> {
    let patch = TicketPatch {
        status: Some(status),
        ..TicketPatch::default()
    }
    .into_record();
    let filter = Filter::by_id(id);
    ctx.act(
        "change ticket status",
        ctx.backend.update(TICKETS, &filter, patch),
        |_| format!("Ticket moved to {status}"),
    )
    .await
    .map(|row| Ticket::from(&row))
}

pub async fn delete_ticket(ctx: &ActionContext, id: &str) -> bool {
    let filter = Filter::by_id(id);
    ctx.act("delete ticket", ctx.backend.remove(TICKETS, &filter), |_| {
        "Ticket deleted".to_string()
    })
    .await
    .is_some()
}

/// Records hours against a ticket for the signed-in user.
pub async fn log_time(
    ctx: &ActionContext,
    ticket_id: &str,
    hours: f64,
    note: Option<&str>,
) -> Option<TimeEntry> {
    if !hours.is_finite() || hours <= 0.0 {
        ctx.reject("log time", "hours must be a positive number");
        return None;
    }
    let record = RawRecord::new()
        .with("ticket_id", ticket_id)
        .with("user_id", ctx.user_id())
        .with("hours", hours)
        .with("note", note.unwrap_or_default())
        .with("logged_at", Utc::now().to_rfc3339());
    ctx.act("log time", ctx.backend.insert(TIME_ENTRIES, record), |_| {
        format!("Logged {hours}h")
    })
    .await
    .map(|row| TimeEntry::from(&row))
}

pub async fn fetch_time_entries(
    ctx: &ActionContext,
    ticket_id: &str,
) -> Result<Vec<TimeEntry>, BackendError> {
    let filter = Filter::new()
        .eq("ticket_id", ticket_id)
        .order_by("logged_at", false);
    let rows = ctx.call(ctx.backend.select(TIME_ENTRIES, &filter)).await?;
    Ok(rows.iter().map(TimeEntry::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{harness, Call, MockBackend};

    fn seeded() -> MockBackend {
        MockBackend::new().seed(
            TICKETS,
            vec![
                RawRecord::new()
                    .with("id", "t1")
                    .with("type", "bug")
                    .with("project_id", "p1"),
                RawRecord::new().with("id", "t2").with("project_id", "p2"),
            ],
        )
    }

    #[tokio::test]
    async fn fetch_normalizes_rows() {
        let h = harness(seeded());
        let tickets = fetch_tickets(&h.ctx, None).await.unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].ticket_type, "bug");
        assert_eq!(tickets[1].kind, "task");
        assert!(tickets[1].is_project_ticket);
    }

    #[tokio::test]
    async fn fetch_by_project() {
        let h = harness(seeded());
        let tickets = fetch_tickets(&h.ctx, Some("p2")).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, "t2");
    }

    #[tokio::test]
    async fn create_ticket_inserts_once_and_notifies() {
        let h = harness(MockBackend::new());
        let ticket = create_ticket(
            &h.ctx,
            NewTicket {
                project_id: Some("p1".into()),
                ..NewTicket::titled("Draft cap table")
            },
        )
        .await
        .unwrap();

        assert_eq!(ticket.title, "Draft cap table");
        assert_eq!(ticket.kind, "task");
        assert_eq!(ticket.health, "good");
        assert!(ticket.is_project_ticket);
        assert_eq!(h.backend.calls().len(), 1);
        assert!(matches!(&h.backend.calls()[0], Call::Insert(t, _) if t == TICKETS));
        assert_eq!(h.notifier.successes().len(), 1);
        assert!(h.notifier.failures().is_empty());
    }

    #[tokio::test]
    async fn create_ticket_failure_returns_none_with_one_toast() {
        let h = harness(MockBackend::failing("new row violates row-level security"));
        let result = create_ticket(&h.ctx, NewTicket::titled("Anything")).await;

        assert!(result.is_none());
        let failures = h.notifier.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("row-level security"));
        assert!(h.notifier.successes().is_empty());
    }

    #[tokio::test]
    async fn create_ticket_rejects_blank_title_without_calling_backend() {
        let h = harness(MockBackend::new());
        assert!(create_ticket(&h.ctx, NewTicket::titled("  ")).await.is_none());
        assert!(h.backend.calls().is_empty());
        assert_eq!(h.notifier.failures().len(), 1);
    }

    #[tokio::test]
    async fn create_ticket_cancelled_is_silent() {
        let h = harness(MockBackend::hanging());
        let ctx = h.ctx.clone();
        let task = tokio::spawn(async move { create_ticket(&ctx, NewTicket::titled("Later")).await });
        tokio::task::yield_now().await;
        h.ctx.cancel.cancel();
        assert!(task.await.unwrap().is_none());
        assert!(h.notifier.all().is_empty());
    }

    #[tokio::test]
    async fn status_change_patches_status() {
        let h = harness(seeded());
        let ticket = set_ticket_status(&h.ctx, "t1", TicketStatus::Review)
            .await
            .unwrap();
        assert_eq!(ticket.status(), TicketStatus::Review);
        assert_eq!(ticket.kind, "bug");
        assert_eq!(h.notifier.successes()[0].message, "Ticket moved to review");
    }

    #[tokio::test]
    async fn update_missing_ticket_fails() {
        let h = harness(seeded());
        let patch = TicketPatch {
            health: Some("off_track".into()),
            ..TicketPatch::default()
        };
        assert!(update_ticket(&h.ctx, "nope", patch).await.is_none());
        assert_eq!(h.notifier.failures().len(), 1);
    }

    #[tokio::test]
    async fn update_writes_only_given_fields() {
        let h = harness(seeded());
        let patch = TicketPatch {
            health: Some("at_risk".into()),
            ..TicketPatch::default()
        };
        let ticket = update_ticket(&h.ctx, "t2", patch).await.unwrap();
        assert_eq!(ticket.health, "at_risk");
        match &h.backend.calls()[0] {
            Call::Update(_, _, patch) => {
                assert!(patch.get("title").is_none());
                assert!(patch.get("updated_at").is_some());
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_ticket_reports_outcome() {
        let h = harness(seeded());
        assert!(delete_ticket(&h.ctx, "t1").await);
        assert_eq!(h.backend.rows(TICKETS).len(), 1);

        let h = harness(MockBackend::failing("forbidden"));
        assert!(!delete_ticket(&h.ctx, "t1").await);
        assert_eq!(h.notifier.failures().len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_missing_ticket_fails() {
        let h = harness(MockBackend::new());
        assert!(!delete_ticket(&h.ctx, "does-not-exist").await);
        assert!(h.notifier.successes().is_empty());
        let failures = h.notifier.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.starts_with("Could not delete ticket"));
    }

    #[tokio::test]
    async fn log_time_validates_hours() {
        let h = harness(MockBackend::new());
        assert!(log_time(&h.ctx, "t1", 0.0, None).await.is_none());
        assert!(log_time(&h.ctx, "t1", f64::NAN, None).await.is_none());
        assert!(h.backend.calls().is_empty());
        assert_eq!(h.notifier.failures().len(), 2);
    }

    #[tokio::test]
    async fn log_time_records_entry_for_session_user() {
        let h = harness(MockBackend::new());
        let entry = log_time(&h.ctx, "t1", 1.5, Some("review call"))
            .await
            .unwrap();
        assert_eq!(entry.user_id, "user-1");
        assert_eq!(entry.hours, 1.5);
        assert_eq!(entry.note, "review call");

        let entries = fetch_time_entries(&h.ctx, "t1").await.unwrap();
        assert_eq!(entries.len(), 1);
    }
}
