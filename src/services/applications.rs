use super::ActionContext;
use crate::backend::{BackendError, Filter};
use crate::model::job_application::{JobApplication, DEFAULT_APPLICATION_STATUS};
use crate::model::raw::RawRecord;

pub const JOB_APPLICATIONS: &str = "job_applications";

/// Embeds the task and its project so the role summary can be filled in.
const WITH_ROLE: &str = "*,task:tasks(title,project_id,project:projects(id,title))";

pub async fn fetch_for_applicant(ctx: &ActionContext) -> Result<Vec<JobApplication>, BackendError> {
    let filter = Filter::new()
        .eq("applicant_id", ctx.user_id())
        .columns(WITH_ROLE)
        .order_by("created_at", false);
    let rows = ctx.call(ctx.backend.select(JOB_APPLICATIONS, &filter)).await?;
    Ok(rows.iter().map(JobApplication::from).collect())
}

pub async fn fetch_for_task(
    ctx: &ActionContext,
    task_id: &str,
) -> Result<Vec<JobApplication>, BackendError> {
    let filter = Filter::new()
        .eq("task_id", task_id)
        .columns(WITH_ROLE)
        .order_by("created_at", false);
    let rows = ctx.call(ctx.backend.select(JOB_APPLICATIONS, &filter)).await?;
    Ok(rows.iter().map(JobApplication::from).collect())
}

pub async fn apply_to_task(
    ctx: &ActionContext,
    task_id: &str,
    message: Option<&str>,
) -> Option<JobApplication> {
    let record = RawRecord::new()
        .with("task_id", task_id)
        .with("applicant_id", ctx.user_id())
        .with("message", message.unwrap_or_default())
        .with("status", DEFAULT_APPLICATION_STATUS);
    ctx.act("submit application", ctx.backend.insert(JOB_APPLICATIONS, record), |_| {
        "Application submitted".to_string()
    })
    .await
    .map(|row| JobApplication::from(&row))
}

pub async fn accept_application(ctx: &ActionContext, id: &str) -> Option<JobApplication> {
    let patch = RawRecord::new().with("status", "accepted");
    let filter = Filter::by_id(id);
    ctx.act(
        "accept application",
        ctx.backend.update(JOB_APPLICATIONS, &filter, patch),
        |_| "Application accepted".to_string(),
    )
    .await
    .map(|row| JobApplication::from(&row))
}

pub async fn reject_application(
    ctx: &ActionContext,
    id: &str,
    reason: &str,
) -> Option<JobApplication> {
    let patch = RawRecord::new()
        .with("status", "rejected")
        .with("rejection_reason", reason.trim());
    let filter = Filter::by_id(id);
    ctx.act(
        "reject application",
        ctx.backend.update(JOB_APPLICATIONS, &filter, patch),
        |_| "Application rejected".to_string(),
    )
    .await
    .map(|row| JobApplication::from(&row))
}

pub async fn withdraw_application(ctx: &ActionContext, id: &str) -> bool {
    let filter = Filter::by_id(id).eq("applicant_id", ctx.user_id());
    ctx.act(
        "withdraw application",
        ctx.backend.remove(JOB_APPLICATIONS, &filter),
        |_| "Application withdrawn".to_string(),
    )
    .await
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{harness, Call, MockBackend};

    fn seeded() -> MockBackend {
        MockBackend::new().seed(
            JOB_APPLICATIONS,
            vec![
                RawRecord::new()
                    .with("job_app_id", "a1")
                    .with("id", "a1")
                    .with("task_id", "k1")
                    .with("applicant_id", "user-1"),
                RawRecord::new()
                    .with("id", "a2")
                    .with("task_id", "k1")
                    .with("applicant_id", "user-2"),
            ],
        )
    }

    #[tokio::test]
    async fn applicant_sees_only_own_applications() {
        let h = harness(seeded());
        let apps = fetch_for_applicant(&h.ctx).await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].job_app_id, "a1");
    }

    #[tokio::test]
    async fn task_owner_sees_all_applicants() {
        let h = harness(seeded());
        let apps = fetch_for_task(&h.ctx, "k1").await.unwrap();
        assert_eq!(apps.len(), 2);
        assert!(apps.iter().all(|a| a.id == a.job_app_id));
    }

    #[tokio::test]
    async fn apply_creates_pending_application() {
        let h = harness(MockBackend::new());
        let app = apply_to_task(&h.ctx, "k9", Some("I built two DAOs"))
            .await
            .unwrap();
        assert!(app.is_pending());
        assert_eq!(app.applicant_id, "user-1");
        assert_eq!(app.id, app.job_app_id);
        assert!(!app.id.is_empty());
        assert_eq!(h.notifier.successes().len(), 1);
    }

    #[tokio::test]
    async fn reject_stores_reason() {
        let h = harness(seeded());
        let app = reject_application(&h.ctx, "a2", " Role filled ").await.unwrap();
        assert_eq!(app.status, "rejected");
        match &h.backend.calls()[0] {
            Call::Update(_, filter, patch) => {
                assert_eq!(filter, &Filter::by_id("a2"));
                assert_eq!(patch.text("rejection_reason").as_deref(), Some("Role filled"));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn accept_failure_is_reported() {
        let h = harness(MockBackend::failing("permission denied"));
        assert!(accept_application(&h.ctx, "a1").await.is_none());
        assert_eq!(h.notifier.failures().len(), 1);
        assert_eq!(h.backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn withdraw_only_touches_own_application() {
        let h = harness(seeded());
        assert!(!withdraw_application(&h.ctx, "a2").await);
        assert_eq!(h.backend.rows(JOB_APPLICATIONS).len(), 2);
        assert_eq!(h.notifier.failures().len(), 1);
        assert!(h.notifier.successes().is_empty());

        assert!(withdraw_application(&h.ctx, "a1").await);
        assert_eq!(h.backend.rows(JOB_APPLICATIONS).len(), 1);
        assert_eq!(h.notifier.successes().len(), 1);
    }
}
