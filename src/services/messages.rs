use chrono::Utc;

use super::ActionContext;
use crate::backend::{BackendError, Filter};
use crate::model::message::Message;
use crate::model::raw::RawRecord;

pub const MESSAGES: &str = "messages";

pub async fn fetch_inbox(ctx: &ActionContext) -> Result<Vec<Message>, BackendError> {
    let filter = Filter::new()
        .eq("recipient_id", ctx.user_id())
        .order_by("created_at", false);
    let rows = ctx.call(ctx.backend.select(MESSAGES, &filter)).await?;
    Ok(rows.iter().map(Message::from).collect())
}

pub async fn send_message(ctx: &ActionContext, recipient_id: &str, body: &str) -> Option<Message> {
    let body = body.trim();
    if body.is_empty() {
        ctx.reject("send message", "message is empty");
        return None;
    }
    let record = RawRecord::new()
        .with("sender_id", ctx.user_id())
        .with("recipient_id", recipient_id)
        .with("body", body)
        .with("read", false)
        .with("created_at", Utc::now().to_rfc3339());
    ctx.act("send message", ctx.backend.insert(MESSAGES, record), |_| {
        "Message sent".to_string()
    })
    .await
    .map(|row| Message::from(&row))
}

pub async fn mark_read(ctx: &ActionContext, id: &str) -> bool {
    let filter = Filter::by_id(id);
    let patch = RawRecord::new().with("read", true);
    ctx.act("mark message read", ctx.backend.update(MESSAGES, &filter, patch), |_| {
        "Marked as read".to_string()
    })
    .await
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{harness, MockBackend};

    #[tokio::test]
    async fn send_then_read_inbox() {
        let h = harness(MockBackend::new().seed(
            MESSAGES,
            vec![RawRecord::new()
                .with("id", "m1")
                .with("sender_id", "biz-7")
                .with("receiver_id", "user-1")
                .with("recipient_id", "user-1")
                .with("content", "Can you start Monday?")],
        ));
        let sent = send_message(&h.ctx, "biz-7", " Yes! ").await.unwrap();
        assert_eq!(sent.body, "Yes!");
        assert_eq!(sent.sender_id, "user-1");

        let inbox = fetch_inbox(&h.ctx).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].body, "Can you start Monday?");

        assert!(mark_read(&h.ctx, "m1").await);
        assert!(fetch_inbox(&h.ctx).await.unwrap()[0].read);
    }

    #[tokio::test]
    async fn empty_message_is_not_sent() {
        let h = harness(MockBackend::new());
        assert!(send_message(&h.ctx, "biz-7", "   ").await.is_none());
        assert!(h.backend.calls().is_empty());
        assert_eq!(h.notifier.failures().len(), 1);
    }
}
