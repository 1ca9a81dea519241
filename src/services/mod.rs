//! One async function per user action. Each action issues exactly one
//! backend call, reports the outcome through the context's [`Notifier`],
//! and hands back `Some`/`true` or `None`/`false`. Failures are logged and
//! swallowed here; callers check the sentinel.
//!
//! Read paths return `Result` and leave reporting to the view.

pub mod applications;
pub mod bucket;
pub mod cv;
pub mod messages;
pub mod profile;
pub mod tickets;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError, ObjectStore};

/// The signed-in user. Supplied by configuration; read-only for the life
/// of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Failure,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: Level::Failure,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Everything an action needs, passed explicitly instead of read from
/// process-wide state.
#[derive(Clone)]
pub struct ActionContext {
    pub backend: Arc<dyn Backend>,
    pub storage: Arc<dyn ObjectStore>,
    pub session: Arc<Session>,
    pub notifier: Arc<dyn Notifier>,
    pub cancel: CancellationToken,
}

impl ActionContext {
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn ObjectStore>,
        session: Session,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            storage,
            session: Arc::new(session),
            notifier,
            cancel,
        }
    }

    /// Same backend and session, with a cancellation scope nested under
    /// this one.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            ..self.clone()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }

    /// Awaits `fut` unless the scope is cancelled first.
    pub async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BackendError::Cancelled),
            result = fut => result,
        }
    }

    /// Runs a side-effecting call and reports its outcome. `what` names the
    /// action in the failure toast ("Could not {what}: ...").
    pub(crate) async fn act<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T, BackendError>>,
        success: impl FnOnce(&T) -> String,
    ) -> Option<T> {
        match self.call(fut).await {
            Ok(value) => {
                info!(action = what, "action succeeded");
                self.notifier.notify(Notification::success(success(&value)));
                Some(value)
            }
            Err(BackendError::Cancelled) => {
                debug!(action = what, "action cancelled");
                None
            }
            Err(e) => {
                warn!(action = what, error = %e, "action failed");
                self.notifier
                    .notify(Notification::failure(format!("Could not {what}: {e}")));
                None
            }
        }
    }

    /// Reports an action refused before reaching the backend.
    pub(crate) fn reject(&self, what: &str, reason: &str) {
        warn!(action = what, reason, "action rejected");
        self.notifier
            .notify(Notification::failure(format!("Could not {what}: {reason}")));
    }
}
