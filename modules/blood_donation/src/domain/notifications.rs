use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::contract::model::{DispatchReport, User};
use crate::domain::error::DomainError;
use crate::domain::ports::{NotificationContext, Notifier};

/// Calls the notifier once per matched volunteer. Failures are logged and
/// dropped; they never reach the caller of the operation that triggered them.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn dispatch(&self, volunteers: &[User], ctx: &NotificationContext) -> DispatchReport {
        let calls = volunteers.iter().map(|user| async move {
            (user.id, self.notifier.notify(user, ctx).await)
        });

        let mut report = DispatchReport::default();
        for (user_id, outcome) in join_all(calls).await {
            match outcome {
                Ok(()) => report.delivered.push(user_id),
                Err(e) => {
                    warn!(%user_id, request_id = %ctx.request_id, error = %e, "notification failed");
                    report.failed.push(user_id);
                }
            }
        }
        debug!(
            request_id = %ctx.request_id,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "notification fan-out finished"
        );
        report
    }

    /// Single delivery whose error the caller wants to see.
    pub async fn notify_one(
        &self,
        volunteer: &User,
        ctx: &NotificationContext,
    ) -> Result<(), DomainError> {
        self.notifier.notify(volunteer, ctx).await
    }
}
