use async_trait::async_trait;
use tracing::info;

use crate::contract::model::User;
use crate::domain::error::DomainError;
use crate::domain::ports::{NotificationContext, Notifier};

/// Delivery stand-in that writes one structured log line per volunteer.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user: &User, ctx: &NotificationContext) -> Result<(), DomainError> {
        info!(
            target: "blood_donation::notify",
            volunteer_id = %user.id,
            volunteer = %user.name,
            request_id = %ctx.request_id,
            blood_group = %ctx.blood_group,
            urgency = %ctx.urgency,
            hospital = %ctx.hospital,
            "Volunteer notified of blood request"
        );
        Ok(())
    }
}
