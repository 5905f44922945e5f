use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::contract::model::User;
use crate::domain::error::DomainError;
use crate::domain::ports::{NotificationContext, Notifier};

/// Body of `POST /api/notifications/blood-request`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BloodRequestNotification<'a> {
    volunteer_id: Uuid,
    volunteer_name: &'a str,
    volunteer_email: &'a str,
    volunteer_phone: &'a str,
    request_id: Uuid,
    patient_name: &'a str,
    blood_group: &'a str,
    units: u32,
    hospital: &'a str,
    locality: &'a str,
    urgency: &'a str,
}

/// Posts one JSON message per volunteer to a notification service.
pub struct HttpNotifier {
    client: reqwest::Client,
    base: Url,
}

impl HttpNotifier {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self) -> Result<Url, DomainError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DomainError::validation("notifications", "invalid notifications base URL"))?
            .pop_if_empty()
            .extend(&["api", "notifications", "blood-request"]);
        Ok(url)
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    #[instrument(
        name = "blood_donation.http.notifications.blood_request",
        skip_all,
        fields(base = %self.base, volunteer_id = %user.id, request_id = %ctx.request_id)
    )]
    async fn notify(&self, user: &User, ctx: &NotificationContext) -> Result<(), DomainError> {
        let url = self.endpoint()?;
        let body = BloodRequestNotification {
            volunteer_id: user.id,
            volunteer_name: &user.name,
            volunteer_email: &user.email,
            volunteer_phone: &user.phone,
            request_id: ctx.request_id,
            patient_name: &ctx.patient_name,
            blood_group: ctx.blood_group.as_str(),
            units: ctx.units,
            hospital: &ctx.hospital,
            locality: &ctx.locality,
            urgency: ctx.urgency.as_str(),
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .context("POST /api/notifications/blood-request")
            .map_err(|e| DomainError::notification(format!("{e:#}")))?;

        if !response.status().is_success() {
            return Err(DomainError::notification(format!(
                "HTTP {}",
                response.status()
            )));
        }

        debug!("Notification accepted");
        Ok(())
    }
}
