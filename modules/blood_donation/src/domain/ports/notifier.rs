use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{BloodGroup, BloodRequest, Urgency, User};
use crate::domain::error::DomainError;

/// What a volunteer is told about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    pub request_id: Uuid,
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub hospital: String,
    pub locality: String,
    pub urgency: Urgency,
}

impl From<&BloodRequest> for NotificationContext {
    fn from(r: &BloodRequest) -> Self {
        Self {
            request_id: r.id,
            patient_name: r.patient_name.clone(),
            blood_group: r.blood_group,
            units: r.units,
            hospital: r.hospital.clone(),
            locality: r.locality.clone(),
            urgency: r.urgency,
        }
    }
}

/// One-way delivery of a "you match this request" message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &User, ctx: &NotificationContext) -> Result<(), DomainError>;
}
