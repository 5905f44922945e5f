use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonationDomainEvent {
    UserRegistered {
        id: Uuid,
        at: DateTime<Utc>,
    },
    RequestCreated {
        id: Uuid,
        requestor_id: Uuid,
        matched: usize,
        at: DateTime<Utc>,
    },
    DonationRecorded {
        id: Uuid,
        donor_id: Uuid,
        request_id: Uuid,
        at: DateTime<Utc>,
    },
    RequestClosed {
        id: Uuid,
        at: DateTime<Utc>,
    },
}
