use tracing::info;

use crate::domain::events::DonationDomainEvent;
use crate::domain::ports::EventPublisher;

/// Publishes domain events as structured log records.
#[derive(Debug, Default, Clone)]
pub struct TracingEventPublisher;

impl EventPublisher<DonationDomainEvent> for TracingEventPublisher {
    fn publish(&self, event: &DonationDomainEvent) {
        match event {
            DonationDomainEvent::UserRegistered { id, at } => {
                info!(target: "blood_donation::events", user_id = %id, %at, "user.registered");
            }
            DonationDomainEvent::RequestCreated {
                id,
                requestor_id,
                matched,
                at,
            } => {
                info!(
                    target: "blood_donation::events",
                    request_id = %id,
                    requestor_id = %requestor_id,
                    matched,
                    %at,
                    "request.created"
                );
            }
            DonationDomainEvent::DonationRecorded {
                id,
                donor_id,
                request_id,
                at,
            } => {
                info!(
                    target: "blood_donation::events",
                    donation_id = %id,
                    donor_id = %donor_id,
                    request_id = %request_id,
                    %at,
                    "donation.recorded"
                );
            }
            DonationDomainEvent::RequestClosed { id, at } => {
                info!(target: "blood_donation::events", request_id = %id, %at, "request.closed");
            }
        }
    }
}
