use std::cmp::Reverse;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    BloodRequest, CooldownRemaining, DispatchReport, Donation, NewBloodRequest, RequestStatus,
    User, UserPatch,
};
use crate::domain::cooldown::CooldownPolicy;
use crate::domain::error::DomainError;
use crate::domain::events::DonationDomainEvent;
use crate::domain::matching;
use crate::domain::notifications::NotificationDispatcher;
use crate::domain::ports::{EventPublisher, NotificationContext};
use crate::domain::repo::SharedStore;
use crate::domain::validation::{require_non_blank, validate_email, validate_units};

/// Domain service with the matching, donation and cooldown rules.
/// Depends only on ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    store: Arc<SharedStore>,
    dispatcher: NotificationDispatcher,
    events: Arc<dyn EventPublisher<DonationDomainEvent>>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub cooldown: CooldownPolicy,
    pub max_units_per_request: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cooldown: CooldownPolicy::default(),
            max_units_per_request: 20,
        }
    }
}

fn newest_first(mut requests: Vec<BloodRequest>) -> Vec<BloodRequest> {
    // Stable sort over reversed insertion order: later inserts win ties.
    requests.reverse();
    requests.sort_by_key(|r| Reverse(r.created_at));
    requests
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        store: Arc<SharedStore>,
        dispatcher: NotificationDispatcher,
        events: Arc<dyn EventPublisher<DonationDomainEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            events,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- users ---

    #[instrument(name = "blood_donation.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        debug!("Getting user by id");
        let snapshot = self.store.snapshot().await?;
        snapshot
            .user(id)
            .map(|r| r.user.clone())
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "blood_donation.service.update_profile", skip(self), fields(user_id = %id))]
    pub async fn update_profile(&self, id: Uuid, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating profile");
        Self::validate_patch(&patch)?;

        let updated = self
            .store
            .update(|snapshot| {
                if snapshot.user(id).is_none() {
                    return Err(DomainError::user_not_found(id));
                }
                if let Some(email) = patch.email.as_deref() {
                    if snapshot.email_taken(email, Some(id)) {
                        return Err(DomainError::email_already_exists(email.trim()));
                    }
                }
                let record = snapshot
                    .user_mut(id)
                    .ok_or_else(|| DomainError::user_not_found(id))?;
                let user = &mut record.user;
                if let Some(name) = patch.name {
                    user.name = name.trim().to_string();
                }
                if let Some(email) = patch.email {
                    user.email = email.trim().to_string();
                }
                if let Some(phone) = patch.phone {
                    user.phone = phone.trim().to_string();
                }
                if let Some(locality) = patch.locality {
                    user.locality = locality.trim().to_string();
                }
                if let Some(role) = patch.role {
                    user.role = role;
                }
                Ok(user.clone())
            })
            .await?;

        info!("Profile updated");
        Ok(updated)
    }

    // --- requests ---

    #[instrument(
        name = "blood_donation.service.create_request",
        skip(self, new_request),
        fields(
            requestor_id = %requestor_id,
            blood_group = %new_request.blood_group,
            locality = %new_request.locality
        )
    )]
    pub async fn create_request(
        &self,
        requestor_id: Uuid,
        new_request: NewBloodRequest,
    ) -> Result<BloodRequest, DomainError> {
        info!("Creating blood request");
        self.validate_new_request(&new_request)?;

        let (request, volunteers) = self
            .store
            .update(|snapshot| {
                let requestor = snapshot
                    .user(requestor_id)
                    .ok_or_else(|| DomainError::user_not_found(requestor_id))?;
                if !matching::can_post_requests(&requestor.user) {
                    return Err(DomainError::validation(
                        "role",
                        "only requestors can post blood requests",
                    ));
                }

                let request = BloodRequest {
                    id: Uuid::new_v4(),
                    requestor_id,
                    patient_name: new_request.patient_name.trim().to_string(),
                    blood_group: new_request.blood_group,
                    units: new_request.units,
                    hospital: new_request.hospital.trim().to_string(),
                    locality: new_request.locality.trim().to_string(),
                    urgency: new_request.urgency,
                    status: RequestStatus::Open,
                    created_at: Utc::now(),
                };
                let volunteers =
                    matching::find_matches(snapshot.users.iter().map(|r| &r.user), &request);
                snapshot.requests.push(request.clone());
                Ok((request, volunteers))
            })
            .await?;

        let report = self
            .dispatcher
            .dispatch(&volunteers, &NotificationContext::from(&request))
            .await;

        self.events.publish(&DonationDomainEvent::RequestCreated {
            id: request.id,
            requestor_id,
            matched: volunteers.len(),
            at: request.created_at,
        });

        info!(
            request_id = %request.id,
            matched = volunteers.len(),
            notified = report.delivered.len(),
            "Blood request created"
        );
        Ok(request)
    }

    #[instrument(name = "blood_donation.service.get_request", skip(self), fields(request_id = %id))]
    pub async fn get_request(&self, id: Uuid) -> Result<BloodRequest, DomainError> {
        debug!("Getting request by id");
        let snapshot = self.store.snapshot().await?;
        snapshot
            .request(id)
            .cloned()
            .ok_or_else(|| DomainError::request_not_found(id))
    }

    /// All requests, newest first.
    #[instrument(name = "blood_donation.service.list_requests", skip(self))]
    pub async fn list_requests(&self) -> Result<Vec<BloodRequest>, DomainError> {
        let snapshot = self.store.snapshot().await?;
        let requests = newest_first(snapshot.requests);
        debug!("Listed {} requests", requests.len());
        Ok(requests)
    }

    #[instrument(
        name = "blood_donation.service.requests_by_requestor",
        skip(self),
        fields(requestor_id = %requestor_id)
    )]
    pub async fn requests_by_requestor(
        &self,
        requestor_id: Uuid,
    ) -> Result<Vec<BloodRequest>, DomainError> {
        let snapshot = self.store.snapshot().await?;
        if snapshot.user(requestor_id).is_none() {
            return Err(DomainError::user_not_found(requestor_id));
        }
        let own = snapshot
            .requests
            .into_iter()
            .filter(|r| r.requestor_id == requestor_id)
            .collect();
        Ok(newest_first(own))
    }

    #[instrument(
        name = "blood_donation.service.open_requests_for_volunteer",
        skip(self),
        fields(user_id = %user_id)
    )]
    pub async fn open_requests_for_volunteer(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BloodRequest>, DomainError> {
        let snapshot = self.store.snapshot().await?;
        let volunteer = snapshot
            .user(user_id)
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        let open = matching::open_requests_for(&volunteer.user, &snapshot.requests);
        debug!("Found {} open requests for volunteer", open.len());
        Ok(newest_first(open))
    }

    #[instrument(
        name = "blood_donation.service.close_request",
        skip(self),
        fields(requestor_id = %requestor_id, request_id = %request_id)
    )]
    pub async fn close_request(
        &self,
        requestor_id: Uuid,
        request_id: Uuid,
    ) -> Result<BloodRequest, DomainError> {
        info!("Closing request");
        let (request, changed) = self
            .store
            .update(|snapshot| {
                let request = snapshot
                    .request_mut(request_id)
                    .ok_or_else(|| DomainError::request_not_found(request_id))?;
                if request.requestor_id != requestor_id {
                    return Err(DomainError::validation(
                        "requestor",
                        "only the requestor can close this request",
                    ));
                }
                if request.status == RequestStatus::Closed {
                    return Ok((request.clone(), false));
                }
                request.status = RequestStatus::Closed;
                Ok((request.clone(), true))
            })
            .await?;

        if changed {
            self.events.publish(&DonationDomainEvent::RequestClosed {
                id: request.id,
                at: Utc::now(),
            });
            info!("Request closed");
        } else {
            debug!("Request was already closed");
        }
        Ok(request)
    }

    // --- matching ---

    /// Eligible volunteers in store order. Unknown request yields an empty list.
    #[instrument(name = "blood_donation.service.find_matches", skip(self), fields(request_id = %request_id))]
    pub async fn find_matches(&self, request_id: Uuid) -> Result<Vec<User>, DomainError> {
        let snapshot = self.store.snapshot().await?;
        let Some(request) = snapshot.request(request_id) else {
            debug!("Request not found, no matches");
            return Ok(Vec::new());
        };
        let found = matching::find_matches(snapshot.users.iter().map(|r| &r.user), request);
        debug!("Found {} matching volunteers", found.len());
        Ok(found)
    }

    /// Re-run the fan-out for a stored request. A failed delivery is
    /// reported, never propagated, so every other volunteer is still tried.
    #[instrument(name = "blood_donation.service.notify_matches", skip(self), fields(request_id = %request_id))]
    pub async fn notify_matches(&self, request_id: Uuid) -> Result<DispatchReport, DomainError> {
        let snapshot = self.store.snapshot().await?;
        let request = snapshot
            .request(request_id)
            .ok_or_else(|| DomainError::request_not_found(request_id))?;
        let volunteers = matching::find_matches(snapshot.users.iter().map(|r| &r.user), request);
        let report = self
            .dispatcher
            .dispatch(&volunteers, &NotificationContext::from(request))
            .await;
        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Matched volunteers notified"
        );
        Ok(report)
    }

    #[instrument(
        name = "blood_donation.service.notify_volunteer",
        skip(self),
        fields(request_id = %request_id, volunteer_id = %volunteer_id)
    )]
    pub async fn notify_volunteer(
        &self,
        request_id: Uuid,
        volunteer_id: Uuid,
    ) -> Result<(), DomainError> {
        let snapshot = self.store.snapshot().await?;
        let request = snapshot
            .request(request_id)
            .ok_or_else(|| DomainError::request_not_found(request_id))?;
        let volunteer = snapshot
            .user(volunteer_id)
            .ok_or_else(|| DomainError::user_not_found(volunteer_id))?;
        if !matching::is_match(&volunteer.user, request) {
            return Err(DomainError::validation(
                "volunteer",
                "does not match this request",
            ));
        }

        self.dispatcher
            .notify_one(&volunteer.user, &NotificationContext::from(request))
            .await?;
        info!("Volunteer notified");
        Ok(())
    }

    // --- donations ---

    pub async fn record_donation(
        &self,
        donor_id: Uuid,
        request_id: Uuid,
    ) -> Result<Donation, DomainError> {
        self.record_donation_at(donor_id, request_id, Utc::now())
            .await
    }

    /// Append the donation, bump the donor's count, mark the request matched
    /// and start the donor's cooldown, all in one store write.
    #[instrument(
        name = "blood_donation.service.record_donation",
        skip(self),
        fields(donor_id = %donor_id, request_id = %request_id)
    )]
    pub async fn record_donation_at(
        &self,
        donor_id: Uuid,
        request_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Donation, DomainError> {
        info!("Recording donation");

        let donation = self
            .store
            .update(|snapshot| {
                if snapshot.user(donor_id).is_none() {
                    return Err(DomainError::user_not_found(donor_id));
                }
                let request = snapshot
                    .request_mut(request_id)
                    .ok_or_else(|| DomainError::request_not_found(request_id))?;
                if !request.status.can_transition_to(RequestStatus::Matched) {
                    return Err(DomainError::invalid_transition(
                        request.status,
                        RequestStatus::Matched,
                    ));
                }
                if request.status == RequestStatus::Matched {
                    warn!("Request already matched, recording another donation");
                }
                request.status = RequestStatus::Matched;

                let donation = Donation {
                    id: Uuid::new_v4(),
                    donor_id,
                    request_id,
                    donation_date: at,
                    patient_name: request.patient_name.clone(),
                };

                let donor = snapshot
                    .user_mut(donor_id)
                    .ok_or_else(|| DomainError::user_not_found(donor_id))?;
                donor.user.donations += 1;
                donor.last_donation_at = Some(at);

                snapshot.donations.push(donation.clone());
                Ok(donation)
            })
            .await?;

        self.events.publish(&DonationDomainEvent::DonationRecorded {
            id: donation.id,
            donor_id,
            request_id,
            at: donation.donation_date,
        });

        info!(donation_id = %donation.id, "Donation recorded");
        Ok(donation)
    }

    /// Donation history, newest first.
    #[instrument(name = "blood_donation.service.donations_by_donor", skip(self), fields(donor_id = %donor_id))]
    pub async fn donations_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>, DomainError> {
        let snapshot = self.store.snapshot().await?;
        if snapshot.user(donor_id).is_none() {
            return Err(DomainError::user_not_found(donor_id));
        }
        let mut history: Vec<Donation> = snapshot.donations_by(donor_id).cloned().collect();
        history.reverse();
        history.sort_by_key(|d| Reverse(d.donation_date));
        Ok(history)
    }

    // --- cooldown ---

    pub async fn is_in_cooldown(&self, donor_id: Uuid) -> Result<bool, DomainError> {
        self.is_in_cooldown_at(donor_id, Utc::now()).await
    }

    pub async fn is_in_cooldown_at(
        &self,
        donor_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        Ok(self.cooldown_remaining_at(donor_id, as_of).await?.is_some())
    }

    pub async fn cooldown_remaining(
        &self,
        donor_id: Uuid,
    ) -> Result<Option<CooldownRemaining>, DomainError> {
        self.cooldown_remaining_at(donor_id, Utc::now()).await
    }

    /// Time left in the donor's window at `as_of`, or `None` when they may
    /// donate. A marker whose window has passed is cleared on the way out.
    #[instrument(
        name = "blood_donation.service.cooldown_remaining",
        skip(self),
        fields(donor_id = %donor_id, as_of = %as_of)
    )]
    pub async fn cooldown_remaining_at(
        &self,
        donor_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<Option<CooldownRemaining>, DomainError> {
        let snapshot = self.store.snapshot().await?;
        let record = snapshot
            .user(donor_id)
            .ok_or_else(|| DomainError::user_not_found(donor_id))?;

        let marker = record.last_donation_at;
        let Some(started) = marker.or_else(|| snapshot.latest_donation_at(donor_id)) else {
            debug!("No donation on record");
            return Ok(None);
        };

        let policy = self.config.cooldown;
        if let Some(left) = policy.remaining(started, as_of) {
            debug!(remaining = %left, "Donor in cooldown");
            return Ok(Some(left));
        }

        if let Some(seen) = marker {
            self.store
                .update(|snapshot| {
                    if let Some(record) = snapshot.user_mut(donor_id) {
                        // A newer donation may have landed since the read.
                        if record.last_donation_at == Some(seen) {
                            record.last_donation_at = None;
                        }
                    }
                    Ok(())
                })
                .await?;
            info!(ended_at = %policy.ends_at(seen), "Cooldown over, marker cleared");
        }
        Ok(None)
    }

    // --- validation helpers ---

    fn validate_patch(patch: &UserPatch) -> Result<(), DomainError> {
        if let Some(name) = &patch.name {
            require_non_blank("name", name)?;
        }
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        if let Some(phone) = &patch.phone {
            require_non_blank("phone", phone)?;
        }
        if let Some(locality) = &patch.locality {
            require_non_blank("locality", locality)?;
        }
        Ok(())
    }

    fn validate_new_request(&self, new_request: &NewBloodRequest) -> Result<(), DomainError> {
        require_non_blank("patient_name", &new_request.patient_name)?;
        require_non_blank("hospital", &new_request.hospital)?;
        require_non_blank("locality", &new_request.locality)?;
        validate_units(new_request.units, self.config.max_units_per_request)
    }
}
