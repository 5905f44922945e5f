use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::BloodDonationApi,
    error::BloodDonationError,
    model::{
        AuthSession, BloodRequest, CooldownRemaining, DispatchReport, Donation, NewBloodRequest,
        NewUser, User, UserPatch,
    },
};
use crate::domain::service::Service;
use crate::domain::session::SessionGateway;

/// Local implementation of the BloodDonationApi trait that delegates to the domain layer
pub struct BloodDonationLocalClient {
    service: Arc<Service>,
    sessions: Arc<SessionGateway>,
}

impl BloodDonationLocalClient {
    pub fn new(service: Arc<Service>, sessions: Arc<SessionGateway>) -> Self {
        Self { service, sessions }
    }
}

#[async_trait]
impl BloodDonationApi for BloodDonationLocalClient {
    async fn register(&self, new_user: NewUser) -> Result<AuthSession, BloodDonationError> {
        self.sessions.register(new_user).await.map_err(Into::into)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BloodDonationError> {
        self.sessions
            .login(email, password)
            .await
            .map_err(Into::into)
    }

    async fn logout(&self) -> Result<(), BloodDonationError> {
        self.sessions.logout().await.map_err(Into::into)
    }

    async fn current_user(&self) -> Result<Option<User>, BloodDonationError> {
        self.sessions.current_user().await.map_err(Into::into)
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<(), BloodDonationError> {
        self.sessions
            .change_password(user_id, current, new_password)
            .await
            .map_err(Into::into)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, BloodDonationError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> Result<User, BloodDonationError> {
        self.service
            .update_profile(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn create_request(
        &self,
        requestor_id: Uuid,
        new_request: NewBloodRequest,
    ) -> Result<BloodRequest, BloodDonationError> {
        self.service
            .create_request(requestor_id, new_request)
            .await
            .map_err(Into::into)
    }

    async fn get_request(&self, id: Uuid) -> Result<BloodRequest, BloodDonationError> {
        self.service.get_request(id).await.map_err(Into::into)
    }

    async fn list_requests(&self) -> Result<Vec<BloodRequest>, BloodDonationError> {
        self.service.list_requests().await.map_err(Into::into)
    }

    async fn requests_by_requestor(
        &self,
        requestor_id: Uuid,
    ) -> Result<Vec<BloodRequest>, BloodDonationError> {
        self.service
            .requests_by_requestor(requestor_id)
            .await
            .map_err(Into::into)
    }

    async fn open_requests_for_volunteer(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BloodRequest>, BloodDonationError> {
        self.service
            .open_requests_for_volunteer(user_id)
            .await
            .map_err(Into::into)
    }

    async fn close_request(
        &self,
        requestor_id: Uuid,
        request_id: Uuid,
    ) -> Result<BloodRequest, BloodDonationError> {
        self.service
            .close_request(requestor_id, request_id)
            .await
            .map_err(Into::into)
    }

    async fn find_matches(&self, request_id: Uuid) -> Result<Vec<User>, BloodDonationError> {
        self.service
            .find_matches(request_id)
            .await
            .map_err(Into::into)
    }

    async fn notify_matches(&self, request_id: Uuid) -> Result<DispatchReport, BloodDonationError> {
        self.service
            .notify_matches(request_id)
            .await
            .map_err(Into::into)
    }

    async fn notify_volunteer(
        &self,
        request_id: Uuid,
        volunteer_id: Uuid,
    ) -> Result<(), BloodDonationError> {
        self.service
            .notify_volunteer(request_id, volunteer_id)
            .await
            .map_err(Into::into)
    }

    async fn record_donation(
        &self,
        donor_id: Uuid,
        request_id: Uuid,
    ) -> Result<Donation, BloodDonationError> {
        self.service
            .record_donation(donor_id, request_id)
            .await
            .map_err(Into::into)
    }

    async fn donations_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>, BloodDonationError> {
        self.service
            .donations_by_donor(donor_id)
            .await
            .map_err(Into::into)
    }

    async fn is_in_cooldown(&self, donor_id: Uuid) -> Result<bool, BloodDonationError> {
        self.service
            .is_in_cooldown(donor_id)
            .await
            .map_err(Into::into)
    }

    async fn cooldown_remaining(
        &self,
        donor_id: Uuid,
    ) -> Result<Option<CooldownRemaining>, BloodDonationError> {
        self.service
            .cooldown_remaining(donor_id)
            .await
            .map_err(Into::into)
    }
}
