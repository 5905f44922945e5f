use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::BloodDonationError,
    model::{
        AuthSession, BloodRequest, CooldownRemaining, DispatchReport, Donation, NewBloodRequest,
        NewUser, User, UserPatch,
    },
};

/// Public API trait for the blood_donation module that callers (CLI, UI adapters) use
#[async_trait]
pub trait BloodDonationApi: Send + Sync {
    // --- identity ---

    /// Register a new account and open a session for it
    async fn register(&self, new_user: NewUser) -> Result<AuthSession, BloodDonationError>;

    /// Authenticate by email and password and open a session
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BloodDonationError>;

    /// Drop the current session
    async fn logout(&self) -> Result<(), BloodDonationError>;

    /// User behind the current session, if any
    async fn current_user(&self) -> Result<Option<User>, BloodDonationError>;

    async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<(), BloodDonationError>;

    // --- users ---

    async fn get_user(&self, id: Uuid) -> Result<User, BloodDonationError>;

    async fn update_profile(&self, id: Uuid, patch: UserPatch) -> Result<User, BloodDonationError>;

    // --- requests ---

    /// Post a request; matching volunteers are notified once it is stored
    async fn create_request(
        &self,
        requestor_id: Uuid,
        new_request: NewBloodRequest,
    ) -> Result<BloodRequest, BloodDonationError>;

    async fn get_request(&self, id: Uuid) -> Result<BloodRequest, BloodDonationError>;

    /// All requests, newest first
    async fn list_requests(&self) -> Result<Vec<BloodRequest>, BloodDonationError>;

    async fn requests_by_requestor(
        &self,
        requestor_id: Uuid,
    ) -> Result<Vec<BloodRequest>, BloodDonationError>;

    /// Open requests a volunteer could answer
    async fn open_requests_for_volunteer(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<BloodRequest>, BloodDonationError>;

    async fn close_request(
        &self,
        requestor_id: Uuid,
        request_id: Uuid,
    ) -> Result<BloodRequest, BloodDonationError>;

    // --- matching and donations ---

    /// Eligible volunteers for a request; empty when the request does not exist
    async fn find_matches(&self, request_id: Uuid) -> Result<Vec<User>, BloodDonationError>;

    /// Notify every matching volunteer; failed deliveries are reported, not raised
    async fn notify_matches(&self, request_id: Uuid) -> Result<DispatchReport, BloodDonationError>;

    async fn notify_volunteer(
        &self,
        request_id: Uuid,
        volunteer_id: Uuid,
    ) -> Result<(), BloodDonationError>;

    async fn record_donation(
        &self,
        donor_id: Uuid,
        request_id: Uuid,
    ) -> Result<Donation, BloodDonationError>;

    /// Donation history, newest first
    async fn donations_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>, BloodDonationError>;

    async fn is_in_cooldown(&self, donor_id: Uuid) -> Result<bool, BloodDonationError>;

    async fn cooldown_remaining(
        &self,
        donor_id: Uuid,
    ) -> Result<Option<CooldownRemaining>, BloodDonationError>;
}
