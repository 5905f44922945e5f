//! Who may answer a blood request.

use crate::contract::model::{BloodRequest, RequestStatus, User, UserRole};

/// The one role check used everywhere a volunteer is expected.
pub fn is_eligible_volunteer(user: &User) -> bool {
    matches!(user.role, UserRole::Volunteer | UserRole::Both)
}

pub fn can_post_requests(user: &User) -> bool {
    matches!(user.role, UserRole::Requestor | UserRole::Both)
}

/// Case-insensitive, whitespace-exact comparison.
pub fn same_locality(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Role, exact blood group, locality and not-the-requestor.
pub fn is_match(user: &User, request: &BloodRequest) -> bool {
    is_eligible_volunteer(user)
        && user.blood_group == request.blood_group
        && same_locality(&user.locality, &request.locality)
        && user.id != request.requestor_id
}

/// Matching users in input order.
pub fn find_matches<'a, I>(users: I, request: &BloodRequest) -> Vec<User>
where
    I: IntoIterator<Item = &'a User>,
{
    users
        .into_iter()
        .filter(|u| is_match(u, request))
        .cloned()
        .collect()
}

/// Dashboard view for a volunteer: open requests they could answer.
pub fn open_requests_for<'a, I>(volunteer: &User, requests: I) -> Vec<BloodRequest>
where
    I: IntoIterator<Item = &'a BloodRequest>,
{
    if !is_eligible_volunteer(volunteer) {
        return Vec::new();
    }
    requests
        .into_iter()
        .filter(|r| r.status == RequestStatus::Open && is_match(volunteer, r))
        .cloned()
        .collect()
}
