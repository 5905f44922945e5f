use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DOCUMENT_VERSION: u32 = 1;

/// On-disk layout of the whole data set. Enums are kept as their display
/// strings and parsed on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub users: Vec<UserRow>,
    #[serde(default)]
    pub requests: Vec<RequestRow>,
    #[serde(default)]
    pub donations: Vec<DonationRow>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: String,
    pub sex: String,
    pub locality: String,
    pub role: String,
    #[serde(default)]
    pub donations: u32,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_donation_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRow {
    pub id: Uuid,
    pub requestor_id: Uuid,
    pub patient_name: String,
    pub blood_group: String,
    pub units: u32,
    pub hospital: String,
    pub locality: String,
    pub urgency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRow {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub request_id: Uuid,
    pub donation_date: DateTime<Utc>,
    pub patient_name: String,
}
