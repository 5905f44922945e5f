//! JSON shapes printed by the CLI.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use blood_donation::contract::model::{
    BloodRequest, CooldownRemaining, DispatchReport, Donation, User,
};

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: String,
    pub sex: String,
    pub locality: String,
    pub role: String,
    pub donations: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestDto {
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

#[derive(Debug, Clone, Serialize)]
pub struct DonationDto {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub request_id: Uuid,
    pub donation_date: DateTime<Utc>,
    pub patient_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CooldownDto {
    pub in_cooldown: bool,
    pub remaining: Option<String>,
    pub remaining_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotifyDto {
    pub attempted: usize,
    pub delivered: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusDto {
    pub ok: bool,
    pub message: String,
}

impl StatusDto {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            blood_group: user.blood_group.to_string(),
            sex: user.sex.to_string(),
            locality: user.locality,
            role: user.role.to_string(),
            donations: user.donations,
        }
    }
}

impl From<BloodRequest> for RequestDto {
    fn from(r: BloodRequest) -> Self {
        Self {
            id: r.id,
            requestor_id: r.requestor_id,
            patient_name: r.patient_name,
            blood_group: r.blood_group.to_string(),
            units: r.units,
            hospital: r.hospital,
            locality: r.locality,
            urgency: r.urgency.to_string(),
            status: r.status.to_string(),
            created_at: r.created_at,
        }
    }
}

impl From<Donation> for DonationDto {
    fn from(d: Donation) -> Self {
        Self {
            id: d.id,
            donor_id: d.donor_id,
            request_id: d.request_id,
            donation_date: d.donation_date,
            patient_name: d.patient_name,
        }
    }
}

impl From<Option<CooldownRemaining>> for CooldownDto {
    fn from(left: Option<CooldownRemaining>) -> Self {
        Self {
            in_cooldown: left.is_some(),
            remaining: left.map(|l| l.to_string()),
            remaining_seconds: left.map(|l| l.total_seconds()),
        }
    }
}

impl From<DispatchReport> for NotifyDto {
    fn from(report: DispatchReport) -> Self {
        Self {
            attempted: report.attempted(),
            delivered: report.delivered,
            failed: report.failed,
        }
    }
}
