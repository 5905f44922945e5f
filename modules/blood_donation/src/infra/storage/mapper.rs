use anyhow::{Context, Result};

use crate::contract::model::{BloodRequest, Donation, User};
use crate::domain::credentials::PasswordHash;
use crate::domain::repo::{Snapshot, UserRecord};
use crate::infra::storage::entity::{
    DonationRow, RequestRow, StoreDocument, UserRow, DOCUMENT_VERSION,
};

/// Convert a stored document into the domain snapshot. Any unknown enum
/// value or malformed credential fails the whole load.
pub fn document_to_snapshot(doc: StoreDocument) -> Result<Snapshot> {
    if doc.version != DOCUMENT_VERSION {
        anyhow::bail!("unsupported store document version {}", doc.version);
    }

    let users = doc
        .users
        .into_iter()
        .map(row_to_user)
        .collect::<Result<Vec<_>>>()?;
    let requests = doc
        .requests
        .into_iter()
        .map(row_to_request)
        .collect::<Result<Vec<_>>>()?;
    let donations = doc.donations.into_iter().map(row_to_donation).collect();

    Ok(Snapshot {
        users,
        requests,
        donations,
    })
}

pub fn snapshot_to_document(snapshot: &Snapshot) -> StoreDocument {
    StoreDocument {
        version: DOCUMENT_VERSION,
        users: snapshot.users.iter().map(user_to_row).collect(),
        requests: snapshot.requests.iter().map(request_to_row).collect(),
        donations: snapshot.donations.iter().map(donation_to_row).collect(),
    }
}

fn row_to_user(row: UserRow) -> Result<UserRecord> {
    let ctx = |what: &str| format!("user {}: bad {what}", row.id);
    Ok(UserRecord {
        user: User {
            id: row.id,
            blood_group: row.blood_group.parse().with_context(|| ctx("blood group"))?,
            sex: row.sex.parse().with_context(|| ctx("sex"))?,
            role: row.role.parse().with_context(|| ctx("role"))?,
            name: row.name,
            email: row.email,
            phone: row.phone,
            locality: row.locality,
            donations: row.donations,
        },
        credential: row
            .password_hash
            .parse::<PasswordHash>()
            .with_context(|| format!("user {}: bad credential", row.id))?,
        last_donation_at: row.last_donation_at,
    })
}

fn user_to_row(record: &UserRecord) -> UserRow {
    let user = &record.user;
    UserRow {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        blood_group: user.blood_group.to_string(),
        sex: user.sex.to_string(),
        locality: user.locality.clone(),
        role: user.role.to_string(),
        donations: user.donations,
        password_hash: record.credential.as_str().to_string(),
        last_donation_at: record.last_donation_at,
    }
}

fn row_to_request(row: RequestRow) -> Result<BloodRequest> {
    let ctx = |what: &str| format!("request {}: bad {what}", row.id);
    Ok(BloodRequest {
        id: row.id,
        requestor_id: row.requestor_id,
        blood_group: row.blood_group.parse().with_context(|| ctx("blood group"))?,
        urgency: row.urgency.parse().with_context(|| ctx("urgency"))?,
        status: row.status.parse().with_context(|| ctx("status"))?,
        patient_name: row.patient_name,
        units: row.units,
        hospital: row.hospital,
        locality: row.locality,
        created_at: row.created_at,
    })
}

fn request_to_row(r: &BloodRequest) -> RequestRow {
    RequestRow {
        id: r.id,
        requestor_id: r.requestor_id,
        patient_name: r.patient_name.clone(),
        blood_group: r.blood_group.to_string(),
        units: r.units,
        hospital: r.hospital.clone(),
        locality: r.locality.clone(),
        urgency: r.urgency.to_string(),
        status: r.status.to_string(),
        created_at: r.created_at,
    }
}

fn row_to_donation(row: DonationRow) -> Donation {
    Donation {
        id: row.id,
        donor_id: row.donor_id,
        request_id: row.request_id,
        donation_date: row.donation_date,
        patient_name: row.patient_name,
    }
}

fn donation_to_row(d: &Donation) -> DonationRow {
    DonationRow {
        id: d.id,
        donor_id: d.donor_id,
        request_id: d.request_id,
        donation_date: d.donation_date,
        patient_name: d.patient_name.clone(),
    }
}
