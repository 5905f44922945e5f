use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::contract::model::{BloodRequest, Donation, User};
use crate::domain::credentials::PasswordHash;
use crate::domain::error::DomainError;

/// Storage-level user: the public profile plus what only the core may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub credential: PasswordHash,
    /// Start of the running cooldown; cleared once the window is over.
    pub last_donation_at: Option<DateTime<Utc>>,
}

/// Everything the store persists, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: Vec<UserRecord>,
    pub requests: Vec<BloodRequest>,
    pub donations: Vec<Donation>,
}

impl Snapshot {
    pub fn user(&self, id: Uuid) -> Option<&UserRecord> {
        self.users.iter().find(|r| r.user.id == id)
    }

    pub fn user_mut(&mut self, id: Uuid) -> Option<&mut UserRecord> {
        self.users.iter_mut().find(|r| r.user.id == id)
    }

    /// Case-insensitive lookup; emails are unique under this comparison.
    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        let wanted = email.trim().to_lowercase();
        self.users
            .iter()
            .find(|r| r.user.email.to_lowercase() == wanted)
    }

    /// True when another user (not `except`) already holds `email`.
    pub fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.user_by_email(email)
            .is_some_and(|r| Some(r.user.id) != except)
    }

    pub fn request(&self, id: Uuid) -> Option<&BloodRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    pub fn request_mut(&mut self, id: Uuid) -> Option<&mut BloodRequest> {
        self.requests.iter_mut().find(|r| r.id == id)
    }

    pub fn donations_by(&self, donor_id: Uuid) -> impl Iterator<Item = &Donation> {
        self.donations.iter().filter(move |d| d.donor_id == donor_id)
    }

    pub fn latest_donation_at(&self, donor_id: Uuid) -> Option<DateTime<Utc>> {
        self.donations_by(donor_id).map(|d| d.donation_date).max()
    }
}

/// Port for the domain layer: durable load/save of the whole data set.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read everything. A store with no data yet returns an empty snapshot.
    async fn load(&self) -> anyhow::Result<Snapshot>;
    /// Replace everything with `snapshot` in one write.
    async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

/// Serializes writers over one [`Store`].
///
/// Every mutation loads a fresh snapshot, applies the change to that copy
/// and saves it only when the change succeeded, all under one async lock.
pub struct SharedStore {
    store: Arc<dyn Store>,
    write_lock: Mutex<()>,
}

impl SharedStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> Result<Snapshot, DomainError> {
        self.store
            .load()
            .await
            .map_err(|e| DomainError::storage(format!("{e:#}")))
    }

    /// Run `change` against the current state and persist the result.
    /// Nothing is written when `change` fails.
    pub async fn update<T, F>(&self, change: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, DomainError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.snapshot().await?;
        let out = change(&mut snapshot)?;
        self.store
            .save(&snapshot)
            .await
            .map_err(|e| DomainError::storage(format!("{e:#}")))?;
        Ok(out)
    }
}
