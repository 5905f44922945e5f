#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use blood_donation::contract::model::{
    BloodGroup, NewBloodRequest, NewUser, Sex, Urgency, User, UserRole,
};
use blood_donation::domain::error::DomainError;
use blood_donation::domain::ports::{NotificationContext, Notifier};
use blood_donation::domain::repo::{Snapshot, Store};
use blood_donation::infra::session::MemorySessionStore;
use blood_donation::infra::storage::InMemoryStore;
use blood_donation::{Adapters, BloodDonation, BloodDonationConfig};

pub const PASSWORD: &str = "password123";
pub const SIGNING_SECRET: &[u8] = b"harness-signing-secret-0123";

/// Remembers every `(volunteer, request)` pair it was asked to notify.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Uuid, Uuid)>>,
    pub failing: Mutex<HashSet<Uuid>>,
}

impl RecordingNotifier {
    pub fn recipients(&self) -> Vec<Uuid> {
        self.sent.lock().iter().map(|(user, _)| *user).collect()
    }

    pub fn fail_for(&self, user_id: Uuid) {
        self.failing.lock().insert(user_id);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user: &User, ctx: &NotificationContext) -> Result<(), DomainError> {
        if self.failing.lock().contains(&user.id) {
            return Err(DomainError::notification("mailbox unavailable"));
        }
        self.sent.lock().push((user.id, ctx.request_id));
        Ok(())
    }
}

/// In-memory store whose saves can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    pub fail_saves: AtomicBool,
}

impl FlakyStore {
    pub fn break_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn load(&self) -> anyhow::Result<Snapshot> {
        self.inner.load().await
    }

    async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.save(snapshot).await
    }
}

pub struct Harness {
    pub module: BloodDonation,
    pub store: Arc<FlakyStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    harness_with(BloodDonationConfig::default())
}

pub fn harness_with(cfg: BloodDonationConfig) -> Harness {
    let store = Arc::new(FlakyStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let module = BloodDonation::new(
        &cfg,
        Adapters {
            store: store.clone(),
            notifier: notifier.clone(),
            sessions: Arc::new(MemorySessionStore::new()),
            session_secret: SIGNING_SECRET.to_vec(),
        },
    )
    .unwrap();
    Harness {
        module,
        store,
        notifier,
    }
}

pub fn new_user(name: &str, role: UserRole, group: BloodGroup, locality: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        phone: "9876543210".to_string(),
        blood_group: group,
        sex: Sex::Female,
        locality: locality.to_string(),
        role,
        password: PASSWORD.to_string(),
    }
}

pub fn new_request(group: BloodGroup, locality: &str) -> NewBloodRequest {
    NewBloodRequest {
        patient_name: "Ravi Kumar".to_string(),
        blood_group: group,
        units: 2,
        hospital: "District Hospital".to_string(),
        locality: locality.to_string(),
        urgency: Urgency::High,
    }
}

impl Harness {
    pub async fn register(
        &self,
        name: &str,
        role: UserRole,
        group: BloodGroup,
        locality: &str,
    ) -> User {
        self.module
            .api()
            .register(new_user(name, role, group, locality))
            .await
            .unwrap()
            .user
    }
}
