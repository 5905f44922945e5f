use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};
use url::Url;

use crate::config::BloodDonationConfig;
use crate::contract::client::BloodDonationApi;
use crate::domain::cooldown::CooldownPolicy;
use crate::domain::credentials::TokenSigner;
use crate::domain::notifications::NotificationDispatcher;
use crate::domain::ports::{Notifier, SessionStore};
use crate::domain::repo::{SharedStore, Store};
use crate::domain::service::{Service, ServiceConfig};
use crate::domain::session::SessionGateway;
use crate::gateways::local::BloodDonationLocalClient;
use crate::infra::events::TracingEventPublisher;
use crate::infra::notify::{HttpNotifier, LogNotifier};
use crate::infra::session::{
    load_or_create_secret, random_secret, FileSessionStore, MemorySessionStore,
};
use crate::infra::storage::{InMemoryStore, JsonFileStore};

/// Adapters plugged into the domain ports, plus the key session tokens are signed with.
pub struct Adapters {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub sessions: Arc<dyn SessionStore>,
    pub session_secret: Vec<u8>,
}

impl Adapters {
    /// Everything in process memory; notifications go to the log and the
    /// signing key lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            notifier: Arc::new(LogNotifier),
            sessions: Arc::new(MemorySessionStore::new()),
            session_secret: random_secret(),
        }
    }

    /// File-backed store and session under `home`, HTTP notifications when
    /// configured. Without an explicit `session_secret` the signing key is
    /// generated once and kept in `session_secret_file`.
    pub fn from_config(cfg: &BloodDonationConfig, home: &Path) -> anyhow::Result<Self> {
        cfg.validate()?;
        let store_path = home.join(&cfg.store_path);
        let session_path = home.join(&cfg.session_file);
        debug!(
            store = %store_path.display(),
            session = %session_path.display(),
            "Resolved blood_donation file locations"
        );

        let notifier: Arc<dyn Notifier> = match cfg.notifications_base_url.as_deref() {
            Some(raw) => {
                let base = Url::parse(raw)
                    .with_context(|| format!("invalid notifications_base_url '{raw}'"))?;
                info!(base = %base, "Notifications delivered over HTTP");
                Arc::new(HttpNotifier::new(reqwest::Client::new(), base))
            }
            None => Arc::new(LogNotifier),
        };

        let session_secret = match &cfg.session_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => load_or_create_secret(&home.join(&cfg.session_secret_file))?,
        };

        Ok(Self {
            store: Arc::new(JsonFileStore::new(store_path)),
            notifier,
            sessions: Arc::new(FileSessionStore::new(session_path)),
            session_secret,
        })
    }
}

/// Wired module: domain service, session gateway and the public client.
#[derive(Clone)]
pub struct BloodDonation {
    service: Arc<Service>,
    sessions: Arc<SessionGateway>,
    api: Arc<dyn BloodDonationApi>,
}

impl BloodDonation {
    pub fn new(cfg: &BloodDonationConfig, adapters: Adapters) -> anyhow::Result<Self> {
        info!("Initializing blood_donation module");
        cfg.validate()?;
        debug!(
            "Loaded blood_donation config: cooldown_days={}, max_units_per_request={}, min_password_length={}",
            cfg.cooldown_days, cfg.max_units_per_request, cfg.min_password_length
        );

        let store = Arc::new(SharedStore::new(adapters.store));
        let events = Arc::new(TracingEventPublisher);

        let service_config = ServiceConfig {
            cooldown: CooldownPolicy::from_days(cfg.cooldown_days),
            max_units_per_request: cfg.max_units_per_request,
        };
        let service = Arc::new(Service::new(
            store.clone(),
            NotificationDispatcher::new(adapters.notifier),
            events.clone(),
            service_config,
        ));
        let sessions = Arc::new(SessionGateway::new(
            store,
            adapters.sessions,
            TokenSigner::new(&adapters.session_secret)?,
            events,
            cfg.min_password_length,
        ));

        let api: Arc<dyn BloodDonationApi> = Arc::new(BloodDonationLocalClient::new(
            service.clone(),
            sessions.clone(),
        ));
        info!("BloodDonation API ready");

        Ok(Self {
            service,
            sessions,
            api,
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn sessions(&self) -> Arc<SessionGateway> {
        self.sessions.clone()
    }

    pub fn api(&self) -> Arc<dyn BloodDonationApi> {
        self.api.clone()
    }
}
