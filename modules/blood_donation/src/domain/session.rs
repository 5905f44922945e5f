use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{AuthSession, NewUser, SessionToken, User};
use crate::domain::credentials::{PasswordHash, TokenSigner};
use crate::domain::error::DomainError;
use crate::domain::events::DonationDomainEvent;
use crate::domain::ports::{EventPublisher, SessionStore};
use crate::domain::repo::{SharedStore, UserRecord};
use crate::domain::validation::{require_non_blank, validate_email, validate_password};

/// Authentication and the current-session token.
///
/// This is the only component that reads or writes credentials. Every
/// [`User`] it hands out comes from [`UserRecord::user`], which has no
/// credential field.
#[derive(Clone)]
pub struct SessionGateway {
    store: Arc<SharedStore>,
    sessions: Arc<dyn SessionStore>,
    signer: TokenSigner,
    events: Arc<dyn EventPublisher<DonationDomainEvent>>,
    min_password_length: usize,
}

impl SessionGateway {
    pub fn new(
        store: Arc<SharedStore>,
        sessions: Arc<dyn SessionStore>,
        signer: TokenSigner,
        events: Arc<dyn EventPublisher<DonationDomainEvent>>,
        min_password_length: usize,
    ) -> Self {
        Self {
            store,
            sessions,
            signer,
            events,
            min_password_length,
        }
    }

    #[instrument(
        name = "blood_donation.session.register",
        skip(self, new_user),
        fields(email = %new_user.email, role = %new_user.role)
    )]
    pub async fn register(&self, new_user: NewUser) -> Result<AuthSession, DomainError> {
        info!("Registering new user");
        self.validate_new_user(&new_user)?;

        let credential = hash_password(new_user.password.clone()).await?;
        let email = new_user.email.trim().to_string();

        let user = self
            .store
            .update(|snapshot| {
                if snapshot.email_taken(&email, None) {
                    return Err(DomainError::email_already_exists(email.clone()));
                }
                let user = User {
                    id: Uuid::new_v4(),
                    name: new_user.name.trim().to_string(),
                    email: email.clone(),
                    phone: new_user.phone.trim().to_string(),
                    blood_group: new_user.blood_group,
                    sex: new_user.sex,
                    locality: new_user.locality.trim().to_string(),
                    role: new_user.role,
                    donations: 0,
                };
                snapshot.users.push(UserRecord {
                    user: user.clone(),
                    credential,
                    last_donation_at: None,
                });
                Ok(user)
            })
            .await?;

        self.events.publish(&DonationDomainEvent::UserRegistered {
            id: user.id,
            at: Utc::now(),
        });

        let token = self.open_session(user.id).await?;
        info!(user_id = %user.id, "User registered");
        Ok(AuthSession { user, token })
    }

    #[instrument(name = "blood_donation.session.login", skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, DomainError> {
        debug!("Authenticating");
        let snapshot = self.store.snapshot().await?;

        let record = snapshot
            .user_by_email(email)
            .ok_or_else(DomainError::invalid_credentials)?;
        if !verify_password(record.credential.clone(), password.to_string()).await? {
            return Err(DomainError::invalid_credentials());
        }

        let user = record.user.clone();
        let token = self.open_session(user.id).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(AuthSession { user, token })
    }

    #[instrument(name = "blood_donation.session.logout", skip(self))]
    pub async fn logout(&self) -> Result<(), DomainError> {
        self.sessions
            .clear()
            .await
            .map_err(|e| DomainError::storage(format!("{e:#}")))?;
        info!("Session cleared");
        Ok(())
    }

    /// User behind the stored token; any unusable token reads as "no session".
    #[instrument(name = "blood_donation.session.current_user", skip(self))]
    pub async fn current_user(&self) -> Result<Option<User>, DomainError> {
        let token = self
            .sessions
            .load()
            .await
            .map_err(|e| DomainError::storage(format!("{e:#}")))?;
        match token {
            Some(raw) => self.resolve(&raw).await,
            None => {
                debug!("No stored session");
                Ok(None)
            }
        }
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<User>, DomainError> {
        let Some(user_id) = self.signer.verify(token) else {
            debug!("Session token rejected");
            return Ok(None);
        };
        let snapshot = self.store.snapshot().await?;
        let user = snapshot.user(user_id).map(|r| r.user.clone());
        if user.is_none() {
            debug!(%user_id, "Session token points at a missing user");
        }
        Ok(user)
    }

    #[instrument(
        name = "blood_donation.session.change_password",
        skip(self, current, new_password),
        fields(user_id = %user_id)
    )]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        validate_password(new_password, self.min_password_length)?;

        let existing = self
            .store
            .snapshot()
            .await?
            .user(user_id)
            .map(|r| r.credential.clone())
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        if !verify_password(existing.clone(), current.to_string()).await? {
            return Err(DomainError::invalid_credentials());
        }
        let replacement = hash_password(new_password.to_string()).await?;

        self.store
            .update(|snapshot| {
                let record = snapshot
                    .user_mut(user_id)
                    .ok_or_else(|| DomainError::user_not_found(user_id))?;
                // A concurrent change won; the current password was checked against a stale hash.
                if record.credential != existing {
                    return Err(DomainError::invalid_credentials());
                }
                record.credential = replacement;
                Ok(())
            })
            .await?;

        info!("Password changed");
        Ok(())
    }

    async fn open_session(&self, user_id: Uuid) -> Result<SessionToken, DomainError> {
        let token = self.signer.issue(user_id);
        self.sessions
            .save(token.as_str())
            .await
            .map_err(|e| DomainError::storage(format!("{e:#}")))?;
        Ok(token)
    }

    fn validate_new_user(&self, new_user: &NewUser) -> Result<(), DomainError> {
        require_non_blank("name", &new_user.name)?;
        validate_email(&new_user.email)?;
        require_non_blank("phone", &new_user.phone)?;
        require_non_blank("locality", &new_user.locality)?;
        validate_password(&new_user.password, self.min_password_length)
    }
}

// Argon2 is deliberately slow; keep it off the async workers.
async fn hash_password(password: String) -> Result<PasswordHash, DomainError> {
    tokio::task::spawn_blocking(move || PasswordHash::derive(&password))
        .await
        .map_err(|e| DomainError::credential(e.to_string()))?
}

async fn verify_password(hash: PasswordHash, password: String) -> Result<bool, DomainError> {
    tokio::task::spawn_blocking(move || hash.verify(&password))
        .await
        .map_err(|e| DomainError::credential(e.to_string()))
}
