mod common;

use blood_donation::contract::error::BloodDonationError;
use blood_donation::contract::model::{BloodGroup, UserRole};
use blood_donation::domain::credentials::TokenSigner;
use blood_donation::domain::ports::SessionStore;
use blood_donation::domain::repo::Store;
use blood_donation::infra::session::FileSessionStore;
use blood_donation::infra::storage::JsonFileStore;
use blood_donation::{Adapters, BloodDonation, BloodDonationConfig};
use common::{harness, new_user, PASSWORD, SIGNING_SECRET};
use tempfile::tempdir;
use uuid::Uuid;

#[tokio::test]
async fn login_checks_password() {
    let h = harness();
    let api = h.module.api();
    let registered = h
        .register("Priya", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;

    let err = api.login("priya@example.com", "wrong-pass").await.unwrap_err();
    assert_eq!(err, BloodDonationError::InvalidCredentials);
    assert_eq!(err.to_string(), "Invalid email or password");

    let err = api.login("nobody@example.com", PASSWORD).await.unwrap_err();
    assert_eq!(err, BloodDonationError::InvalidCredentials);

    let session = api.login("  PRIYA@example.com ", PASSWORD).await.unwrap();
    assert_eq!(session.user, registered);
}

#[tokio::test]
async fn duplicate_email_leaves_user_count_unchanged() {
    let h = harness();
    let api = h.module.api();
    h.register("Sam", UserRole::Volunteer, BloodGroup::APositive, "Adoor")
        .await;
    let before = h.store.load().await.unwrap().users.len();

    let mut again = new_user("Sam", UserRole::Requestor, BloodGroup::BPositive, "Adoor");
    again.email = "SAM@example.com".into();
    let err = api.register(again).await.unwrap_err();

    assert_eq!(
        err,
        BloodDonationError::DuplicateEmail {
            email: "SAM@example.com".into()
        }
    );
    assert_eq!(err.to_string(), "User with email 'SAM@example.com' already exists");
    assert_eq!(h.store.load().await.unwrap().users.len(), before);
}

#[tokio::test]
async fn registration_validates_input() {
    let h = harness();
    let api = h.module.api();

    let mut short = new_user("Tom", UserRole::Volunteer, BloodGroup::OPositive, "Adoor");
    short.password = "12345".into();
    let mut bad_email = new_user("Tim", UserRole::Volunteer, BloodGroup::OPositive, "Adoor");
    bad_email.email = "tim-at-example".into();
    let mut no_locality = new_user("Ted", UserRole::Volunteer, BloodGroup::OPositive, "Adoor");
    no_locality.locality = " ".into();

    for bad in [short, bad_email, no_locality] {
        let err = api.register(bad).await.unwrap_err();
        assert!(matches!(err, BloodDonationError::Validation { .. }), "{err}");
    }
    assert!(h.store.load().await.unwrap().users.is_empty());
}

#[tokio::test]
async fn stored_credential_is_not_the_password() {
    let h = harness();
    let user = h
        .register("Gita", UserRole::Volunteer, BloodGroup::OPositive, "Adoor")
        .await;
    let snapshot = h.store.load().await.unwrap();
    let record = snapshot.user(user.id).unwrap();
    assert!(!record.credential.as_str().contains(PASSWORD));
    assert!(record.credential.verify(PASSWORD));
}

#[tokio::test]
async fn current_user_follows_login_and_logout() {
    let h = harness();
    let api = h.module.api();
    assert_eq!(api.current_user().await.unwrap(), None);

    let user = h
        .register("Hari", UserRole::Both, BloodGroup::ANegative, "Adoor")
        .await;
    assert_eq!(api.current_user().await.unwrap(), Some(user.clone()));

    api.logout().await.unwrap();
    assert_eq!(api.current_user().await.unwrap(), None);
    // logging out twice is fine
    api.logout().await.unwrap();

    api.login("hari@example.com", PASSWORD).await.unwrap();
    assert_eq!(api.current_user().await.unwrap().map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn change_password_requires_current_one() {
    let h = harness();
    let api = h.module.api();
    let user = h
        .register("Jaya", UserRole::Volunteer, BloodGroup::BPositive, "Adoor")
        .await;

    let err = api
        .change_password(user.id, "not-it", "newpass1")
        .await
        .unwrap_err();
    assert_eq!(err, BloodDonationError::InvalidCredentials);

    let err = api
        .change_password(user.id, PASSWORD, "short")
        .await
        .unwrap_err();
    assert!(matches!(err, BloodDonationError::Validation { .. }));

    api.change_password(user.id, PASSWORD, "newpass1")
        .await
        .unwrap();
    assert!(api.login("jaya@example.com", PASSWORD).await.is_err());
    assert!(api.login("jaya@example.com", "newpass1").await.is_ok());
}

#[tokio::test]
async fn forged_or_dangling_tokens_resolve_to_nobody() {
    let h = harness();
    let sessions = h.module.sessions();
    let session = h
        .module
        .api()
        .register(new_user("Kiran", UserRole::Volunteer, BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();

    assert_eq!(
        sessions.resolve(session.token.as_str()).await.unwrap(),
        Some(session.user.clone())
    );
    assert_eq!(sessions.resolve("garbage").await.unwrap(), None);

    let signer = TokenSigner::new(SIGNING_SECRET).unwrap();
    let dangling = signer.issue(Uuid::new_v4());
    assert_eq!(sessions.resolve(dangling.as_str()).await.unwrap(), None);

    let other = harness();
    let foreign = other
        .module
        .api()
        .register(new_user("Kiran", UserRole::Volunteer, BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();
    // Same secret, but the user only exists in the other store.
    assert_eq!(sessions.resolve(foreign.token.as_str()).await.unwrap(), None);
}

#[tokio::test]
async fn session_survives_restart_with_file_adapters() {
    let dir = tempdir().unwrap();
    let cfg = BloodDonationConfig::default();

    let first =
        BloodDonation::new(&cfg, Adapters::from_config(&cfg, dir.path()).unwrap()).unwrap();
    let user = first
        .api()
        .register(new_user("Lalu", UserRole::Volunteer, BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap()
        .user;
    drop(first);
    assert!(dir.path().join(&cfg.session_secret_file).is_file());

    let second =
        BloodDonation::new(&cfg, Adapters::from_config(&cfg, dir.path()).unwrap()).unwrap();
    assert_eq!(second.api().current_user().await.unwrap(), Some(user));

    let rotated = BloodDonationConfig {
        session_secret: Some("rotated-secret-0123456789".into()),
        ..BloodDonationConfig::default()
    };
    let third =
        BloodDonation::new(&rotated, Adapters::from_config(&rotated, dir.path()).unwrap()).unwrap();
    assert_eq!(third.api().current_user().await.unwrap(), None);
}

#[tokio::test]
async fn default_install_does_not_accept_tokens_signed_with_a_known_secret() {
    let dir = tempdir().unwrap();
    let cfg = BloodDonationConfig::default();
    let module =
        BloodDonation::new(&cfg, Adapters::from_config(&cfg, dir.path()).unwrap()).unwrap();
    let victim = module
        .api()
        .register(new_user("Meera", UserRole::Both, BloodGroup::AbNegative, "Adoor"))
        .await
        .unwrap()
        .user;

    for known in ["bloodlink-dev-secret", "", "secret"] {
        let minted = TokenSigner::new(known).unwrap().issue(victim.id);
        assert_eq!(module.sessions().resolve(minted.as_str()).await.unwrap(), None);
    }

    // A token minted with a guessed secret and planted in the session file is ignored too.
    let minted = TokenSigner::new("bloodlink-dev-secret")
        .unwrap()
        .issue(victim.id);
    FileSessionStore::new(dir.path().join(&cfg.session_file))
        .save(minted.as_str())
        .await
        .unwrap();
    assert_eq!(module.api().current_user().await.unwrap(), None);
}

#[tokio::test]
async fn each_home_gets_its_own_signing_secret() {
    let (a, b) = (tempdir().unwrap(), tempdir().unwrap());
    let cfg = BloodDonationConfig::default();
    let first = BloodDonation::new(&cfg, Adapters::from_config(&cfg, a.path()).unwrap()).unwrap();
    let second = BloodDonation::new(&cfg, Adapters::from_config(&cfg, b.path()).unwrap()).unwrap();

    let session = first
        .api()
        .register(new_user("Anu", UserRole::Volunteer, BloodGroup::OPositive, "Adoor"))
        .await
        .unwrap();
    // Same user id planted in the second store: the token still must not carry over.
    let copied = JsonFileStore::new(a.path().join(&cfg.store_path))
        .load()
        .await
        .unwrap();
    JsonFileStore::new(b.path().join(&cfg.store_path))
        .save(&copied)
        .await
        .unwrap();
    assert_eq!(
        second.sessions().resolve(session.token.as_str()).await.unwrap(),
        None
    );
}

#[test]
fn weak_configured_secret_is_refused() {
    let dir = tempdir().unwrap();
    let cfg = BloodDonationConfig {
        session_secret: Some("bloodlink".into()),
        ..BloodDonationConfig::default()
    };
    let err = Adapters::from_config(&cfg, dir.path()).err().unwrap();
    assert!(err.to_string().contains("session_secret"));
    assert!(!dir.path().join(&cfg.session_secret_file).exists());
}
