//! Credential hashing and session token signing.
//!
//! Passwords are stored as Argon2id PHC strings, never in clear. Session
//! tokens are `<user-id>.<tag-hex>` where the tag is an HMAC-SHA256 over the
//! user id keyed with the session secret, so a token stays valid across
//! restarts and cannot be minted for another user id without the secret.

use std::fmt;
use std::str::FromStr;

use argon2::password_hash::{
    PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use crate::contract::model::SessionToken;
use crate::domain::error::DomainError;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;
const TOKEN_CONTEXT: &[u8] = b"bloodlink-session:";

/// Argon2id password hash in PHC string form.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    phc: String,
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt.
    pub fn derive(password: &str) -> Result<Self, DomainError> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let salt =
            SaltString::encode_b64(&salt).map_err(|e| DomainError::credential(e.to_string()))?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| DomainError::credential(e.to_string()))?
            .to_string();
        Ok(Self { phc })
    }

    pub fn verify(&self, password: &str) -> bool {
        PhcHash::new(&self.phc)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Encoded form for persistence.
    pub fn as_str(&self) -> &str {
        &self.phc
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl FromStr for PasswordHash {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = PhcHash::new(s)
            .map_err(|e| DomainError::validation("credential", e.to_string()))?;
        if parsed.algorithm != argon2::ARGON2ID_IDENT {
            return Err(DomainError::validation(
                "credential",
                format!("unsupported hash algorithm '{}'", parsed.algorithm),
            ));
        }
        if parsed.hash.is_none() {
            return Err(DomainError::validation("credential", "missing hash output"));
        }
        Ok(Self { phc: s.to_string() })
    }
}

/// Issues and checks session tokens bound to a user id.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, DomainError> {
        let mac = HmacSha256::new_from_slice(secret.as_ref())
            .map_err(|e| DomainError::credential(e.to_string()))?;
        Ok(Self { mac })
    }

    fn keyed(&self, user_id: Uuid) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(TOKEN_CONTEXT);
        mac.update(user_id.as_bytes());
        mac
    }

    pub fn issue(&self, user_id: Uuid) -> SessionToken {
        let tag = self.keyed(user_id).finalize().into_bytes();
        SessionToken::new(format!("{}.{}", user_id, hex::encode(tag)))
    }

    /// User id the token was issued for, or `None` for anything malformed or forged.
    pub fn verify(&self, raw: &str) -> Option<Uuid> {
        let (id, tag) = raw.trim().split_once('.')?;
        let user_id = Uuid::parse_str(id).ok()?;
        let tag = hex::decode(tag).ok()?;
        self.keyed(user_id).verify_slice(&tag).ok()?;
        Some(user_id)
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSigner(<secret>)")
    }
}
