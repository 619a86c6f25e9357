//! Session and credential state owned by the calling tenant.
//!
//! The client never caches anything globally: the caller constructs it with
//! the state persisted on its tenant/company record and reads the (possibly
//! mutated) state back after the batch to persist it transactionally.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{CryptoError, SessionKeys};

/// Access/refresh token pair for the KSeF API.
///
/// The access token is short-lived and attached to every authenticated
/// request; the refresh token mints a new access token on a 401.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// One tenant's interactive-session state: the reference number assigned by
/// the service and the key/IV generated for it. `None` means no open session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    reference_number: Option<String>,
    keys: Option<SessionKeys>,
}

impl SessionState {
    /// State for a tenant with no open session.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(reference_number: Option<String>, keys: Option<SessionKeys>) -> Self {
        Self {
            reference_number,
            keys,
        }
    }

    /// Rebuild from the base64 fields stored on the tenant record.
    pub fn from_persisted(persisted: &PersistedSession) -> Result<Self, CryptoError> {
        let keys = match (&persisted.symmetric_key, &persisted.iv) {
            (Some(key), Some(iv)) => Some(SessionKeys::from_base64(key, iv)?),
            _ => None,
        };
        Ok(Self {
            reference_number: persisted.reference_number.clone(),
            keys,
        })
    }

    /// The base64 form to write back to the tenant record.
    pub fn to_persisted(&self) -> PersistedSession {
        PersistedSession {
            reference_number: self.reference_number.clone(),
            symmetric_key: self.keys.as_ref().map(SessionKeys::key_base64),
            iv: self.keys.as_ref().map(SessionKeys::iv_base64),
        }
    }

    pub fn reference_number(&self) -> Option<&str> {
        self.reference_number.as_deref()
    }

    pub fn keys(&self) -> Option<&SessionKeys> {
        self.keys.as_ref()
    }

    pub(crate) fn replace(&mut self, reference_number: String, keys: SessionKeys) {
        self.reference_number = Some(reference_number);
        self.keys = Some(keys);
    }
}

/// Serializable session state, as stored by the calling layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    pub reference_number: Option<String>,
    /// Base64 AES-256 key.
    pub symmetric_key: Option<String>,
    /// Base64 16-byte IV.
    pub iv: Option<String>,
}
