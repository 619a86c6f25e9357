//! Per-session symmetric key material.
//!
//! Each interactive KSeF session gets a fresh AES-256 key and a 16-byte IV.
//! The pair lives for the whole session: the key is wrapped with the service's
//! RSA public key when the session opens, and the same key/IV encrypt every
//! invoice submitted within that session. Key bytes are zeroed when the
//! value is dropped and never appear in Debug output or logs.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::error::CryptoError;

pub const SYMMETRIC_KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;

/// AES-256 key + CBC IV for one KSeF session.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    key: [u8; SYMMETRIC_KEY_LEN],
    iv: [u8; IV_LEN],
}

impl SessionKeys {
    /// Generate a fresh key/IV pair from the OS random source.
    pub fn generate() -> Self {
        let mut key = [0u8; SYMMETRIC_KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    pub fn from_raw(key: [u8; SYMMETRIC_KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Rebuild the pair from the base64 form the calling layer persists.
    pub fn from_base64(key_b64: &str, iv_b64: &str) -> Result<Self, CryptoError> {
        let key_bytes = BASE64
            .decode(key_b64)
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("symmetric key: {}", e)))?;
        let iv_bytes = BASE64
            .decode(iv_b64)
            .map_err(|e| CryptoError::InvalidKeyMaterial(format!("iv: {}", e)))?;

        let key: [u8; SYMMETRIC_KEY_LEN] = key_bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidKeyMaterial(format!(
                "symmetric key must be {} bytes, got {}",
                SYMMETRIC_KEY_LEN,
                v.len()
            ))
        })?;
        let iv: [u8; IV_LEN] = iv_bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidKeyMaterial(format!(
                "iv must be {} bytes, got {}",
                IV_LEN,
                v.len()
            ))
        })?;

        Ok(Self { key, iv })
    }

    pub fn key(&self) -> &[u8; SYMMETRIC_KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Base64 form of the key for external persistence.
    pub fn key_base64(&self) -> String {
        BASE64.encode(self.key)
    }

    /// Base64 form of the IV for external persistence.
    pub fn iv_base64(&self) -> String {
        BASE64.encode(self.iv)
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}
