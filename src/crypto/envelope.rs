// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Asymmetric envelope for session secrets.
//!
//! KSeF publishes DER certificates; the session key (and, for token
//! authentication, the one-time KSeF token) is wrapped with the RSA public
//! key extracted from the matching certificate using RSA-OAEP with SHA-256
//! and no label.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use crate::crypto::error::CryptoError;

/// Extract the public key from a DER certificate, re-encoded as SPKI PEM.
pub fn public_key_pem_from_certificate(der: &[u8]) -> Result<String, CryptoError> {
    let certificate = Certificate::from_der(der)
        .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
    let spki_der = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
    let public_key = RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))
}

/// Wrap a secret with RSA-OAEP(SHA-256) under an SPKI PEM public key.
pub fn wrap_with_rsa_oaep(public_key_pem: &str, secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), secret)
        .map_err(|e| CryptoError::EnvelopeEncryption(e.to_string()))
}
