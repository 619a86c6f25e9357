// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

/// Errors from the session-key, invoice and envelope crypto paths.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("Invalid public key: {0}")]
    InvalidKey(String),

    #[error("RSA-OAEP key wrap failed: {0}")]
    EnvelopeEncryption(String),

    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Invoice decryption failed: {0}")]
    InvoiceDecryption(String),
}
