// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire types for the KSeF v2 REST API.
//!
//! The service speaks camelCase JSON everywhere except the KSeF-token
//! authentication start, which uses PascalCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote status code meaning "in progress".
pub const STATUS_IN_PROGRESS: i64 = 100;

/// Remote status code meaning "success".
pub const STATUS_SUCCESS: i64 = 200;

/// `{code, description}` status block used by session, invoice and
/// authentication resources alike.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub code: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl StatusInfo {
    /// Whether a session with this status can still accept invoices.
    ///
    /// Code 100 ("in progress") is treated the same as 200 here, matching
    /// the service's observed behavior for freshly opened sessions.
    pub fn is_active(&self) -> bool {
        matches!(self.code, STATUS_IN_PROGRESS | STATUS_SUCCESS)
    }
}

/// One entry of `GET /security/public-key-certificates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCertificate {
    /// Declared usages, e.g. `["SymmetricKeyEncryption"]`.
    #[serde(default)]
    pub usage: Vec<String>,
    /// Base64-encoded DER certificate.
    pub certificate: String,
}

/// The two PEM public keys the client needs, extracted from the certificate
/// list. Fetched fresh on every session open.
#[derive(Debug, Clone)]
pub struct PublicKeyPair {
    /// Wraps the session's AES key (usage `SymmetricKeyEncryption`).
    pub symmetric_key_encryption_pem: String,
    /// Wraps a one-time KSeF token (usage `KsefTokenEncryption`).
    pub token_encryption_pem: String,
}

/// Invoice form declaration sent when opening a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormCode {
    pub system_code: String,
    pub schema_version: String,
    pub value: String,
}

impl FormCode {
    /// The FA(3) structured-invoice schema this client submits.
    pub fn fa3() -> Self {
        Self {
            system_code: "FA (3)".to_string(),
            schema_version: "1-0E".to_string(),
            value: "FA".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEncryptionInfo {
    /// RSA-OAEP-wrapped AES key, base64.
    pub encrypted_symmetric_key: String,
    /// Session IV, base64.
    pub initialization_vector: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    pub form_code: FormCode,
    pub encryption: SessionEncryptionInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionResponse {
    #[serde(default)]
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub status: StatusInfo,
}

/// Upload payload for one invoice. All hashes are base64 SHA-256 digests;
/// sizes are byte lengths of the exact buffers hashed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub invoice_hash: String,
    pub invoice_size: u64,
    pub encrypted_invoice_hash: String,
    pub encrypted_invoice_size: u64,
    pub encrypted_invoice_content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceResponse {
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatusResponse {
    #[serde(default)]
    pub status: Option<StatusInfo>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `POST /auth/challenge` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallengeResponse {
    pub challenge: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValue {
    pub token: String,
}

/// Response to starting authentication (XAdES signature or KSeF token):
/// a temporary bearer token plus the reference to poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInitResponse {
    pub authentication_token: TokenValue,
    pub reference_number: String,
}

/// `GET /auth/{referenceNumber}` response while polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub status: StatusInfo,
    #[serde(default)]
    pub access_token: Option<TokenValue>,
    #[serde(default)]
    pub refresh_token: Option<TokenValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemTokenResponse {
    #[serde(default)]
    pub access_token: Option<TokenValue>,
    #[serde(default)]
    pub refresh_token: Option<TokenValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    #[serde(default)]
    pub access_token: Option<TokenValue>,
}

/// `POST /auth/ksef-token` body. This endpoint alone uses PascalCase names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KsefTokenAuthRequest {
    pub challenge: String,
    pub context_identifier: ContextIdentifier,
    pub encrypted_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContextIdentifier {
    pub r#type: String,
    pub value: String,
}

impl ContextIdentifier {
    /// Identify the authenticating context by Polish tax number.
    pub fn nip(value: impl Into<String>) -> Self {
        Self {
            r#type: "Nip".to_string(),
            value: value.into(),
        }
    }
}
