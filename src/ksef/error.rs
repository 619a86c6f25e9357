// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors surfaced by [`crate::ksef::KsefSessionClient`] operations.
///
/// Every remote failure carries the diagnostic text returned by the service.
/// Nothing is retried beyond the single 401 refresh cycle inside the request
/// executor; batch-level retry belongs to the calling orchestrator.
#[derive(Debug, Error)]
pub enum KsefApiError {
    /// Non-2xx response after the bounded refresh retry.
    #[error("KSeF API error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// Transport-level failure (connect, DNS, timeout, body read).
    #[error("KSeF API request failed: {0}")]
    Network(String),

    /// A well-formed response is missing required keys or tokens. Never
    /// transient, never retried.
    #[error("KSeF configuration error: {0}")]
    Configuration(String),

    /// Key exchange or session-open POST failed.
    #[error("Failed to open KSeF session: {0}")]
    SessionOpen(String),

    /// Authentication rejected with a terminal remote status.
    #[error("KSeF authentication failed with status {code}: {description}")]
    Authentication { code: i64, description: String },

    /// The bounded status poll exhausted its attempts while the remote side
    /// still reported "in progress".
    #[error("KSeF authentication timed out; try again in a moment")]
    AuthenticationTimeout,

    /// An operation that requires an open session was called without one.
    #[error("No active KSeF session found; open a session first")]
    NoActiveSession,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl KsefApiError {
    /// Normalize a non-2xx response into [`KsefApiError::RemoteApi`],
    /// consuming the body for diagnostics.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        KsefApiError::RemoteApi { status, body }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        KsefApiError::Network(err.to_string())
    }

    /// Decode failure on a 2xx body: the contract said JSON of a known shape.
    pub(crate) fn from_decode(err: reqwest::Error) -> Self {
        KsefApiError::Configuration(format!("unexpected KSeF response: {}", err))
    }
}
