// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! KSeF interactive-session protocol client.
//!
//! One [`KsefSessionClient`] instance drives one tenant's workflow:
//! authentication handshake (or a stored token pair), session open with
//! envelope key exchange, encrypted invoice submission, status queries and
//! best-effort close. See the crate root for the overall flow.

pub mod auth;
pub mod client;
pub mod error;
pub mod keys;
pub mod session;
pub mod state;
pub mod types;

pub use client::{KsefSessionClient, NoopTokenSink, TokenSink};
pub use error::KsefApiError;
pub use state::{Credential, PersistedSession, SessionState};
pub use types::{
    AuthChallengeResponse, AuthInitResponse, AuthStatusResponse, InvoicePayload,
    InvoiceStatusResponse, PublicKeyPair, SendInvoiceResponse, StatusInfo, STATUS_IN_PROGRESS,
    STATUS_SUCCESS,
};
