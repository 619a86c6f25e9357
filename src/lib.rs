// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client for KSeF (Krajowy System e-Faktur), the Polish national
//! e-invoicing service.
//!
//! The client covers the interactive-session protocol: RSA-OAEP session-key
//! exchange, AES-256-CBC invoice encryption with SHA-256 integrity values,
//! bearer authentication with a single silent token refresh on expiry, and
//! the bounded polling loop of the authentication handshake.
//!
//! ## Typical flow
//!
//! ```no_run
//! use ksef_client::{Credential, KsefApiConfig, KsefMode, KsefSessionClient, SessionState};
//!
//! # async fn run() -> Result<(), ksef_client::KsefApiError> {
//! let config = KsefApiConfig::for_mode(KsefMode::Test);
//! let credential = Credential::new("access-token", "refresh-token");
//! let mut client = KsefSessionClient::new(config, credential, SessionState::empty())?;
//!
//! client.open_session().await?;
//! let receipt = client.send_invoice(b"<Faktura>...</Faktura>").await?;
//! println!("submitted: {:?}", receipt.reference_number);
//! client.close_session().await;
//!
//! // Persist client.session_state() / client.credential() on the tenant record.
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod ksef;

pub use config::{KsefApiConfig, KsefMode};
pub use crypto::{CryptoError, EncryptedInvoice, SessionKeys};
pub use ksef::{
    Credential, KsefApiError, KsefSessionClient, PersistedSession, SessionState, TokenSink,
};
