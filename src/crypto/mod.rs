// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptographic primitives for the KSeF interactive-session protocol:
//!
//! - **Session keys**: per-session AES-256 key + CBC IV, generated locally
//! - **Invoice**: PKCS7 + AES-256-CBC payload encryption with SHA-256 integrity values
//! - **Envelope**: RSA-OAEP(SHA-256) wrapping of session secrets under the
//!   service's certificate keys

pub mod envelope;
pub mod error;
pub mod invoice;
pub mod session_keys;

pub use envelope::{public_key_pem_from_certificate, wrap_with_rsa_oaep};
pub use error::CryptoError;
pub use invoice::{decrypt_invoice, encrypt_invoice, EncryptedInvoice};
pub use session_keys::SessionKeys;
