// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Invoice payload encryption.
//!
//! The wire contract for an interactive-session upload: the invoice XML is
//! PKCS7-padded (128-bit blocks), encrypted with AES-256-CBC under the
//! session key/IV, and the request carries the SHA-256 digest and byte length
//! of both the plaintext and the ciphertext. The service recomputes all four
//! values; a mismatch is rejected remotely, so they must be derived from the
//! exact bytes that were encrypted.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

use crate::crypto::error::CryptoError;
use crate::crypto::session_keys::SessionKeys;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// An encrypted invoice with the integrity values the upload payload needs.
#[derive(Debug, Clone)]
pub struct EncryptedInvoice {
    pub plaintext_sha256: [u8; 32],
    pub plaintext_size: usize,
    pub ciphertext_sha256: [u8; 32],
    pub ciphertext_size: usize,
    pub ciphertext: Vec<u8>,
}

/// Pad and encrypt one invoice under the session key/IV.
///
/// The same key and IV are used for every invoice in a session; only the
/// plaintext differs.
pub fn encrypt_invoice(keys: &SessionKeys, xml: &[u8]) -> EncryptedInvoice {
    let ciphertext = Aes256CbcEnc::new(keys.key().into(), keys.iv().into())
        .encrypt_padded_vec_mut::<Pkcs7>(xml);

    EncryptedInvoice {
        plaintext_sha256: Sha256::digest(xml).into(),
        plaintext_size: xml.len(),
        ciphertext_sha256: Sha256::digest(&ciphertext).into(),
        ciphertext_size: ciphertext.len(),
        ciphertext,
    }
}

/// Decrypt and unpad a ciphertext produced by [`encrypt_invoice`].
pub fn decrypt_invoice(keys: &SessionKeys, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Aes256CbcDec::new(keys.key().into(), keys.iv().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| CryptoError::InvoiceDecryption(e.to_string()))
}
