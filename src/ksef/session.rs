// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Interactive-session lifecycle: open, submit invoices, query, close.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Method;
use tracing::{debug, warn};

use crate::config::{TIMEOUT_LISTING, TIMEOUT_METADATA, TIMEOUT_UPLOAD};
use crate::crypto::{self, SessionKeys};
use crate::ksef::client::KsefSessionClient;
use crate::ksef::error::KsefApiError;
use crate::ksef::types::{
    FormCode, InvoicePayload, InvoiceStatusResponse, OpenSessionRequest, OpenSessionResponse,
    SendInvoiceResponse, SessionEncryptionInfo, SessionStatusResponse, StatusInfo,
};

impl KsefSessionClient {
    /// Whether the stored session reference still points at a usable session.
    ///
    /// Returns `false` without a network call when no reference is stored.
    /// A session whose open handshake is still "in progress" (code 100)
    /// counts as usable, the same as code 200.
    pub async fn is_session_opened(&mut self) -> Result<bool, KsefApiError> {
        if self.state.reference_number().is_none() {
            return Ok(false);
        }
        let status = self.get_session_status().await?;
        Ok(status.is_active())
    }

    /// Open an interactive session, reusing the current one when still valid.
    ///
    /// A usable stored session short-circuits: the existing reference is
    /// returned and no new key material is generated. Otherwise a fresh
    /// 32-byte AES key and 16-byte IV are generated, the key is wrapped with
    /// the service's symmetric-encryption public key via RSA-OAEP(SHA-256),
    /// and the session is opened with the FA(3) form code. The new reference
    /// number is stored on the client state and returned.
    pub async fn open_session(&mut self) -> Result<String, KsefApiError> {
        if let Some(reference) = self.state.reference_number().map(str::to_owned) {
            let status = self
                .get_session_status()
                .await
                .map_err(|e| KsefApiError::SessionOpen(e.to_string()))?;
            if status.is_active() {
                debug!("Reusing open KSeF session {}", reference);
                return Ok(reference);
            }
        }

        let keys = SessionKeys::generate();
        let public_keys = self.fetch_public_keys().await?;
        let wrapped_key =
            crypto::wrap_with_rsa_oaep(&public_keys.symmetric_key_encryption_pem, keys.key())?;

        let request = OpenSessionRequest {
            form_code: FormCode::fa3(),
            encryption: SessionEncryptionInfo {
                encrypted_symmetric_key: BASE64.encode(wrapped_key),
                initialization_vector: BASE64.encode(keys.iv()),
            },
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| KsefApiError::SessionOpen(e.to_string()))?;

        let url = self.url("/sessions/online");
        let response = self
            .request_authenticated(Method::POST, &url, Some(&body), &[], TIMEOUT_METADATA)
            .await
            .map_err(|e| match e {
                KsefApiError::Configuration(_) => e,
                other => KsefApiError::SessionOpen(other.to_string()),
            })?;
        let parsed: OpenSessionResponse =
            response.json().await.map_err(KsefApiError::from_decode)?;
        let reference = parsed.reference_number.ok_or_else(|| {
            KsefApiError::SessionOpen("response did not include a referenceNumber".to_string())
        })?;

        self.state.replace(reference.clone(), keys);
        Ok(reference)
    }

    /// Encrypt one invoice and submit it within the open session.
    ///
    /// Requires a previously opened session; there is no implicit auto-open.
    pub async fn send_invoice(&mut self, xml: &[u8]) -> Result<SendInvoiceResponse, KsefApiError> {
        let reference = self
            .state
            .reference_number()
            .ok_or(KsefApiError::NoActiveSession)?
            .to_owned();
        let encrypted = crypto::encrypt_invoice(
            self.state.keys().ok_or(KsefApiError::NoActiveSession)?,
            xml,
        );

        let payload = InvoicePayload {
            invoice_hash: BASE64.encode(encrypted.plaintext_sha256),
            invoice_size: encrypted.plaintext_size as u64,
            encrypted_invoice_hash: BASE64.encode(encrypted.ciphertext_sha256),
            encrypted_invoice_size: encrypted.ciphertext_size as u64,
            encrypted_invoice_content: BASE64.encode(&encrypted.ciphertext),
        };
        let body = serde_json::to_value(&payload)
            .map_err(|e| KsefApiError::Configuration(e.to_string()))?;

        let url = self.url(&format!("/sessions/online/{}/invoices", reference));
        let response = self
            .request_authenticated(Method::POST, &url, Some(&body), &[], TIMEOUT_UPLOAD)
            .await?;
        response.json().await.map_err(KsefApiError::from_decode)
    }

    /// Status of the current session.
    pub async fn get_session_status(&mut self) -> Result<StatusInfo, KsefApiError> {
        let reference = self
            .state
            .reference_number()
            .ok_or(KsefApiError::NoActiveSession)?
            .to_owned();
        let url = self.url(&format!("/sessions/{}", reference));
        let response = self
            .request_authenticated(Method::GET, &url, None, &[], TIMEOUT_METADATA)
            .await?;
        let parsed: SessionStatusResponse =
            response.json().await.map_err(KsefApiError::from_decode)?;
        Ok(parsed.status)
    }

    /// Paginated statuses of all invoices submitted in the current session.
    pub async fn get_session_invoices_status(
        &mut self,
        page_size: u32,
        page_offset: u32,
    ) -> Result<serde_json::Value, KsefApiError> {
        let reference = self
            .state
            .reference_number()
            .ok_or(KsefApiError::NoActiveSession)?
            .to_owned();
        let url = self.url(&format!("/sessions/online/{}/invoices", reference));
        let query = [
            ("pageSize", page_size.to_string()),
            ("pageOffset", page_offset.to_string()),
        ];
        let response = self
            .request_authenticated(Method::GET, &url, None, &query, TIMEOUT_LISTING)
            .await?;
        response.json().await.map_err(KsefApiError::from_decode)
    }

    /// Processing status of one invoice within a session.
    pub async fn get_invoice_status(
        &mut self,
        invoice_reference: &str,
        session_reference: &str,
    ) -> Result<InvoiceStatusResponse, KsefApiError> {
        let url = self.url(&format!(
            "/sessions/{}/invoices/{}",
            session_reference, invoice_reference
        ));
        let response = self
            .request_authenticated(Method::GET, &url, None, &[], TIMEOUT_METADATA)
            .await?;
        response.json().await.map_err(KsefApiError::from_decode)
    }

    /// Raw bytes of the official receipt (UPO) for a processed invoice.
    pub async fn get_invoice_upo(
        &mut self,
        invoice_reference: &str,
        session_reference: &str,
    ) -> Result<Vec<u8>, KsefApiError> {
        let url = self.url(&format!(
            "/sessions/{}/invoices/{}/upo",
            session_reference, invoice_reference
        ));
        let response = self
            .request_authenticated(Method::GET, &url, None, &[], TIMEOUT_METADATA)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(KsefApiError::from_transport)?;
        Ok(bytes.to_vec())
    }

    /// Close the current session, best effort.
    ///
    /// Closing is advisory cleanup: a failure is logged and swallowed so it
    /// never blocks the caller's workflow. The stored reference is kept; a
    /// later `open_session()` probes it and re-keys as needed.
    pub async fn close_session(&mut self) {
        let Some(reference) = self.state.reference_number().map(str::to_owned) else {
            warn!("No KSeF session data found to close");
            return;
        };

        let url = self.url(&format!("/sessions/online/{}/close", reference));
        match self
            .request_authenticated(Method::POST, &url, None, &[], TIMEOUT_METADATA)
            .await
        {
            Ok(_) => debug!("KSeF session {} closed", reference),
            Err(e) => warn!("Failed to close KSeF session gracefully: {}", e),
        }
    }
}
