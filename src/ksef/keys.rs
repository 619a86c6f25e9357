// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fetching the service's envelope-encryption certificates.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::ACCEPT;

use crate::config::TIMEOUT_METADATA;
use crate::crypto::envelope;
use crate::ksef::client::{error_for_status, KsefSessionClient};
use crate::ksef::error::KsefApiError;
use crate::ksef::types::{PublicKeyCertificate, PublicKeyPair};

const USAGE_SYMMETRIC: &str = "SymmetricKeyEncryption";
const USAGE_TOKEN: &str = "KsefTokenEncryption";

impl KsefSessionClient {
    /// Fetch the certificate list and extract both required public keys as
    /// SPKI PEM.
    ///
    /// Fetched fresh on every session open; there is no cache. A response
    /// that lacks either usage is a server-contract violation and fails with
    /// [`KsefApiError::Configuration`] without retry.
    pub async fn fetch_public_keys(&self) -> Result<PublicKeyPair, KsefApiError> {
        let url = self.url("/security/public-key-certificates");
        let response = self
            .http
            .get(&url)
            .timeout(TIMEOUT_METADATA)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(KsefApiError::from_transport)?;
        let response = error_for_status(response).await?;
        let certificates: Vec<PublicKeyCertificate> =
            response.json().await.map_err(KsefApiError::from_decode)?;

        let mut symmetric_pem: Option<String> = None;
        let mut token_pem: Option<String> = None;

        for entry in &certificates {
            let wants_symmetric = entry.usage.iter().any(|u| u == USAGE_SYMMETRIC);
            let wants_token = entry.usage.iter().any(|u| u == USAGE_TOKEN);
            if !wants_symmetric && !wants_token {
                continue;
            }

            let der = BASE64.decode(&entry.certificate).map_err(|e| {
                KsefApiError::Configuration(format!("certificate is not valid base64: {}", e))
            })?;
            let pem = envelope::public_key_pem_from_certificate(&der)?;

            if wants_symmetric {
                symmetric_pem = Some(pem.clone());
            }
            if wants_token {
                token_pem = Some(pem);
            }
        }

        match (symmetric_pem, token_pem) {
            (Some(symmetric_key_encryption_pem), Some(token_encryption_pem)) => {
                Ok(PublicKeyPair {
                    symmetric_key_encryption_pem,
                    token_encryption_pem,
                })
            }
            _ => Err(KsefApiError::Configuration(format!(
                "could not find all required KSeF public keys ('{}' and '{}')",
                USAGE_SYMMETRIC, USAGE_TOKEN
            ))),
        }
    }
}
