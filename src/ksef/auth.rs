// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Authentication handshake: challenge, signed assertion, status polling and
//! token redemption.
//!
//! The flow runs `NoChallenge -> ChallengeIssued -> SignatureSubmitted ->
//! Pending -> Authenticated`. None of these endpoints go through the
//! refreshing executor: they run before (or while) the tenant has a working
//! token pair, with explicit bearer tokens where the protocol requires one.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::config::{AUTH_POLL_ATTEMPTS, TIMEOUT_METADATA, TIMEOUT_XADES};
use crate::ksef::client::{error_for_status, KsefSessionClient};
use crate::ksef::error::KsefApiError;
use crate::ksef::types::{
    AuthChallengeResponse, AuthInitResponse, AuthStatusResponse, ContextIdentifier,
    KsefTokenAuthRequest, RedeemTokenResponse, RefreshTokenResponse, StatusInfo,
    STATUS_IN_PROGRESS, STATUS_SUCCESS,
};

impl KsefSessionClient {
    /// Fetch a one-time authentication challenge.
    pub async fn get_challenge(&self) -> Result<AuthChallengeResponse, KsefApiError> {
        let url = self.url("/auth/challenge");
        let response = self
            .http
            .post(&url)
            .timeout(TIMEOUT_METADATA)
            .send()
            .await
            .map_err(KsefApiError::from_transport)?;
        let response = error_for_status(response).await?;
        response.json().await.map_err(KsefApiError::from_decode)
    }

    /// Submit a XAdES-signed challenge assertion.
    ///
    /// Returns the temporary bearer token and the reference number to poll
    /// with [`Self::check_auth_status`].
    pub async fn authenticate_xades(
        &self,
        signed_xml: &str,
    ) -> Result<AuthInitResponse, KsefApiError> {
        let url = self.url("/auth/xades-signature");
        let response = self
            .http
            .post(&url)
            .timeout(TIMEOUT_XADES)
            .header(CONTENT_TYPE, "application/xml")
            .body(signed_xml.to_owned())
            .send()
            .await
            .map_err(KsefApiError::from_transport)?;
        let response = error_for_status(response).await?;
        response.json().await.map_err(KsefApiError::from_decode)
    }

    /// Start authentication with a one-time KSeF token.
    ///
    /// `encrypted_token_b64` is the token wrapped with the service's
    /// token-encryption public key (see [`crate::crypto::wrap_with_rsa_oaep`]
    /// and the `token_encryption_pem` half of the fetched key pair).
    pub async fn authenticate_token(
        &self,
        nip: &str,
        challenge: &str,
        encrypted_token_b64: &str,
    ) -> Result<AuthInitResponse, KsefApiError> {
        let url = self.url("/auth/ksef-token");
        let payload = KsefTokenAuthRequest {
            challenge: challenge.to_owned(),
            context_identifier: ContextIdentifier::nip(nip),
            encrypted_token: encrypted_token_b64.to_owned(),
        };
        let response = self
            .http
            .post(&url)
            .timeout(TIMEOUT_METADATA)
            .json(&payload)
            .send()
            .await
            .map_err(KsefApiError::from_transport)?;
        let response = error_for_status(response).await?;
        response.json().await.map_err(KsefApiError::from_decode)
    }

    /// Poll the authentication status until it resolves.
    ///
    /// Bounded at [`AUTH_POLL_ATTEMPTS`] polls with the configured interval
    /// between them. Code 200 resolves immediately; code 100 keeps polling;
    /// any other code is a terminal [`KsefApiError::Authentication`].
    /// Exhausting the attempts raises [`KsefApiError::AuthenticationTimeout`].
    pub async fn check_auth_status(
        &self,
        reference_number: &str,
        temp_token: &str,
    ) -> Result<AuthStatusResponse, KsefApiError> {
        let url = self.url(&format!("/auth/{}", reference_number));

        for attempt in 1..=AUTH_POLL_ATTEMPTS {
            let response = self
                .http
                .get(&url)
                .timeout(TIMEOUT_METADATA)
                .header(AUTHORIZATION, format!("Bearer {}", temp_token))
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(KsefApiError::from_transport)?;
            let response = error_for_status(response).await?;
            let parsed: AuthStatusResponse =
                response.json().await.map_err(KsefApiError::from_decode)?;

            match parsed.status.code {
                STATUS_SUCCESS => return Ok(parsed),
                STATUS_IN_PROGRESS => {
                    debug!(
                        "KSeF auth status is in progress (attempt {}/{})",
                        attempt, AUTH_POLL_ATTEMPTS
                    );
                    tokio::time::sleep(self.config.auth_poll_interval).await;
                }
                code => {
                    return Err(authentication_error(code, &parsed.status));
                }
            }
        }

        Err(KsefApiError::AuthenticationTimeout)
    }

    /// Exchange the temporary token for the permanent access/refresh pair.
    ///
    /// The returned pair is also stored on the client's credential.
    pub async fn redeem_token(
        &mut self,
        temp_token: &str,
    ) -> Result<RedeemTokenResponse, KsefApiError> {
        let url = self.url("/auth/token/redeem");
        let response = self
            .http
            .post(&url)
            .timeout(TIMEOUT_METADATA)
            .header(AUTHORIZATION, format!("Bearer {}", temp_token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(KsefApiError::from_transport)?;
        let response = error_for_status(response).await?;
        let parsed: RedeemTokenResponse =
            response.json().await.map_err(KsefApiError::from_decode)?;

        match (&parsed.access_token, &parsed.refresh_token) {
            (Some(access), Some(refresh)) => {
                self.credential.access_token = access.token.clone();
                self.credential.refresh_token = refresh.token.clone();
                Ok(parsed)
            }
            _ => Err(KsefApiError::Configuration(
                "token redemption response did not include both access and refresh tokens"
                    .to_string(),
            )),
        }
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// Used by the request executor on 401 and callable directly. The new
    /// token replaces the in-memory one and is handed to the token sink for
    /// persistence.
    pub async fn refresh_access_token(&mut self) -> Result<String, KsefApiError> {
        if self.credential.refresh_token.is_empty() {
            return Err(KsefApiError::Configuration(
                "no refresh token found to renew the session".to_string(),
            ));
        }

        let url = self.url("/auth/token/refresh");
        let response = self
            .http
            .post(&url)
            .timeout(TIMEOUT_METADATA)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credential.refresh_token),
            )
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(KsefApiError::from_transport)?;
        let response = error_for_status(response).await?;
        let parsed: RefreshTokenResponse =
            response.json().await.map_err(KsefApiError::from_decode)?;

        let access_token = parsed
            .access_token
            .map(|t| t.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                KsefApiError::Configuration(
                    "failed to retrieve a new access token from KSeF response".to_string(),
                )
            })?;

        self.credential.access_token = access_token.clone();
        self.token_sink.access_token_refreshed(&access_token);
        info!("KSeF access token successfully refreshed");
        Ok(access_token)
    }
}

fn authentication_error(code: i64, status: &StatusInfo) -> KsefApiError {
    KsefApiError::Authentication {
        code,
        description: status.description.clone().unwrap_or_default(),
    }
}
