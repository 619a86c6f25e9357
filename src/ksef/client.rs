// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stateful KSeF session client and its authenticated request executor.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::info;

use crate::config::KsefApiConfig;
use crate::ksef::error::KsefApiError;
use crate::ksef::state::{Credential, SessionState};

/// External persistence seam for refreshed access tokens.
///
/// The owning tenant record stores the token pair; when the executor silently
/// refreshes an expired access token mid-request, the new token is handed to
/// this sink so the caller can persist it.
pub trait TokenSink: Send + Sync {
    fn access_token_refreshed(&self, access_token: &str);
}

/// Default sink for callers that re-read the credential off the client.
pub struct NoopTokenSink;

impl TokenSink for NoopTokenSink {
    fn access_token_refreshed(&self, _access_token: &str) {}
}

/// Client for one tenant's interactive KSeF workflow.
///
/// Intended for single-caller, sequential use: `open_session()` once per
/// batch, then `send_invoice()` per document, status queries as needed, and
/// `close_session()` at the end. Mutating operations take `&mut self`;
/// callers running concurrent workflows against the same tenant must
/// serialize access externally.
pub struct KsefSessionClient {
    pub(crate) http: Client,
    pub(crate) config: KsefApiConfig,
    pub(crate) credential: Credential,
    pub(crate) state: SessionState,
    pub(crate) token_sink: Box<dyn TokenSink>,
}

impl KsefSessionClient {
    /// Build a client from the tenant's persisted credential and session state.
    pub fn new(
        config: KsefApiConfig,
        credential: Credential,
        state: SessionState,
    ) -> Result<Self, KsefApiError> {
        let http = Client::builder()
            .build()
            .map_err(|e| KsefApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            config,
            credential,
            state,
            token_sink: Box::new(NoopTokenSink),
        })
    }

    /// Replace the token persistence sink.
    pub fn with_token_sink(mut self, sink: Box<dyn TokenSink>) -> Self {
        self.token_sink = sink;
        self
    }

    /// Current session state, for persistence after a batch.
    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    /// Current credential (the access token may have been refreshed).
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Issue an authenticated request, refreshing the access token once on 401.
    ///
    /// The `is_retry` flag bounds the refresh cycle structurally: a 401 on the
    /// retried request is surfaced as [`KsefApiError::RemoteApi`], never
    /// refreshed again.
    pub(crate) async fn request_authenticated(
        &mut self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<reqwest::Response, KsefApiError> {
        let mut is_retry = false;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url)
                .timeout(timeout)
                .header(
                    AUTHORIZATION,
                    format!("Bearer {}", self.credential.access_token),
                )
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(KsefApiError::from_transport)?;

            if response.status() == StatusCode::UNAUTHORIZED && !is_retry {
                info!("KSeF access token expired, refreshing");
                self.refresh_access_token().await?;
                is_retry = true;
                continue;
            }

            if !response.status().is_success() {
                return Err(KsefApiError::from_response(response).await);
            }

            return Ok(response);
        }
    }
}

/// Normalize a raw (non-executor) response: non-2xx becomes `RemoteApi`.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, KsefApiError> {
    if !response.status().is_success() {
        return Err(KsefApiError::from_response(response).await);
    }
    Ok(response)
}
