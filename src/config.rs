// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! KSeF environment selection and request timing configuration.

use std::time::Duration;

/// Production KSeF API base URL.
pub const PRODUCTION_API_URL: &str = "https://ksef.mf.gov.pl/api/v2";

/// Test (sandbox) KSeF API base URL.
pub const TEST_API_URL: &str = "https://ksef-test.mf.gov.pl/api/v2";

/// Number of authentication status polls before giving up.
pub const AUTH_POLL_ATTEMPTS: u32 = 5;

/// Delay between authentication status polls.
pub const AUTH_POLL_INTERVAL: Duration = Duration::from_secs(2);

// Per-request timeouts by latency class.
pub(crate) const TIMEOUT_METADATA: Duration = Duration::from_secs(10);
pub(crate) const TIMEOUT_XADES: Duration = Duration::from_secs(15);
pub(crate) const TIMEOUT_LISTING: Duration = Duration::from_secs(20);
pub(crate) const TIMEOUT_UPLOAD: Duration = Duration::from_secs(30);

/// Which KSeF environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KsefMode {
    Production,
    Test,
}

impl KsefMode {
    /// Base URL of the environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            KsefMode::Production => PRODUCTION_API_URL,
            KsefMode::Test => TEST_API_URL,
        }
    }
}

/// Client configuration.
///
/// `auth_poll_interval` defaults to the cadence the remote service expects
/// ([`AUTH_POLL_INTERVAL`]); production callers should not change it.
#[derive(Debug, Clone)]
pub struct KsefApiConfig {
    pub base_url: String,
    pub auth_poll_interval: Duration,
}

impl KsefApiConfig {
    /// Configuration for a standard KSeF environment.
    pub fn for_mode(mode: KsefMode) -> Self {
        Self::with_base_url(mode.base_url())
    }

    /// Configuration pointing at an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_poll_interval: AUTH_POLL_INTERVAL,
        }
    }
}

impl Default for KsefApiConfig {
    fn default() -> Self {
        Self::for_mode(KsefMode::Test)
    }
}
