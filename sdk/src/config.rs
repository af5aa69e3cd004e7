// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! SDK configuration.
//!
//! [`OmegaConfig`] drives the base gateway (connection, identity defaults,
//! timeout, retry bound); [`FederationOptions`] adds the security surface of
//! the signed invocation client (credentials, allowlist, payload limits,
//! HMAC secret). Both load from `OMEGA_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

pub const DEFAULT_FEDERATION_URL: &str = "http://localhost:9405";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const MAX_MAX_RETRIES: u32 = 10;
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 262_144;
pub const DEFAULT_MAX_PAYLOAD_DEPTH: usize = 32;

pub const SDK_NAME: &str = "omega-sdk-rust";
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for the OMEGA SDK client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmegaConfig {
    /// Federation Core base URL.
    pub federation_url: String,

    /// API key for bearer authentication (optional).
    pub api_key: Option<String>,

    /// Default tenant id, used when a call does not override it.
    pub tenant_id: Option<String>,

    /// Default actor id, used when a call does not override it.
    pub actor_id: Option<String>,

    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum attempts for transient failures, including the first.
    pub max_retries: u32,

    /// SDK identity sent in request metadata.
    pub sdk_name: String,
    pub sdk_version: String,
}

impl Default for OmegaConfig {
    fn default() -> Self {
        Self {
            federation_url: DEFAULT_FEDERATION_URL.to_string(),
            api_key: None,
            tenant_id: None,
            actor_id: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            sdk_name: SDK_NAME.to_string(),
            sdk_version: SDK_VERSION.to_string(),
        }
    }
}

impl OmegaConfig {
    /// Load configuration from `OMEGA_*` environment variables.
    ///
    /// Unset variables fall back to defaults; numeric values are clamped to
    /// their documented bounds.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            federation_url: env::var("OMEGA_FEDERATION_URL")
                .unwrap_or(defaults.federation_url),
            api_key: env::var("OMEGA_API_KEY").ok(),
            tenant_id: env::var("OMEGA_TENANT_ID").ok(),
            actor_id: env::var("OMEGA_ACTOR_ID").ok(),
            timeout_ms: env_parse("OMEGA_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)
                .clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS),
            max_retries: env_parse("OMEGA_MAX_RETRIES", DEFAULT_MAX_RETRIES)
                .min(MAX_MAX_RETRIES),
            sdk_name: defaults.sdk_name,
            sdk_version: defaults.sdk_version,
        }
    }

    pub fn with_federation_url(mut self, url: impl Into<String>) -> Self {
        self.federation_url = url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_actor_id(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_MAX_RETRIES);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        self
    }

    /// Per-attempt transport timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_attempts(self.max_retries)
    }

    /// SDK identity string sent in the `X-Omega-SDK` header.
    pub fn sdk_identity(&self) -> String {
        format!("{}/{}", self.sdk_name, self.sdk_version)
    }
}

/// Deployment mode of the signed invocation client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            _ => Ok(Environment::Development),
        }
    }
}

/// Whether outbound tool invocations carry a signature header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureMode {
    #[default]
    Enabled,
    Disabled,
}

/// Options for the signed invocation client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FederationOptions {
    /// Client id for the client-credential token exchange.
    pub client_id: Option<String>,

    /// Client secret for the client-credential token exchange.
    pub client_secret: Option<String>,

    /// Deployment mode. The tool allowlist is enforced only in production.
    pub environment: Environment,

    /// Passport identity attached to signed invocations.
    pub passport_id: Option<String>,

    /// Tool names permitted in production mode.
    pub allowed_tools: Vec<String>,

    /// Signature header generation toggle.
    pub signature_mode: SignatureMode,

    /// Maximum canonical payload size in bytes. Zero means the default.
    pub max_payload_bytes: usize,

    /// Maximum payload nesting depth. Zero means the default.
    pub max_payload_depth: usize,

    /// Base64-encoded pre-shared HMAC secret.
    pub hmac_secret_b64: Option<String>,
}

impl FederationOptions {
    /// Load options from `OMEGA_*` environment variables.
    ///
    /// `OMEGA_ALLOWED_TOOLS` is a comma-separated list.
    pub fn from_env() -> Self {
        Self {
            client_id: env::var("OMEGA_CLIENT_ID").ok(),
            client_secret: env::var("OMEGA_CLIENT_SECRET").ok(),
            environment: env::var("OMEGA_ENVIRONMENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            passport_id: env::var("OMEGA_PASSPORT_ID").ok(),
            allowed_tools: env::var("OMEGA_ALLOWED_TOOLS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            signature_mode: match env::var("OMEGA_SIGNATURE_MODE").ok().as_deref() {
                Some("disabled") => SignatureMode::Disabled,
                _ => SignatureMode::Enabled,
            },
            max_payload_bytes: env_parse("OMEGA_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES),
            max_payload_depth: env_parse("OMEGA_MAX_PAYLOAD_DEPTH", DEFAULT_MAX_PAYLOAD_DEPTH),
            hmac_secret_b64: env::var("OMEGA_HMAC_SECRET").ok(),
        }
    }

    pub fn max_payload_bytes(&self) -> usize {
        if self.max_payload_bytes == 0 {
            DEFAULT_MAX_PAYLOAD_BYTES
        } else {
            self.max_payload_bytes
        }
    }

    pub fn max_payload_depth(&self) -> usize {
        if self.max_payload_depth == 0 {
            DEFAULT_MAX_PAYLOAD_DEPTH
        } else {
            self.max_payload_depth
        }
    }
}

fn env_parse<T: FromStr + Copy>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
