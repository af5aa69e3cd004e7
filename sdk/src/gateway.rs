// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Federation Core gateway.
//!
//! The low-level HTTP interface every namespace call goes through:
//!
//! - identity and correlation header injection,
//! - response envelope unwrapping,
//! - typed error mapping (transport failures never leak raw),
//! - bounded retry for transient failures.
//!
//! Within one logical call the correlation id is created by the caller and
//! reused unchanged across the call's retries.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::config::OmegaConfig;
use crate::correlation::CorrelationId;
use crate::envelope::unwrap_envelope;
use crate::error::{ErrorKind, OmegaError};
use crate::retry::{retry_with_policy, RetryPolicy};

pub const HEADER_TENANT_ID: &str = "X-Tenant-Id";
pub const HEADER_ACTOR_ID: &str = "X-Actor-Id";
pub const HEADER_CORRELATION_ID: &str = "X-Correlation-Id";
pub const HEADER_IDEMPOTENCY_KEY: &str = "X-Idempotency-Key";
pub const HEADER_DECISION_RECEIPT_ID: &str = "X-Decision-Receipt-Id";

/// Per-call identity context resolved by the caller.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub tenant_id: String,
    pub actor_id: String,
    /// Canonical correlation id, stable across this call's retries.
    pub correlation_id: String,
    pub idempotency_key: Option<String>,
    pub decision_receipt_id: Option<String>,
}

/// HTTP client for the Federation Core API.
#[derive(Debug, Clone)]
pub struct FederationGateway {
    config: OmegaConfig,
    base_url: String,
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl FederationGateway {
    pub fn new(config: OmegaConfig) -> Result<Self, OmegaError> {
        let base_url = format!("{}/api/v1", config.federation_url.trim_end_matches('/'));
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                OmegaError::new(
                    ErrorKind::Internal,
                    format!("failed to build HTTP client: {}", e),
                )
            })?;
        let policy = config.retry_policy();

        Ok(Self {
            config,
            base_url,
            client,
            policy,
        })
    }

    pub fn config(&self) -> &OmegaConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Override the retry policy (tests and advanced callers).
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Send a GET request and unwrap the response envelope.
    pub async fn get(
        &self,
        path: &str,
        ctx: &CallContext,
        params: &[(&str, String)],
    ) -> Result<Value, OmegaError> {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.build_headers(ctx, None)?;

        tracing::debug!(
            path,
            correlation_id = %ctx.correlation_id,
            "sending GET request to Federation Core"
        );

        retry_with_policy(&self.policy, |e: &OmegaError| e.retryable, || async {
            let response = self
                .client
                .get(&url)
                .headers(headers.clone())
                .query(params)
                .send()
                .await
                .map_err(|e| transport_error(e, ctx))?;

            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(|e| transport_error(e, ctx))?;
            unwrap_envelope(status, &body)
        })
        .await
    }

    /// Send a POST request and unwrap the response envelope.
    ///
    /// `extra_headers` pass through untouched; the signed invocation protocol
    /// uses them for its signature header set, which must never land in the
    /// payload.
    pub async fn post(
        &self,
        path: &str,
        ctx: &CallContext,
        body: &Value,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<Value, OmegaError> {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.build_headers(ctx, extra_headers)?;

        tracing::debug!(
            path,
            correlation_id = %ctx.correlation_id,
            signed = extra_headers.is_some(),
            "sending POST request to Federation Core"
        );

        retry_with_policy(&self.policy, |e: &OmegaError| e.retryable, || async {
            let response = self
                .client
                .post(&url)
                .headers(headers.clone())
                .json(body)
                .send()
                .await
                .map_err(|e| transport_error(e, ctx))?;

            let status = response.status().as_u16();
            let bytes = response.bytes().await.map_err(|e| transport_error(e, ctx))?;
            unwrap_envelope(status, &bytes)
        })
        .await
    }

    /// Send a bare GET without identity headers or retry (health probes).
    pub async fn get_unauthenticated(&self, path: &str) -> Result<Value, OmegaError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(e, &CallContext::default()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, &CallContext::default()))?;
        unwrap_envelope(status, &body)
    }

    /// Build the request header set for a call context.
    ///
    /// The correlation id is validated against the canonical format before it
    /// is attached; malformed ids never reach the wire.
    fn build_headers(
        &self,
        ctx: &CallContext,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<HeaderMap, OmegaError> {
        CorrelationId::parse(&ctx.correlation_id)?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, HEADER_TENANT_ID, &ctx.tenant_id)?;
        insert_header(&mut headers, HEADER_ACTOR_ID, &ctx.actor_id)?;
        insert_header(&mut headers, HEADER_CORRELATION_ID, &ctx.correlation_id)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.config.api_key {
            insert_header(
                &mut headers,
                AUTHORIZATION.as_str(),
                &format!("Bearer {}", api_key),
            )?;
        }

        if let Some(idempotency_key) = &ctx.idempotency_key {
            insert_header(&mut headers, HEADER_IDEMPOTENCY_KEY, idempotency_key)?;
        }

        if let Some(receipt_id) = &ctx.decision_receipt_id {
            insert_header(&mut headers, HEADER_DECISION_RECEIPT_ID, receipt_id)?;
        }

        if let Some(extra) = extra_headers {
            for (name, value) in extra {
                insert_header(&mut headers, name, value)?;
            }
        }

        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), OmegaError> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
        OmegaError::new(
            ErrorKind::ValidationFailed,
            format!("invalid header name: {}", name),
        )
    })?;
    let value = HeaderValue::from_str(value).map_err(|_| {
        OmegaError::new(
            ErrorKind::ValidationFailed,
            format!("invalid value for header {}", name),
        )
    })?;
    headers.insert(name, value);
    Ok(())
}

/// Map a transport-level failure into a typed, retryable error.
///
/// Timeouts surface as `TIMEOUT`; connectivity and other transport failures
/// as `UPSTREAM_ERROR`. Callers never see a raw transport error.
fn transport_error(err: reqwest::Error, ctx: &CallContext) -> OmegaError {
    let correlation_id = if ctx.correlation_id.is_empty() {
        None
    } else {
        Some(ctx.correlation_id.clone())
    };

    let base = if err.is_timeout() {
        OmegaError::new(ErrorKind::Timeout, "request timed out")
    } else {
        OmegaError::new(ErrorKind::Upstream, "transport failure")
    };

    base.with_retryable(true)
        .with_detail("source", err.to_string())
        .with_correlation_id(correlation_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> CallContext {
        CallContext {
            tenant_id: "acme".to_string(),
            actor_id: "clint".to_string(),
            correlation_id: CorrelationId::generate("acme").unwrap().to_string(),
            idempotency_key: Some("idem-1".to_string()),
            decision_receipt_id: None,
        }
    }

    #[test]
    fn test_base_url_is_versioned() {
        let config = OmegaConfig::default().with_federation_url("http://localhost:9405/");
        let gateway = FederationGateway::new(config).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:9405/api/v1");
    }

    #[test]
    fn test_build_headers_injects_identity() {
        let config = OmegaConfig::default().with_api_key("secret-key");
        let gateway = FederationGateway::new(config).unwrap();
        let ctx = test_context();

        let headers = gateway.build_headers(&ctx, None).unwrap();
        assert_eq!(headers.get(HEADER_TENANT_ID).unwrap(), "acme");
        assert_eq!(headers.get(HEADER_ACTOR_ID).unwrap(), "clint");
        assert_eq!(
            headers.get(HEADER_CORRELATION_ID).unwrap(),
            ctx.correlation_id.as_str()
        );
        assert_eq!(headers.get(HEADER_IDEMPOTENCY_KEY).unwrap(), "idem-1");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer secret-key");
        assert!(headers.get(HEADER_DECISION_RECEIPT_ID).is_none());
    }

    #[test]
    fn test_build_headers_rejects_malformed_correlation_id() {
        let gateway = FederationGateway::new(OmegaConfig::default()).unwrap();
        let ctx = CallContext {
            correlation_id: "not-canonical".to_string(),
            ..test_context()
        };

        let err = gateway.build_headers(&ctx, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
    }

    #[test]
    fn test_extra_headers_pass_through() {
        let gateway = FederationGateway::new(OmegaConfig::default()).unwrap();
        let mut extra = HashMap::new();
        extra.insert("X-Omega-Signature".to_string(), "c2ln".to_string());

        let headers = gateway.build_headers(&test_context(), Some(&extra)).unwrap();
        assert_eq!(headers.get("X-Omega-Signature").unwrap(), "c2ln");
    }
}
