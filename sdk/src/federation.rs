// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Signed tool invocation.
//!
//! [`FederationClient`] adds a security envelope around invocation of a named
//! remote tool. Before any network call it runs, in order:
//!
//! 1. payload canonicalization,
//! 2. payload size validation,
//! 3. payload depth validation,
//! 4. tool allowlist enforcement (production mode),
//! 5. access-token acquisition,
//! 6. HMAC-SHA256 signing with a fresh nonce and timestamp.
//!
//! Signature material travels only in `X-Omega-*` request headers, never in
//! the payload, so it cannot affect (or be affected by) canonicalization.
//! Replay rejection based on the nonce and timestamp is a receiver-side
//! invariant; this client only supplies fresh material.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::sync::Mutex;

use crate::config::{Environment, FederationOptions, OmegaConfig, SignatureMode};
use crate::correlation::CorrelationId;
use crate::error::{ErrorKind, OmegaError};
use crate::gateway::{CallContext, FederationGateway};

type HmacSha256 = Hmac<Sha256>;

pub const INVOKE_METHOD: &str = "POST";
pub const INVOKE_PATH: &str = "/mcp/tools/invoke";
pub const LIST_TOOLS_PATH: &str = "/mcp/tools/list";
pub const TOKEN_PATH: &str = "/auth/client/token";

pub const HEADER_PASSPORT: &str = "X-Omega-Passport";
pub const HEADER_TIMESTAMP: &str = "X-Omega-Timestamp";
pub const HEADER_NONCE: &str = "X-Omega-Nonce";
pub const HEADER_SIGNATURE: &str = "X-Omega-Signature";
pub const HEADER_SDK: &str = "X-Omega-SDK";

/// Margin before token expiry at which a refresh is triggered.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(10);
/// Fallback token lifetime when the exchange omits `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Serialize a JSON value deterministically.
///
/// Object keys are sorted lexicographically at every nesting level, with no
/// insignificant whitespace and serde_json string escaping. Two logically
/// equal payloads always produce byte-identical output regardless of
/// construction order; the result is both the constraint-check subject and
/// the exact bytes fed into the signature.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already render compactly and deterministically.
        scalar => out.push_str(&scalar.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Payload constraints
// ---------------------------------------------------------------------------

/// Validates payload constraints before anything touches the network.
#[derive(Debug, Clone)]
pub struct PayloadValidator {
    max_payload_bytes: usize,
    max_payload_depth: usize,
}

impl PayloadValidator {
    pub fn new(max_payload_bytes: usize, max_payload_depth: usize) -> Self {
        Self {
            max_payload_bytes,
            max_payload_depth,
        }
    }

    /// Check the canonical form's byte length. Exactly the limit passes.
    pub fn validate_size(&self, canonical: &str) -> Result<(), OmegaError> {
        let size = canonical.len();
        if size > self.max_payload_bytes {
            return Err(OmegaError::new(
                ErrorKind::PayloadTooLarge,
                format!(
                    "payload size {} bytes exceeds limit of {} bytes",
                    size, self.max_payload_bytes
                ),
            )
            .with_detail("size_bytes", size as u64)
            .with_detail("limit_bytes", self.max_payload_bytes as u64));
        }
        Ok(())
    }

    /// Check nesting depth of maps and sequences. Exactly the limit passes.
    pub fn validate_depth(&self, payload: &Value) -> Result<(), OmegaError> {
        let depth = depth_of(payload);
        if depth > self.max_payload_depth {
            return Err(OmegaError::new(
                ErrorKind::PayloadTooDeep,
                format!(
                    "payload nesting depth {} exceeds limit of {}",
                    depth, self.max_payload_depth
                ),
            )
            .with_detail("depth", depth as u64)
            .with_detail("limit", self.max_payload_depth as u64));
        }
        Ok(())
    }
}

fn depth_of(value: &Value) -> usize {
    match value {
        Value::Object(map) => map
            .values()
            .map(|v| 1 + depth_of(v))
            .max()
            .unwrap_or(0),
        Value::Array(items) => items.iter().map(|v| 1 + depth_of(v)).max().unwrap_or(0),
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// A signed tool invocation: signature material attached as headers.
#[derive(Debug, Clone)]
pub struct SignedInvokeRequest {
    pub passport_id: String,
    pub tool_name: String,
    pub timestamp_ms: u64,
    /// 96-bit random nonce, base64.
    pub nonce: String,
    /// Base64 HMAC-SHA256 over the canonical signing string.
    pub signature: String,
    /// SDK identity as `name/version`.
    pub sdk_identity: String,
}

impl SignedInvokeRequest {
    /// The `X-Omega-*` header set attached to the invoke request.
    pub fn to_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(HEADER_PASSPORT.to_string(), self.passport_id.clone());
        headers.insert(HEADER_TIMESTAMP.to_string(), self.timestamp_ms.to_string());
        headers.insert(HEADER_NONCE.to_string(), self.nonce.clone());
        headers.insert(HEADER_SIGNATURE.to_string(), self.signature.clone());
        headers.insert(HEADER_SDK.to_string(), self.sdk_identity.clone());
        headers
    }
}

/// Canonical signing string: method, path, timestamp, nonce and canonical
/// payload, each on its own line.
pub fn build_signing_string(
    method: &str,
    path: &str,
    timestamp_ms: u64,
    nonce: &str,
    canonical_payload: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        method, path, timestamp_ms, nonce, canonical_payload
    )
}

/// HMAC-SHA256 over the signing string, base64-encoded.
pub fn sign(secret: &[u8], signing_string: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC key size is always valid");
    mac.update(signing_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Generate a fresh 96-bit nonce, base64-encoded.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 12];
    OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Access token lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: Instant,
}

/// Process-local access-token cache with single-flight refresh.
///
/// The state machine (`absent → valid → near_expiry → refreshed | expired`)
/// lives behind one async mutex: the fetch runs under the lock, so concurrent
/// callers that observe a missing or near-expiry token serialize on it and
/// exactly one exchange is in flight at a time. A failed fetch clears the
/// cache and surfaces the failure unretried.
#[derive(Debug, Default)]
struct TokenCache {
    state: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    async fn ensure<F, Fut>(&self, fetch: F) -> Result<String, OmegaError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(String, u64), OmegaError>>,
    {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            if Instant::now() + TOKEN_REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        match fetch().await {
            Ok((token, expires_in_secs)) => {
                tracing::info!(expires_in_secs, "obtained access token");
                *state = Some(AccessToken {
                    token: token.clone(),
                    expires_at: Instant::now() + Duration::from_secs(expires_in_secs),
                });
                Ok(token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "access token fetch failed");
                *state = None;
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Descriptor of a remote tool as returned by the tool registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// High-level client for secure Federation Core tool operations.
pub struct FederationClient {
    gateway: FederationGateway,
    config: OmegaConfig,
    options: FederationOptions,
    validator: PayloadValidator,
    allowed_tools: HashSet<String>,
    token_cache: TokenCache,
}

impl FederationClient {
    pub fn new(options: FederationOptions, config: OmegaConfig) -> Result<Self, OmegaError> {
        let gateway = FederationGateway::new(config.clone())?;
        let validator =
            PayloadValidator::new(options.max_payload_bytes(), options.max_payload_depth());
        let allowed_tools = options.allowed_tools.iter().cloned().collect();

        Ok(Self {
            gateway,
            config,
            options,
            validator,
            allowed_tools,
            token_cache: TokenCache::default(),
        })
    }

    /// Build a client entirely from `OMEGA_*` environment variables.
    pub fn from_env() -> Result<Self, OmegaError> {
        Self::new(FederationOptions::from_env(), OmegaConfig::from_env())
    }

    pub fn options(&self) -> &FederationOptions {
        &self.options
    }

    fn call_context(&self) -> Result<CallContext, OmegaError> {
        let tenant_id = self.config.tenant_id.clone().unwrap_or_default();
        let actor_id = self.config.actor_id.clone().unwrap_or_default();
        let correlation_id = CorrelationId::generate(&tenant_id)?.to_string();

        Ok(CallContext {
            tenant_id,
            actor_id,
            correlation_id,
            idempotency_key: None,
            decision_receipt_id: None,
        })
    }

    /// List available tools from the Federation Core registry.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, OmegaError> {
        let ctx = self.call_context()?;
        let data = self.gateway.get(LIST_TOOLS_PATH, &ctx, &[]).await?;

        let tools = data
            .get("tools")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let tools: Vec<ToolDescriptor> = serde_json::from_value(tools).map_err(|e| {
            OmegaError::new(
                ErrorKind::InvalidEnvelope,
                format!("failed to parse tool list: {}", e),
            )
            .with_correlation_id(Some(ctx.correlation_id.clone()))
        })?;

        tracing::info!(count = tools.len(), "listed available tools");
        Ok(tools)
    }

    /// Invoke a remote tool with the full security envelope.
    pub async fn invoke_tool(&self, tool_name: &str, payload: &Value) -> Result<Value, OmegaError> {
        // 1-3. Canonical form drives both constraint checks and the signature.
        let canonical = canonicalize(payload);
        self.validator.validate_size(&canonical)?;
        self.validator.validate_depth(payload)?;

        // 4. Allowlist gate, before any network I/O. Unconditional in
        //    production, inert elsewhere.
        if self.options.environment == Environment::Production
            && !self.allowed_tools.contains(tool_name)
        {
            return Err(OmegaError::new(
                ErrorKind::ToolNotAllowed,
                format!("tool '{}' is not in the configured allowlist", tool_name),
            )
            .with_detail("tool_name", tool_name));
        }

        let mut ctx = self.call_context()?;

        // 5. Token acquisition, when client credentials are configured.
        let token = if self.options.client_id.is_some() {
            Some(self.ensure_token().await?)
        } else {
            None
        };

        // 6. Signature headers, unless signing is disabled.
        let mut extra_headers = match self.options.signature_mode {
            SignatureMode::Enabled => {
                let signed = self.create_signed_request(tool_name, &canonical)?;
                tracing::debug!(
                    tool_name,
                    correlation_id = %ctx.correlation_id,
                    "tool invocation signed"
                );
                signed.to_headers()
            }
            SignatureMode::Disabled => HashMap::new(),
        };
        if let Some(token) = token {
            extra_headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }

        let invoke_payload = json!({
            "tool_name": tool_name,
            "parameters": payload,
            "metadata": {
                "client_id": self.options.client_id,
                "passport_id": self.options.passport_id,
            },
        });

        ctx.idempotency_key = Some(uuid::Uuid::new_v4().to_string());

        let result = self
            .gateway
            .post(INVOKE_PATH, &ctx, &invoke_payload, Some(&extra_headers))
            .await?;

        tracing::info!(tool_name, correlation_id = %ctx.correlation_id, "tool invoked");
        Ok(result)
    }

    fn create_signed_request(
        &self,
        tool_name: &str,
        canonical_payload: &str,
    ) -> Result<SignedInvokeRequest, OmegaError> {
        let secret_b64 = self.options.hmac_secret_b64.as_deref().ok_or_else(|| {
            OmegaError::new(
                ErrorKind::ValidationFailed,
                "signing is enabled but no HMAC secret is configured",
            )
        })?;
        let secret = BASE64.decode(secret_b64).map_err(|e| {
            OmegaError::new(
                ErrorKind::ValidationFailed,
                format!("HMAC secret is not valid base64: {}", e),
            )
        })?;

        let nonce = generate_nonce();
        let timestamp_ms = now_ms();
        let signing_string =
            build_signing_string(INVOKE_METHOD, INVOKE_PATH, timestamp_ms, &nonce, canonical_payload);
        let signature = sign(&secret, &signing_string);

        Ok(SignedInvokeRequest {
            passport_id: self.options.passport_id.clone().unwrap_or_default(),
            tool_name: tool_name.to_string(),
            timestamp_ms,
            nonce,
            signature,
            sdk_identity: self.config.sdk_identity(),
        })
    }

    /// Ensure a valid access token, refreshing near expiry.
    async fn ensure_token(&self) -> Result<String, OmegaError> {
        let ctx = self.call_context()?;
        self.token_cache
            .ensure(|| async {
                let body = json!({
                    "client_id": self.options.client_id,
                    "client_secret": self.options.client_secret,
                });
                let data = self.gateway.post(TOKEN_PATH, &ctx, &body, None).await?;

                let token = data
                    .get("access_token")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        OmegaError::new(
                            ErrorKind::InvalidEnvelope,
                            "token response is missing access_token",
                        )
                        .with_correlation_id(Some(ctx.correlation_id.clone()))
                    })?;
                let expires_in = data
                    .get("expires_in")
                    .and_then(Value::as_u64)
                    .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

                Ok((token.to_string(), expires_in))
            })
            .await
    }
}
