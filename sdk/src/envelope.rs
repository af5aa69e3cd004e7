// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Response envelope protocol.
//!
//! Every Federation Core response is wrapped in a JSON envelope:
//!
//! ```json
//! {"ok": true, "data": {...}, "error": null,
//!  "meta": {"correlation_id": "...", "request_id": "...", "ts": "...",
//!           "sdk": {"name": "...", "version": "..."}}}
//! ```
//!
//! [`unwrap_envelope`] turns a raw status code + body into the `data` value
//! or a typed [`OmegaError`], carrying the envelope's correlation and request
//! identifiers forward on every failure path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, OmegaError};

/// Wire-level error descriptor inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    /// When present, overrides the status-derived retryability default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

/// SDK identity block inside envelope metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkIdentity {
    pub name: String,
    pub version: String,
}

/// Envelope metadata. Every field is optional; absence never fails parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, rename = "ts", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<SdkIdentity>,
}

/// The wire envelope. Exactly one of `data`/`error` is meaningful, selected
/// by `ok`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub meta: Meta,
}

/// Unwrap a raw response into its `data` value or a typed error.
///
/// Behavior:
/// - unparseable or non-object body → `INVALID_RESPONSE`;
/// - `status >= 400` or `ok == false` → typed error built from the body's
///   `error` object, or a synthesized `HTTP_ERROR` when it is absent;
/// - an object that does not match the envelope shape → `INVALID_ENVELOPE`;
/// - otherwise the `data` field (JSON `null` when absent).
pub fn unwrap_envelope(status: u16, body: &[u8]) -> Result<Value, OmegaError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        OmegaError::new(
            ErrorKind::InvalidResponse,
            format!("failed to parse JSON response: {}", e),
        )
    })?;

    let object = value.as_object().ok_or_else(|| {
        OmegaError::new(ErrorKind::InvalidResponse, "response is not a JSON object")
    })?;

    let meta = object.get("meta").and_then(Value::as_object);
    let correlation_id = meta
        .and_then(|m| m.get("correlation_id"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let request_id = meta
        .and_then(|m| m.get("request_id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let ok_flag = object.get("ok").and_then(Value::as_bool);

    if status >= 400 || ok_flag == Some(false) {
        let info = match object.get("error") {
            Some(raw) if !raw.is_null() => serde_json::from_value::<ErrorInfo>(raw.clone())
                .map_err(|e| {
                    OmegaError::new(
                        ErrorKind::InvalidEnvelope,
                        format!("failed to parse response envelope error: {}", e),
                    )
                    .with_correlation_id(correlation_id.clone())
                    .with_request_id(request_id.clone())
                })?,
            _ => ErrorInfo {
                code: "HTTP_ERROR".to_string(),
                message: format!("HTTP {} error", status),
                details: Map::new(),
                retryable: Some(status >= 500),
            },
        };

        return Err(error_from_response(info, status, correlation_id, request_id));
    }

    let envelope: Envelope = serde_json::from_value(value).map_err(|e| {
        OmegaError::new(
            ErrorKind::InvalidEnvelope,
            format!("failed to parse response envelope: {}", e),
        )
        .with_correlation_id(correlation_id)
        .with_request_id(request_id)
    })?;

    Ok(envelope.data.unwrap_or(Value::Null))
}

/// Build a typed error from a wire error descriptor and the response status.
///
/// The kind comes from the status table; statuses outside it fall back to
/// [`ErrorKind::Http`]. The descriptor's `retryable` flag, when present,
/// overrides the kind's default.
pub fn error_from_response(
    info: ErrorInfo,
    status: u16,
    correlation_id: Option<String>,
    request_id: Option<String>,
) -> OmegaError {
    let kind = ErrorKind::from_status(status).unwrap_or(ErrorKind::Http);
    let retryable = info.retryable.unwrap_or(kind.default_retryable());

    OmegaError {
        kind,
        code: info.code,
        message: info.message,
        details: info.details,
        retryable,
        correlation_id,
        request_id,
    }
}
