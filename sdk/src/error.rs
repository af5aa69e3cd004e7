// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Typed errors for the OMEGA SDK.
//!
//! All failures surface as a single [`OmegaError`] carrying a stable error
//! code, a structured details map, a retryability flag, and the correlation
//! and request identifiers of the originating call when available. The
//! `kind` field is the tagged classification used by the retry policy and by
//! callers that match on failure classes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification of an SDK failure.
///
/// Each kind maps to exactly one stable wire code (see [`ErrorKind::code`]).
/// Kinds prefixed with payload/tool are detected locally before any network
/// I/O and are never retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationFailed,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    RateLimited,
    Timeout,
    Internal,
    Upstream,
    PayloadTooLarge,
    PayloadTooDeep,
    ToolNotAllowed,
    InvalidResponse,
    InvalidEnvelope,
    Http,
}

impl ErrorKind {
    /// Stable error code surfaced to callers.
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::Upstream => "UPSTREAM_ERROR",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::PayloadTooDeep => "PAYLOAD_TOO_DEEP",
            ErrorKind::ToolNotAllowed => "TOOL_NOT_ALLOWED",
            ErrorKind::InvalidResponse => "INVALID_RESPONSE",
            ErrorKind::InvalidEnvelope => "INVALID_ENVELOPE",
            ErrorKind::Http => "HTTP_ERROR",
        }
    }

    /// Map an HTTP status code to an error kind.
    ///
    /// Statuses outside the table fall back to [`ErrorKind::Http`] at the
    /// call site.
    pub const fn from_status(status: u16) -> Option<ErrorKind> {
        match status {
            400 => Some(ErrorKind::ValidationFailed),
            401 => Some(ErrorKind::Unauthenticated),
            403 => Some(ErrorKind::Forbidden),
            404 => Some(ErrorKind::NotFound),
            408 => Some(ErrorKind::Timeout),
            409 => Some(ErrorKind::Conflict),
            429 => Some(ErrorKind::RateLimited),
            500 => Some(ErrorKind::Internal),
            502 | 503 => Some(ErrorKind::Upstream),
            504 => Some(ErrorKind::Timeout),
            _ => None,
        }
    }

    /// Default retryability for this kind, applied when the response envelope
    /// carries no explicit `retryable` flag.
    pub const fn default_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::RateLimited | ErrorKind::Upstream
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The single error type surfaced by every SDK operation.
#[derive(Debug, Clone)]
pub struct OmegaError {
    /// Tagged failure classification.
    pub kind: ErrorKind,
    /// Stable error code. Usually `kind.code()`, but server-supplied codes
    /// pass through verbatim so custom codes are not lost.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured error details from the response envelope or the local
    /// check that raised the error.
    pub details: Map<String, Value>,
    /// Whether the retry policy may re-execute the failed operation.
    pub retryable: bool,
    /// Canonical correlation identifier of the logical call, when known.
    pub correlation_id: Option<String>,
    /// Federation Core request identifier, when known.
    pub request_id: Option<String>,
}

impl OmegaError {
    /// Create an error with the kind's stable code and default retryability.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code().to_string(),
            message: message.into(),
            details: Map::new(),
            retryable: kind.default_retryable(),
            correlation_id: None,
            request_id: None,
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Option<String>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

impl fmt::Display for OmegaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(correlation_id) = &self.correlation_id {
            write!(f, " (correlation_id={})", correlation_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id={})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for OmegaError {}

/// Result alias used across the SDK.
pub type Result<T> = std::result::Result<T, OmegaError>;
