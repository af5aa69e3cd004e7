// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Canonical correlation identity.
//!
//! Every Federation Core call is traced by a correlation identifier in the
//! canonical form `t:<tenant>|c:<uuid>`. The identifier segment is a UUIDv7,
//! so identifiers created by the same process sort by creation time without a
//! separate timestamp field.
//!
//! One identifier is created per logical operation and stays stable across
//! that operation's retries and polls.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorKind, OmegaError};

static CORRELATION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^t:([^|]+)\|c:([0-9a-fA-F-]{36})$").expect("correlation pattern is valid")
});

/// Errors raised by correlation-identity construction and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    #[error("tenant id cannot be empty")]
    EmptyTenant,
    #[error("tenant id cannot contain '|': {0}")]
    TenantContainsPipe(String),
    #[error("invalid correlation id format, expected 't:<tenant>|c:<uuid>': {0}")]
    InvalidFormat(String),
    #[error("invalid UUID in correlation id: {0}")]
    InvalidUuid(String),
}

impl From<CorrelationError> for OmegaError {
    fn from(err: CorrelationError) -> Self {
        OmegaError::new(ErrorKind::ValidationFailed, err.to_string())
    }
}

/// Correlation identity binding all events of one logical operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CorrelationId {
    tenant: String,
    id: Uuid,
}

impl CorrelationId {
    /// Create a fresh correlation identity for `tenant`.
    ///
    /// The identifier segment is a UUIDv7: globally unique and monotonically
    /// increasing for rapid same-process calls.
    pub fn generate(tenant: &str) -> Result<Self, CorrelationError> {
        if tenant.contains('|') {
            return Err(CorrelationError::TenantContainsPipe(tenant.to_string()));
        }
        if tenant.trim().is_empty() {
            return Err(CorrelationError::EmptyTenant);
        }

        Ok(Self {
            tenant: tenant.to_string(),
            id: Uuid::now_v7(),
        })
    }

    /// Validate and parse a correlation id from its canonical text form.
    pub fn parse(text: &str) -> Result<Self, CorrelationError> {
        let captures = CORRELATION_ID_PATTERN
            .captures(text)
            .ok_or_else(|| CorrelationError::InvalidFormat(text.to_string()))?;

        let tenant = captures[1].to_string();
        let uuid_text = &captures[2];
        let id = Uuid::parse_str(uuid_text)
            .map_err(|_| CorrelationError::InvalidUuid(uuid_text.to_string()))?;

        Ok(Self { tenant, id })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn uuid(&self) -> Uuid {
        self.id
    }

    /// Creation time in milliseconds since the Unix epoch, when the
    /// identifier segment is a UUIDv7.
    pub fn timestamp_ms(&self) -> Option<u64> {
        let bytes = self.id.as_bytes();
        if (bytes[6] >> 4) != 7 {
            return None;
        }
        Some(
            ((bytes[0] as u64) << 40)
                | ((bytes[1] as u64) << 32)
                | ((bytes[2] as u64) << 24)
                | ((bytes[3] as u64) << 16)
                | ((bytes[4] as u64) << 8)
                | (bytes[5] as u64),
        )
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Uuid's Display is lowercase hyphenated, which is the canonical form.
        write!(f, "t:{}|c:{}", self.tenant, self.id)
    }
}

impl TryFrom<String> for CorrelationId {
    type Error = CorrelationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CorrelationId> for String {
    fn from(id: CorrelationId) -> Self {
        id.to_string()
    }
}

/// Validate a correlation id and re-serialize it in canonical form.
///
/// The identifier segment is lowercased; the operation is idempotent.
pub fn normalize_correlation_id(text: &str) -> Result<String, CorrelationError> {
    CorrelationId::parse(text).map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_roundtrip() {
        let id = CorrelationId::generate("acme").unwrap();
        let text = id.to_string();
        assert!(text.starts_with("t:acme|c:"));

        let parsed = CorrelationId::parse(&text).unwrap();
        assert_eq!(parsed.tenant(), "acme");
        assert_eq!(parsed.uuid(), id.uuid());
    }

    #[test]
    fn test_generate_rejects_empty_tenant() {
        assert_eq!(CorrelationId::generate(""), Err(CorrelationError::EmptyTenant));
        assert_eq!(CorrelationId::generate("   "), Err(CorrelationError::EmptyTenant));
    }

    #[test]
    fn test_generate_rejects_pipe_in_tenant() {
        assert!(matches!(
            CorrelationId::generate("a|b"),
            Err(CorrelationError::TenantContainsPipe(_))
        ));
    }

    #[test]
    fn test_parse_valid() {
        let parsed =
            CorrelationId::parse("t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789").unwrap();
        assert_eq!(parsed.tenant(), "acme");
        assert_eq!(
            parsed.uuid().to_string(),
            "0194f0b0-1234-7890-abcd-ef0123456789"
        );
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        for text in ["invalid", "t:acme", "c:0194f0b0-1234-7890-abcd-ef0123456789"] {
            assert!(matches!(
                CorrelationId::parse(text),
                Err(CorrelationError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_parse_rejects_bad_uuid() {
        // 36 chars of pattern-legal bytes that are not a UUID.
        let text = "t:acme|c:zzzz0b0-1234-7890-abcd-ef0123456789";
        assert!(matches!(
            CorrelationId::parse(text),
            Err(CorrelationError::InvalidFormat(_) | CorrelationError::InvalidUuid(_))
        ));
    }

    #[test]
    fn test_normalize_lowercases_uuid() {
        let normalized =
            normalize_correlation_id("t:acme|c:0194F0B0-1234-7890-ABCD-EF0123456789").unwrap();
        assert_eq!(normalized, "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once =
            normalize_correlation_id("t:acme|c:0194F0B0-1234-7890-ABCD-EF0123456789").unwrap();
        let twice = normalize_correlation_id(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_generated_ids_are_time_ordered() {
        let first = CorrelationId::generate("acme").unwrap();
        let second = CorrelationId::generate("acme").unwrap();
        assert!(first.uuid() <= second.uuid());
        assert!(first.timestamp_ms().is_some());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = CorrelationId::generate("acme").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let back: CorrelationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
