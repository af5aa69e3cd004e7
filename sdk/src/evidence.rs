// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Evidence pack DTOs.
//!
//! Read-only mirror of the canonical evidence structure served under
//! `/compliance/evidence-packs`. The wire format uses PascalCase field names
//! and integer discriminants for the enum vocabularies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical status vocabulary for evidence packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidencePackStatus {
    Unsigned,
    Signed,
    Invalid,
    Tampered,
    BlobMissing,
}

/// Evidence classification. The wire carries bare integer discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EvidenceType {
    Observed,
    Derived,
    Asserted,
    Attested,
}

impl From<EvidenceType> for u8 {
    fn from(value: EvidenceType) -> Self {
        match value {
            EvidenceType::Observed => 0,
            EvidenceType::Derived => 1,
            EvidenceType::Asserted => 2,
            EvidenceType::Attested => 3,
        }
    }
}

impl TryFrom<u8> for EvidenceType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EvidenceType::Observed),
            1 => Ok(EvidenceType::Derived),
            2 => Ok(EvidenceType::Asserted),
            3 => Ok(EvidenceType::Attested),
            other => Err(format!("invalid EvidenceType discriminant: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OperationOutcome {
    Completed,
    Denied,
    Expired,
    Pending,
    Aborted,
}

impl From<OperationOutcome> for u8 {
    fn from(value: OperationOutcome) -> Self {
        match value {
            OperationOutcome::Completed => 0,
            OperationOutcome::Denied => 1,
            OperationOutcome::Expired => 2,
            OperationOutcome::Pending => 3,
            OperationOutcome::Aborted => 4,
        }
    }
}

impl TryFrom<u8> for OperationOutcome {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OperationOutcome::Completed),
            1 => Ok(OperationOutcome::Denied),
            2 => Ok(OperationOutcome::Expired),
            3 => Ok(OperationOutcome::Pending),
            4 => Ok(OperationOutcome::Aborted),
            other => Err(format!("invalid OperationOutcome discriminant: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExpiryBehavior {
    Abort,
    CompleteAndFlag,
    MarkInvalid,
}

impl From<ExpiryBehavior> for u8 {
    fn from(value: ExpiryBehavior) -> Self {
        match value {
            ExpiryBehavior::Abort => 0,
            ExpiryBehavior::CompleteAndFlag => 1,
            ExpiryBehavior::MarkInvalid => 2,
        }
    }
}

impl TryFrom<u8> for ExpiryBehavior {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ExpiryBehavior::Abort),
            1 => Ok(ExpiryBehavior::CompleteAndFlag),
            2 => Ok(ExpiryBehavior::MarkInvalid),
            other => Err(format!("invalid ExpiryBehavior discriminant: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExternalReference {
    pub ref_type: String,
    pub ref_id: String,
    pub ref_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntegrityScope {
    pub signed_payload_hash: String,
    pub hash_algorithm: String,
    pub included_sections: Vec<String>,
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,
    #[serde(default)]
    pub signature_exclusions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IdentitySection {
    pub evidence_type: EvidenceType,
    pub tenant_id: String,
    pub actor_id: String,
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperationSection {
    pub evidence_type: EvidenceType,
    pub op_type: String,
    pub op_id: String,
    pub requested_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub outcome: OperationOutcome,
    pub outcome_reason: String,
    pub target_shard_key: String,
    pub request_payload_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Obligation {
    pub obligation_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlphaReceipt {
    pub receipt_id: String,
    pub policy_ref: String,
    #[serde(default)]
    pub policy_snapshot: Map<String, Value>,
    pub certified: bool,
    pub reason_code: String,
    #[serde(default)]
    pub obligations: Vec<Obligation>,
    pub audit_flags: i64,
    pub issued_at: String,
    pub valid_from: String,
    pub valid_until: String,
    pub expiry_behavior: ExpiryBehavior,
    pub signature: String,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthoritySection {
    pub evidence_type: EvidenceType,
    pub alpha_receipt: AlphaReceipt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateSection {
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub before_state: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_state: Option<Map<String, Value>>,
    pub delta_hash: String,
    pub state_snapshot_version: String,
}

/// Full evidence pack as returned by the detail endpoint.
///
/// Sections past `State` (execution, compliance, verification) are carried as
/// raw values; the SDK treats the pack as an opaque, read-only record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemoryEvidencePack {
    pub pack_id: String,
    pub pack_version: String,
    pub canon_version: String,
    pub sealed_at: String,
    pub status: EvidencePackStatus,
    pub integrity_scope: IntegrityScope,
    pub identity: IdentitySection,
    pub operation: OperationSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<AuthoritySection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Value>,
}

/// Summary metadata row on the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvidencePackMetadata {
    pub pack_id: String,
    pub tenant_id: String,
    pub correlation_id: String,
    pub name: String,
    pub created_at_utc: String,
    pub artifact_count: u64,
    pub status: EvidencePackStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidencePackListResponse {
    #[serde(default)]
    pub items: Vec<EvidencePackMetadata>,
}

/// Factual result of an evidence verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvidenceVerificationResult {
    pub is_valid: bool,
    pub verdict: String,
    pub pack_hash: String,
    pub timestamp: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pack_metadata_wire_aliases() {
        let metadata: EvidencePackMetadata = serde_json::from_value(json!({
            "PackId": "pk_1",
            "TenantId": "acme",
            "CorrelationId": "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789",
            "Name": "Evidence Pack 1",
            "CreatedAtUtc": "2026-01-24T00:00:00Z",
            "ArtifactCount": 12,
            "Status": "signed"
        }))
        .unwrap();

        assert_eq!(metadata.pack_id, "pk_1");
        assert_eq!(metadata.status, EvidencePackStatus::Signed);
        assert_eq!(metadata.artifact_count, 12);
    }

    #[test]
    fn test_status_vocabulary() {
        for (text, status) in [
            ("unsigned", EvidencePackStatus::Unsigned),
            ("signed", EvidencePackStatus::Signed),
            ("invalid", EvidencePackStatus::Invalid),
            ("tampered", EvidencePackStatus::Tampered),
            ("blob_missing", EvidencePackStatus::BlobMissing),
        ] {
            let parsed: EvidencePackStatus =
                serde_json::from_value(json!(text)).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_evidence_type_integer_discriminants() {
        let parsed: EvidenceType = serde_json::from_value(json!(0)).unwrap();
        assert_eq!(parsed, EvidenceType::Observed);
        let parsed: OperationOutcome = serde_json::from_value(json!(1)).unwrap();
        assert_eq!(parsed, OperationOutcome::Denied);
    }
}
