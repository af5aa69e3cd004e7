// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Governance workflow operations.
//!
//! Starting runs, reading run state and logs, resolving approval gates, and
//! an optional poll-until-terminal convenience loop. All operations go
//! through the enveloped gateway like every other namespace; the correlation
//! id stays stable across the polls of one wait.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::{resolve_context, CallOptions};
use crate::config::OmegaConfig;
use crate::error::{ErrorKind, OmegaError};
use crate::gateway::FederationGateway;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2_000);
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(600_000);

/// Workflow run execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowRunStatus {
    Pending,
    Running,
    /// Waiting for gate approval.
    Paused,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl WorkflowRunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowRunStatus::Completed | WorkflowRunStatus::Failed | WorkflowRunStatus::Cancelled
        )
    }
}

/// Approval gate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
    Bypassed,
    #[serde(other)]
    Unknown,
}

/// Resolution for a pending gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Approve,
    Deny,
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Approve => "approve",
            GateDecision::Deny => "deny",
        }
    }
}

/// Information about a workflow gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateInfo {
    pub gate_id: String,
    pub run_id: String,
    #[serde(default)]
    pub step_id: String,
    /// Gate type: human_approval, policy_check, timeout.
    #[serde(default)]
    pub gate_type: String,
    #[serde(default)]
    pub gate_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: GateStatus,
    #[serde(default)]
    pub required_approvers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_pack_hash: Option<String>,
}

/// A log entry for workflow run execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunLogEntry {
    pub log_id: String,
    pub run_id: String,
    /// FC event type code (e.g. FC-RUN-001).
    pub event_type: String,
    #[serde(default = "default_event_category")]
    pub event_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
    #[serde(default)]
    pub actor_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_hash: Option<String>,
}

fn default_event_category() -> String {
    "workflow".to_string()
}

fn default_workflow_version() -> String {
    "1.0.0".to_string()
}

/// Options for starting a workflow run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRunOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<String>,
}

/// State of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunResult {
    pub run_id: String,
    pub workflow_id: String,
    #[serde(default = "default_workflow_version")]
    pub workflow_version: String,
    pub status: WorkflowRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default)]
    pub step_index: u32,

    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub actor_id: String,
    #[serde(default)]
    pub correlation_id: String,

    #[serde(default)]
    pub input_payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_payload: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Map<String, Value>>,

    #[serde(default)]
    pub receipt_chain: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_receipt_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_pack_hash: Option<String>,
    #[serde(default)]
    pub evidence_pack_refs: Vec<String>,

    #[serde(default)]
    pub gates: Vec<GateInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub logs: Vec<WorkflowRunLogEntry>,
}

impl WorkflowRunResult {
    /// First pending gate when the run is paused for approval.
    pub fn pending_gate(&self) -> Option<&GateInfo> {
        if self.status != WorkflowRunStatus::Paused {
            return None;
        }
        self.gates.iter().find(|g| g.status == GateStatus::Pending)
    }
}

/// Request for workflow artifact registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRegisterRequest {
    pub workflow_yaml: String,
    pub prompts_poml: String,
    #[serde(default)]
    pub schemas: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Workflow registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRegisterResult {
    pub workflow_id: String,
    pub version: String,
    #[serde(default)]
    pub artifact_hashes: Map<String, Value>,
    #[serde(default)]
    pub idempotent: bool,
}

/// The document shape FC returns for run operations:
/// `{run: {...}, logs: [...], gates: [...]}`, or a flat run object.
#[derive(Debug, Deserialize)]
struct RunDocument {
    #[serde(default)]
    run: Option<Value>,
    #[serde(default)]
    logs: Vec<WorkflowRunLogEntry>,
    #[serde(default)]
    gates: Vec<GateInfo>,
}

fn parse_run_document(
    data: Value,
    fallback_correlation_id: &str,
) -> Result<WorkflowRunResult, OmegaError> {
    let document: RunDocument = serde_json::from_value(data.clone()).map_err(|e| {
        OmegaError::new(
            ErrorKind::InvalidEnvelope,
            format!("failed to parse workflow run document: {}", e),
        )
    })?;

    let run_value = document.run.unwrap_or(data);
    let mut run: WorkflowRunResult = serde_json::from_value(run_value).map_err(|e| {
        OmegaError::new(
            ErrorKind::InvalidEnvelope,
            format!("failed to parse workflow run: {}", e),
        )
    })?;

    if run.correlation_id.is_empty() {
        run.correlation_id = fallback_correlation_id.to_string();
    }
    if run.logs.is_empty() {
        run.logs = document.logs;
    }
    if run.gates.is_empty() {
        run.gates = document.gates;
    }

    Ok(run)
}

/// Workflows API namespace.
pub struct WorkflowsNamespace<'a> {
    pub(crate) gateway: &'a FederationGateway,
    pub(crate) config: &'a OmegaConfig,
}

impl WorkflowsNamespace<'_> {
    /// Start a new workflow run.
    pub async fn run_workflow(
        &self,
        workflow_id: &str,
        inputs: Map<String, Value>,
        options: Option<WorkflowRunOptions>,
        opts: CallOptions,
    ) -> Result<WorkflowRunResult, OmegaError> {
        let mut ctx = resolve_context(self.config, &opts)?;
        ctx.idempotency_key = Some(uuid::Uuid::new_v4().to_string());

        let mut body = json!({
            "workflow_id": workflow_id,
            "input_payload": inputs,
        });
        if let Some(options) = options {
            let object = body.as_object_mut().expect("body is an object");
            if let Some(metadata) = options.metadata {
                object.insert("metadata".to_string(), Value::Object(metadata));
            }
            if let Some(tags) = options.tags {
                object.insert("tags".to_string(), json!(tags));
            }
            if let Some(parent_run_id) = options.parent_run_id {
                object.insert("parent_run_id".to_string(), json!(parent_run_id));
            }
        }

        let data = self.gateway.post("/runs", &ctx, &body, None).await?;
        let run = parse_run_document(data, &ctx.correlation_id)?;

        tracing::info!(
            run_id = %run.run_id,
            workflow_id,
            status = ?run.status,
            "workflow run started"
        );
        Ok(run)
    }

    /// Get workflow run details.
    pub async fn get_run(
        &self,
        run_id: &str,
        include_logs: bool,
        include_gates: bool,
        opts: CallOptions,
    ) -> Result<WorkflowRunResult, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;

        let mut params = Vec::new();
        if include_logs {
            params.push(("include_logs", "true".to_string()));
        }
        if include_gates {
            params.push(("include_gates", "true".to_string()));
        }

        let data = self
            .gateway
            .get(&format!("/runs/{}", run_id), &ctx, &params)
            .await?;
        parse_run_document(data, &ctx.correlation_id)
    }

    /// Get logs for a workflow run.
    pub async fn get_run_logs(
        &self,
        run_id: &str,
        event_type: Option<&str>,
        limit: u32,
        offset: u32,
        opts: CallOptions,
    ) -> Result<Vec<WorkflowRunLogEntry>, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;

        let mut params = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(event_type) = event_type {
            params.push(("event_type", event_type.to_string()));
        }

        let data = self
            .gateway
            .get(&format!("/runs/{}/logs", run_id), &ctx, &params)
            .await?;

        match data {
            Value::Array(_) => serde_json::from_value(data).map_err(|e| {
                OmegaError::new(
                    ErrorKind::InvalidEnvelope,
                    format!("failed to parse run logs: {}", e),
                )
            }),
            _ => Ok(Vec::new()),
        }
    }

    /// Resume a paused workflow run after gate resolution.
    pub async fn resume_run(
        &self,
        run_id: &str,
        gate_id: &str,
        decision: GateDecision,
        input: Option<Map<String, Value>>,
        decision_receipt_id: Option<&str>,
        opts: CallOptions,
    ) -> Result<WorkflowRunResult, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;

        let mut body = json!({
            "run_id": run_id,
            "gate_id": gate_id,
            "decision": decision.as_str(),
            "input": input.unwrap_or_default(),
        });
        if let Some(receipt_id) = decision_receipt_id {
            body.as_object_mut()
                .expect("body is an object")
                .insert("decision_receipt_id".to_string(), json!(receipt_id));
        }

        let data = self
            .gateway
            .post(&format!("/runs/{}:resume", run_id), &ctx, &body, None)
            .await?;
        let run = parse_run_document(data, &ctx.correlation_id)?;

        tracing::info!(
            run_id = %run.run_id,
            gate_id,
            decision = decision.as_str(),
            status = ?run.status,
            "workflow run resumed"
        );
        Ok(run)
    }

    /// Register workflow artifacts with Federation Core.
    pub async fn register(
        &self,
        request: &WorkflowRegisterRequest,
        opts: CallOptions,
    ) -> Result<WorkflowRegisterResult, OmegaError> {
        let mut ctx = resolve_context(self.config, &opts)?;
        ctx.idempotency_key = Some(uuid::Uuid::new_v4().to_string());

        let body = serde_json::to_value(request).map_err(|e| {
            OmegaError::new(
                ErrorKind::ValidationFailed,
                format!("failed to serialize register request: {}", e),
            )
        })?;

        let data = self
            .gateway
            .post("/workflows/register", &ctx, &body, None)
            .await?;
        serde_json::from_value(data).map_err(|e| {
            OmegaError::new(
                ErrorKind::InvalidEnvelope,
                format!("failed to parse register response: {}", e),
            )
        })
    }

    /// Poll until the run reaches a terminal state (completed, failed,
    /// cancelled) or pauses for gate approval.
    ///
    /// The same correlation id is used for every poll of one wait, so the
    /// whole sequence traces as one logical operation.
    pub async fn wait_for_completion(
        &self,
        run_id: &str,
        poll_interval: Duration,
        timeout: Duration,
        opts: CallOptions,
    ) -> Result<WorkflowRunResult, OmegaError> {
        let mut opts = opts;
        if opts.correlation_id.is_none() {
            // Pin one correlation id now so every poll reuses it.
            let ctx = resolve_context(self.config, &opts)?;
            opts.correlation_id = Some(ctx.correlation_id);
        }

        let mut elapsed = Duration::ZERO;
        loop {
            let run = self.get_run(run_id, false, true, opts.clone()).await?;

            if run.status.is_terminal() || run.status == WorkflowRunStatus::Paused {
                return Ok(run);
            }

            if elapsed >= timeout {
                break;
            }
            tokio::time::sleep(poll_interval).await;
            elapsed += poll_interval;
        }

        Err(OmegaError::new(
            ErrorKind::Timeout,
            format!(
                "workflow run {} did not complete within {}ms",
                run_id,
                timeout.as_millis()
            ),
        )
        .with_retryable(false)
        .with_correlation_id(opts.correlation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_status_terminality() {
        assert!(WorkflowRunStatus::Completed.is_terminal());
        assert!(WorkflowRunStatus::Failed.is_terminal());
        assert!(WorkflowRunStatus::Cancelled.is_terminal());
        assert!(!WorkflowRunStatus::Paused.is_terminal());
        assert!(!WorkflowRunStatus::Running.is_terminal());
        assert!(!WorkflowRunStatus::Pending.is_terminal());
    }

    #[test]
    fn test_parse_nested_run_document() {
        let data = json!({
            "run": {
                "run_id": "run-1",
                "workflow_id": "council-of-titans",
                "status": "paused",
                "tenant_id": "acme",
                "actor_id": "clint"
            },
            "gates": [{
                "gate_id": "gate-1",
                "run_id": "run-1",
                "step_id": "step-2",
                "gate_type": "human_approval",
                "gate_name": "Launch approval",
                "status": "pending"
            }],
            "logs": []
        });

        let run = parse_run_document(data, "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789")
            .unwrap();
        assert_eq!(run.run_id, "run-1");
        assert_eq!(run.status, WorkflowRunStatus::Paused);
        assert_eq!(run.workflow_version, "1.0.0");
        assert_eq!(
            run.correlation_id,
            "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789"
        );

        let gate = run.pending_gate().unwrap();
        assert_eq!(gate.gate_id, "gate-1");
        assert_eq!(gate.status, GateStatus::Pending);
    }

    #[test]
    fn test_parse_flat_run_document() {
        let data = json!({
            "run_id": "run-2",
            "workflow_id": "brand-campaign",
            "status": "completed",
            "correlation_id": "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789",
            "output_payload": {"result": "done"}
        });

        let run = parse_run_document(data, "t:x|c:0194f0b0-1234-7890-abcd-ef0123456789").unwrap();
        assert_eq!(run.run_id, "run-2");
        assert_eq!(run.status, WorkflowRunStatus::Completed);
        // The run's own correlation id wins over the fallback.
        assert!(run.correlation_id.starts_with("t:acme|"));
        assert!(run.pending_gate().is_none());
    }

    #[test]
    fn test_unknown_statuses_parse_leniently() {
        let status: WorkflowRunStatus = serde_json::from_value(json!("archived")).unwrap();
        assert_eq!(status, WorkflowRunStatus::Unknown);
        let status: GateStatus = serde_json::from_value(json!("escalated")).unwrap();
        assert_eq!(status, GateStatus::Unknown);
    }
}
