// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Resource DTOs for the Federation Core API.
//!
//! Plain structured records with no behavior; lenient on optional fields so
//! additive server changes never break deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pagination block on list responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub tool_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolListResponse {
    #[serde(default)]
    pub items: Vec<Tool>,
    #[serde(default)]
    pub page: Page,
}

/// Invocation options forwarded in the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolInvokeOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub stream: bool,
}

/// Caller identity threaded through the invocation body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeContext {
    pub tenant_id: String,
    pub actor_id: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_receipt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeRequest {
    pub input: Value,
    pub options: ToolInvokeOptions,
    pub context: ToolInvokeContext,
}

/// Audit block attached to invocation and task results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keon_receipt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_pack_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvokeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditInfo>,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub endpoints: Map<String, Value>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentListResponse {
    #[serde(default)]
    pub items: Vec<Agent>,
    #[serde(default)]
    pub page: Page,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditInfo>,
}

/// Routing directives for task placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRouting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Governance directives (receipt threading, policy tags).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGovernance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_receipt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    pub tenant_id: String,
    pub actor_id: String,
    pub correlation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreateRequest {
    pub task_type: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<TaskRouting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance: Option<TaskGovernance>,
    pub context: TaskContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreateResponse {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Health / status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn healthy(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dependencies: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_list_deserializes_registry_response() {
        let data = json!({
            "items": [{
                "tool_id": "csv_processor",
                "display_name": "CSV Processor",
                "description": "Parse and normalize CSVs",
                "agent_id": "genesis_forge",
                "schema_version": "v1",
                "input_schema": {},
                "output_schema": {},
                "tags": ["data", "csv"],
                "status": "ready"
            }],
            "page": {"limit": 50, "next_cursor": null}
        });

        let response: ToolListResponse = serde_json::from_value(data).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].tool_id, "csv_processor");
        assert_eq!(response.page.limit, Some(50));
        assert!(response.page.next_cursor.is_none());
    }

    #[test]
    fn test_task_status_is_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_unknown_task_status_does_not_fail() {
        let task: Task = serde_json::from_value(json!({
            "task_id": "tk_1",
            "status": "someday-new-state"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Unknown);
    }

    #[test]
    fn test_invoke_request_omits_absent_options() {
        let request = ToolInvokeRequest {
            input: json!({"file": "data.csv"}),
            options: ToolInvokeOptions::default(),
            context: ToolInvokeContext {
                tenant_id: "acme".to_string(),
                actor_id: "clint".to_string(),
                correlation_id: "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789".to_string(),
                decision_receipt_id: None,
                tags: None,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value["options"].get("timeout_ms").is_none());
        assert!(value["context"].get("decision_receipt_id").is_none());
    }

    #[test]
    fn test_health_status_helper() {
        let health: HealthStatus =
            serde_json::from_value(json!({"status": "ok", "version": "1.0.0", "uptime_s": 12345}))
                .unwrap();
        assert!(health.healthy());

        let unhealthy: HealthStatus =
            serde_json::from_value(json!({"status": "degraded"})).unwrap();
        assert!(!unhealthy.healthy());
    }
}
