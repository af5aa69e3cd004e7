// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Main OMEGA SDK client.
//!
//! [`OmegaClient`] provides a typed interface to the Federation Core API
//! with automatic correlation-id management, structured error handling and
//! retry for transient failures. Operations are grouped into per-resource
//! namespaces:
//!
//! ```no_run
//! use omega_sdk::{OmegaClient, CallOptions};
//!
//! # async fn example() -> omega_sdk::Result<()> {
//! let client = OmegaClient::from_env()?;
//! let tools = client.tools().list(Default::default(), CallOptions::default()).await?;
//! for tool in tools.items {
//!     println!("{}: {}", tool.tool_id, tool.description.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::OmegaConfig;
use crate::correlation::CorrelationId;
use crate::error::{ErrorKind, OmegaError};
use crate::gateway::{CallContext, FederationGateway};
use crate::types::{
    Agent, AgentListResponse, HealthStatus, StatusResponse, Task, TaskCreateRequest,
    TaskCreateResponse, TaskContext, TaskGovernance, TaskRouting, Tool, ToolInvokeContext,
    ToolInvokeOptions, ToolInvokeRequest, ToolInvokeResult, ToolListResponse,
};
use crate::evidence::{
    EvidencePackListResponse, EvidenceVerificationResult, MemoryEvidencePack,
};
use crate::workflows::WorkflowsNamespace;

/// Per-call identity overrides. Unset fields default from the client
/// configuration; an unset correlation id is freshly generated for the call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub correlation_id: Option<String>,
}

impl CallOptions {
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Resolve the identity context for one logical call.
pub(crate) fn resolve_context(
    config: &OmegaConfig,
    opts: &CallOptions,
) -> Result<CallContext, OmegaError> {
    let tenant_id = opts
        .tenant_id
        .clone()
        .or_else(|| config.tenant_id.clone())
        .unwrap_or_default();
    let actor_id = opts
        .actor_id
        .clone()
        .or_else(|| config.actor_id.clone())
        .unwrap_or_default();
    let correlation_id = match &opts.correlation_id {
        Some(correlation_id) => correlation_id.clone(),
        None => CorrelationId::generate(&tenant_id)?.to_string(),
    };

    Ok(CallContext {
        tenant_id,
        actor_id,
        correlation_id,
        idempotency_key: None,
        decision_receipt_id: None,
    })
}

fn parse_data<T: serde::de::DeserializeOwned>(
    data: Value,
    what: &str,
    ctx: &CallContext,
) -> Result<T, OmegaError> {
    serde_json::from_value(data).map_err(|e| {
        OmegaError::new(
            ErrorKind::InvalidEnvelope,
            format!("failed to parse {}: {}", what, e),
        )
        .with_correlation_id(Some(ctx.correlation_id.clone()))
    })
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Filters for tool listing.
#[derive(Debug, Clone, Default)]
pub struct ToolListParams {
    pub capability: Option<String>,
    pub agent_id: Option<String>,
    pub tag: Option<String>,
    /// Page limit; the server default is 50, max 200.
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Per-invocation options.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    pub decision_receipt_id: Option<String>,
    pub timeout_ms: Option<u64>,
    pub stream: bool,
    pub tags: Option<Vec<String>>,
}

/// Tools API namespace.
pub struct ToolsNamespace<'a> {
    gateway: &'a FederationGateway,
    config: &'a OmegaConfig,
}

impl ToolsNamespace<'_> {
    /// List available tools.
    pub async fn list(
        &self,
        params: ToolListParams,
        opts: CallOptions,
    ) -> Result<ToolListResponse, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;

        let mut query = vec![("limit", params.limit.unwrap_or(50).to_string())];
        if let Some(capability) = params.capability {
            query.push(("capability", capability));
        }
        if let Some(agent_id) = params.agent_id {
            query.push(("agent_id", agent_id));
        }
        if let Some(tag) = params.tag {
            query.push(("tag", tag));
        }
        if let Some(cursor) = params.cursor {
            query.push(("cursor", cursor));
        }

        let data = self.gateway.get("/tools", &ctx, &query).await?;
        parse_data(data, "tool list", &ctx)
    }

    /// Get tool details.
    pub async fn get(&self, tool_id: &str, opts: CallOptions) -> Result<Tool, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;
        let data = self
            .gateway
            .get(&format!("/tools/{}", tool_id), &ctx, &[])
            .await?;
        parse_data(data, "tool", &ctx)
    }

    /// Invoke a tool.
    ///
    /// A fresh idempotency key makes server-side retry re-execution safe.
    pub async fn invoke(
        &self,
        tool_id: &str,
        input: Value,
        invoke_options: InvokeOptions,
        opts: CallOptions,
    ) -> Result<ToolInvokeResult, OmegaError> {
        let mut ctx = resolve_context(self.config, &opts)?;
        ctx.idempotency_key = Some(Uuid::new_v4().to_string());
        ctx.decision_receipt_id = invoke_options.decision_receipt_id.clone();

        let request = ToolInvokeRequest {
            input,
            options: ToolInvokeOptions {
                timeout_ms: invoke_options.timeout_ms,
                stream: invoke_options.stream,
            },
            context: ToolInvokeContext {
                tenant_id: ctx.tenant_id.clone(),
                actor_id: ctx.actor_id.clone(),
                correlation_id: ctx.correlation_id.clone(),
                decision_receipt_id: invoke_options.decision_receipt_id,
                tags: invoke_options.tags,
            },
        };
        let body = serde_json::to_value(&request).map_err(|e| {
            OmegaError::new(
                ErrorKind::ValidationFailed,
                format!("failed to serialize invoke request: {}", e),
            )
        })?;

        let data = self
            .gateway
            .post(&format!("/tools/{}:invoke", tool_id), &ctx, &body, None)
            .await?;

        tracing::info!(tool_id, correlation_id = %ctx.correlation_id, "tool invoked");
        parse_data(data, "invoke result", &ctx)
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Filters for agent listing.
#[derive(Debug, Clone, Default)]
pub struct AgentListParams {
    /// Agent kind: titan, agent, tool.
    pub kind: Option<String>,
    pub capability: Option<String>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Agents API namespace.
pub struct AgentsNamespace<'a> {
    gateway: &'a FederationGateway,
    config: &'a OmegaConfig,
}

impl AgentsNamespace<'_> {
    /// List registered agents.
    pub async fn list(
        &self,
        params: AgentListParams,
        opts: CallOptions,
    ) -> Result<AgentListResponse, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;

        let mut query = vec![("limit", params.limit.unwrap_or(50).to_string())];
        if let Some(kind) = params.kind {
            query.push(("kind", kind));
        }
        if let Some(capability) = params.capability {
            query.push(("capability", capability));
        }
        if let Some(cursor) = params.cursor {
            query.push(("cursor", cursor));
        }

        let data = self.gateway.get("/agents", &ctx, &query).await?;
        parse_data(data, "agent list", &ctx)
    }

    /// Get agent details.
    pub async fn get(&self, agent_id: &str, opts: CallOptions) -> Result<Agent, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;
        let data = self
            .gateway
            .get(&format!("/agents/{}", agent_id), &ctx, &[])
            .await?;
        parse_data(data, "agent", &ctx)
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Tasks API namespace.
pub struct TasksNamespace<'a> {
    gateway: &'a FederationGateway,
    config: &'a OmegaConfig,
}

impl TasksNamespace<'_> {
    /// Create (spawn) an asynchronous task.
    pub async fn create(
        &self,
        task_type: &str,
        input: Value,
        routing: Option<TaskRouting>,
        governance: Option<TaskGovernance>,
        opts: CallOptions,
    ) -> Result<TaskCreateResponse, OmegaError> {
        let mut ctx = resolve_context(self.config, &opts)?;
        ctx.idempotency_key = Some(Uuid::new_v4().to_string());

        let request = TaskCreateRequest {
            task_type: task_type.to_string(),
            input,
            routing,
            governance,
            context: TaskContext {
                tenant_id: ctx.tenant_id.clone(),
                actor_id: ctx.actor_id.clone(),
                correlation_id: ctx.correlation_id.clone(),
            },
        };
        let body = serde_json::to_value(&request).map_err(|e| {
            OmegaError::new(
                ErrorKind::ValidationFailed,
                format!("failed to serialize task request: {}", e),
            )
        })?;

        let data = self.gateway.post("/tasks", &ctx, &body, None).await?;

        tracing::info!(task_type, correlation_id = %ctx.correlation_id, "task created");
        parse_data(data, "task creation", &ctx)
    }

    /// Get task status and result.
    pub async fn get(&self, task_id: &str, opts: CallOptions) -> Result<Task, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;
        let data = self
            .gateway
            .get(&format!("/tasks/{}", task_id), &ctx, &[])
            .await?;
        parse_data(data, "task", &ctx)
    }
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Evidence API namespace.
pub struct EvidenceNamespace<'a> {
    gateway: &'a FederationGateway,
    config: &'a OmegaConfig,
}

impl EvidenceNamespace<'_> {
    /// List evidence packs.
    pub async fn list(
        &self,
        limit: Option<u32>,
        cursor: Option<String>,
        opts: CallOptions,
    ) -> Result<EvidencePackListResponse, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;

        let mut query = vec![
            ("limit", limit.unwrap_or(50).to_string()),
            ("correlation_id", ctx.correlation_id.clone()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let data = self
            .gateway
            .get("/compliance/evidence-packs", &ctx, &query)
            .await?;
        parse_data(data, "evidence pack list", &ctx)
    }

    /// Get evidence pack details.
    pub async fn get(
        &self,
        pack_hash: &str,
        opts: CallOptions,
    ) -> Result<MemoryEvidencePack, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;
        let data = self
            .gateway
            .get(&format!("/compliance/evidence-packs/{}", pack_hash), &ctx, &[])
            .await?;
        parse_data(data, "evidence pack", &ctx)
    }

    /// Verify an evidence pack.
    pub async fn verify(
        &self,
        pack_hash: &str,
        opts: CallOptions,
    ) -> Result<EvidenceVerificationResult, OmegaError> {
        let ctx = resolve_context(self.config, &opts)?;
        let data = self
            .gateway
            .post(
                &format!("/compliance/evidence-packs/{}:verify", pack_hash),
                &ctx,
                &json!({}),
                None,
            )
            .await?;
        parse_data(data, "verification result", &ctx)
    }
}

// ---------------------------------------------------------------------------
// Client facade
// ---------------------------------------------------------------------------

/// Main OMEGA SDK client.
pub struct OmegaClient {
    config: OmegaConfig,
    gateway: FederationGateway,
}

impl OmegaClient {
    pub fn new(config: OmegaConfig) -> Result<Self, OmegaError> {
        let gateway = FederationGateway::new(config.clone())?;
        Ok(Self { config, gateway })
    }

    /// Create a client from `OMEGA_*` environment variables.
    pub fn from_env() -> Result<Self, OmegaError> {
        Self::new(OmegaConfig::from_env())
    }

    pub fn config(&self) -> &OmegaConfig {
        &self.config
    }

    pub fn tools(&self) -> ToolsNamespace<'_> {
        ToolsNamespace {
            gateway: &self.gateway,
            config: &self.config,
        }
    }

    pub fn agents(&self) -> AgentsNamespace<'_> {
        AgentsNamespace {
            gateway: &self.gateway,
            config: &self.config,
        }
    }

    pub fn tasks(&self) -> TasksNamespace<'_> {
        TasksNamespace {
            gateway: &self.gateway,
            config: &self.config,
        }
    }

    pub fn evidence(&self) -> EvidenceNamespace<'_> {
        EvidenceNamespace {
            gateway: &self.gateway,
            config: &self.config,
        }
    }

    pub fn workflows(&self) -> WorkflowsNamespace<'_> {
        WorkflowsNamespace {
            gateway: &self.gateway,
            config: &self.config,
        }
    }

    /// Check Federation Core health.
    pub async fn health(&self) -> Result<HealthStatus, OmegaError> {
        let data = self.gateway.get_unauthenticated("/health").await?;
        serde_json::from_value(data).map_err(|e| {
            OmegaError::new(
                ErrorKind::InvalidEnvelope,
                format!("failed to parse health status: {}", e),
            )
        })
    }

    /// Get rich Federation Core status.
    pub async fn status(&self, opts: CallOptions) -> Result<StatusResponse, OmegaError> {
        let ctx = resolve_context(&self.config, &opts)?;
        let data = self.gateway.get("/status", &ctx, &[]).await?;
        parse_data(data, "status", &ctx)
    }
}
