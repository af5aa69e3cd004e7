// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! # OMEGA SDK
//!
//! Rust client for the OMEGA Federation Core API.
//!
//! The SDK enforces correlation discipline (`t:<tenant>|c:<uuid>` on every
//! call), unwraps the Federation Core response envelope into typed results,
//! retries transient failures with bounded exponential backoff, and signs
//! tool invocations with HMAC-SHA256 over a deterministic canonical payload.
//!
//! ```no_run
//! use omega_sdk::{CallOptions, OmegaClient};
//!
//! # async fn example() -> omega_sdk::Result<()> {
//! let client = OmegaClient::from_env()?;
//! let health = client.health().await?;
//! println!("Federation Core healthy: {}", health.healthy());
//!
//! let result = client
//!     .tools()
//!     .invoke(
//!         "csv_processor",
//!         serde_json::json!({"file": "data.csv"}),
//!         Default::default(),
//!         CallOptions::default(),
//!     )
//!     .await?;
//! println!("{}", result.result);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod correlation;
pub mod envelope;
pub mod error;
pub mod evidence;
pub mod federation;
pub mod gateway;
pub mod retry;
pub mod types;
pub mod workflows;

pub use client::{
    AgentListParams, CallOptions, InvokeOptions, OmegaClient, ToolListParams,
};
pub use config::{Environment, FederationOptions, OmegaConfig, SignatureMode};
pub use correlation::{normalize_correlation_id, CorrelationError, CorrelationId};
pub use envelope::{error_from_response, unwrap_envelope, Envelope, ErrorInfo, Meta, SdkIdentity};
pub use error::{ErrorKind, OmegaError, Result};
pub use federation::{
    canonicalize, FederationClient, PayloadValidator, SignedInvokeRequest, ToolDescriptor,
};
pub use gateway::{CallContext, FederationGateway};
pub use retry::{retry_with_policy, RetryPolicy};
pub use types::{
    Agent, AgentListResponse, HealthStatus, StatusResponse, Task, TaskStatus, Tool,
    ToolInvokeResult, ToolListResponse,
};
pub use workflows::{
    GateDecision, GateInfo, GateStatus, WorkflowRunLogEntry, WorkflowRunOptions,
    WorkflowRunResult, WorkflowRunStatus,
};
