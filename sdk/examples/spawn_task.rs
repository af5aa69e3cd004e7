// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Spawn an asynchronous task and poll it until it settles.

use std::time::Duration;

use anyhow::Result;
use omega_sdk::types::TaskRouting;
use omega_sdk::{CallOptions, OmegaClient};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OmegaClient::from_env()?;

    let routing = TaskRouting {
        strategy: Some("capability".to_string()),
        capability: Some("branding".to_string()),
        agent_id: None,
    };

    let created = client
        .tasks()
        .create(
            "workflow.run",
            json!({"workflow": "brand_campaign"}),
            Some(routing),
            None,
            CallOptions::default(),
        )
        .await?;
    println!("Task created: {} ({:?})", created.task_id, created.status);

    loop {
        let task = client
            .tasks()
            .get(&created.task_id, CallOptions::default())
            .await?;
        println!("Status: {:?}", task.status);

        if task.status.is_terminal() {
            if let Some(result) = &task.result {
                println!("Result: {}", result);
            }
            if let Some(audit) = &task.audit {
                if let Some(receipt_id) = &audit.keon_receipt_id {
                    println!("Keon Receipt: {}", receipt_id);
                }
            }
            break;
        }

        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    Ok(())
}
