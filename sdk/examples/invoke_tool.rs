// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Invoke a tool and inspect the result plus its audit metadata.

use anyhow::Result;
use omega_sdk::{CallOptions, ErrorKind, InvokeOptions, OmegaClient, OmegaConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = OmegaConfig::default()
        .with_federation_url("http://localhost:9405")
        .with_tenant_id("acme")
        .with_actor_id("clint");
    let client = OmegaClient::new(config)?;

    println!("Fetching tool schema...");
    let tool = client.tools().get("csv_processor", CallOptions::default()).await?;
    println!("Tool: {}", tool.display_name.as_deref().unwrap_or(&tool.tool_id));
    println!("Description: {}", tool.description.as_deref().unwrap_or("-"));
    println!();

    println!("Invoking tool...");
    let invocation = client
        .tools()
        .invoke(
            "csv_processor",
            json!({
                "file": "data.csv",
                "normalize": true,
                "output_format": "json",
            }),
            InvokeOptions {
                tags: Some(vec!["example".to_string(), "test".to_string()]),
                ..Default::default()
            },
            CallOptions::default(),
        )
        .await;

    match invocation {
        Ok(result) => {
            println!("Tool invocation successful!");
            println!("Result: {}", result.result);

            if let Some(audit) = &result.audit {
                println!("Audit:");
                if let Some(event_id) = &audit.event_id {
                    println!("  Event ID: {}", event_id);
                }
                if let Some(receipt_id) = &audit.keon_receipt_id {
                    println!("  Keon Receipt: {}", receipt_id);
                }
            }
            if let Some(usage) = &result.usage {
                println!("Usage:");
                for (key, value) in usage {
                    println!("  {}: {}", key, value);
                }
            }
        }
        Err(e) if e.kind == ErrorKind::NotFound => {
            println!("Tool not found: {}", e.message);
            println!("Correlation ID: {}", e.correlation_id.unwrap_or_default());
        }
        Err(e) if e.kind == ErrorKind::ValidationFailed => {
            println!("Validation error: {}", e.message);
            if let Some(field_errors) = e.details.get("field_errors") {
                println!("Field errors: {}", field_errors);
            }
        }
        Err(e) => {
            println!("Error: {} - {}", e.code, e.message);
            if e.retryable {
                println!("(This error is retryable)");
            }
        }
    }

    Ok(())
}
