// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! List available tools, optionally filtered by capability.

use anyhow::Result;
use omega_sdk::{CallOptions, OmegaClient, ToolListParams};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OmegaClient::from_env()?;

    let params = ToolListParams {
        capability: std::env::args().nth(1),
        ..Default::default()
    };

    let tools = client.tools().list(params, CallOptions::default()).await?;

    println!("Available tools ({}):", tools.items.len());
    for tool in &tools.items {
        println!(
            "  {} [{}]: {}",
            tool.tool_id,
            tool.status.as_deref().unwrap_or("unknown"),
            tool.description.as_deref().unwrap_or("-")
        );
    }

    if let Some(cursor) = &tools.page.next_cursor {
        println!("More results available, cursor: {}", cursor);
    }

    Ok(())
}
