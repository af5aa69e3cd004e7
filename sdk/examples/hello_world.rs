// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! The simplest possible OMEGA app: connect, check health, shut down.
//!
//! Required env vars: OMEGA_FEDERATION_URL, OMEGA_TENANT_ID, OMEGA_ACTOR_ID.

use anyhow::Result;
use omega_sdk::OmegaClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = OmegaClient::from_env()?;

    println!("Connecting to OMEGA Federation Core...");
    match client.health().await {
        Ok(health) if health.healthy() => {
            println!("Hello, OMEGA!");
            println!("  Federation: {}", health.version.unwrap_or_default());
            println!("  Status: healthy");
        }
        Ok(health) => {
            println!(
                "Federation unhealthy: {}",
                health.message.unwrap_or_else(|| health.status.clone())
            );
        }
        Err(e) => {
            println!("Connection failed: {}", e.message);
            println!("  Code: {}", e.code);
            if let Some(correlation_id) = &e.correlation_id {
                println!("  Correlation: {}", correlation_id);
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
