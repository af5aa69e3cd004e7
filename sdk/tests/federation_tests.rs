// Copyright (c) 2026 OMEGA Platform
// SPDX-License-Identifier: AGPL-3.0

//! Signed invocation integration tests: allowlist gating, signature headers,
//! and the access-token lifecycle against a mock Federation Core.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use mockito::Matcher;
use omega_sdk::{
    Environment, ErrorKind, FederationClient, FederationOptions, OmegaConfig, SignatureMode,
};
use serde_json::json;

fn test_config(url: &str) -> OmegaConfig {
    OmegaConfig::default()
        .with_federation_url(url)
        .with_tenant_id("acme")
        .with_actor_id("clint")
}

fn signing_options() -> FederationOptions {
    FederationOptions {
        client_id: None,
        client_secret: None,
        environment: Environment::Development,
        passport_id: Some("pp_test".to_string()),
        allowed_tools: vec![],
        signature_mode: SignatureMode::Enabled,
        max_payload_bytes: 0,
        max_payload_depth: 0,
        hmac_secret_b64: Some(BASE64.encode(b"shared-test-secret")),
    }
}

fn success_envelope(data: serde_json::Value) -> String {
    json!({
        "ok": true,
        "data": data,
        "error": null,
        "meta": {
            "correlation_id": "t:acme|c:0194f0b0-1234-7890-abcd-ef0123456789",
            "request_id": "fc_test"
        }
    })
    .to_string()
}

#[tokio::test]
async fn allowlist_blocks_before_any_network_io() {
    let mut server = mockito::Server::new_async().await;

    // Instrumented: the invoke endpoint must never be called.
    let mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .expect(0)
        .with_status(200)
        .with_body(success_envelope(json!({})))
        .create_async()
        .await;

    let options = FederationOptions {
        environment: Environment::Production,
        allowed_tools: vec!["csv_processor".to_string()],
        ..signing_options()
    };
    let client = FederationClient::new(options, test_config(&server.url())).unwrap();

    let err = client
        .invoke_tool("forbidden_tool", &json!({"x": 1}))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ToolNotAllowed);
    assert!(!err.retryable);
    mock.assert_async().await;
}

#[tokio::test]
async fn allowlisted_tool_passes_in_production() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({"result": "ok"})))
        .create_async()
        .await;

    let options = FederationOptions {
        environment: Environment::Production,
        allowed_tools: vec!["csv_processor".to_string()],
        ..signing_options()
    };
    let client = FederationClient::new(options, test_config(&server.url())).unwrap();

    let result = client
        .invoke_tool("csv_processor", &json!({"file": "data.csv"}))
        .await
        .unwrap();

    assert_eq!(result["result"], "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn signed_invocation_carries_signature_headers() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .match_header("x-omega-passport", "pp_test")
        .match_header("x-omega-timestamp", Matcher::Regex(r"^\d+$".to_string()))
        .match_header("x-omega-nonce", Matcher::Regex(r"^.{16}$".to_string()))
        .match_header("x-omega-signature", Matcher::Regex(r"^[A-Za-z0-9+/=]+$".to_string()))
        .match_header("x-omega-sdk", Matcher::Regex(r"^omega-sdk-rust/".to_string()))
        .match_body(Matcher::PartialJson(json!({
            "tool_name": "csv_processor",
            "parameters": {"file": "data.csv"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({"rows": 123})))
        .create_async()
        .await;

    let client =
        FederationClient::new(signing_options(), test_config(&server.url())).unwrap();
    let result = client
        .invoke_tool("csv_processor", &json!({"file": "data.csv"}))
        .await
        .unwrap();

    assert_eq!(result["rows"], 123);
    mock.assert_async().await;
}

#[tokio::test]
async fn disabled_signature_mode_sends_no_signature_headers() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .match_header("x-omega-signature", Matcher::Missing)
        .match_header("x-omega-nonce", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({})))
        .create_async()
        .await;

    let options = FederationOptions {
        signature_mode: SignatureMode::Disabled,
        ..signing_options()
    };
    let client = FederationClient::new(options, test_config(&server.url())).unwrap();

    client.invoke_tool("csv_processor", &json!({})).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn payload_constraints_block_before_network_io() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .expect(0)
        .with_status(200)
        .with_body(success_envelope(json!({})))
        .create_async()
        .await;

    let options = FederationOptions {
        max_payload_bytes: 16,
        max_payload_depth: 2,
        ..signing_options()
    };
    let client = FederationClient::new(options, test_config(&server.url())).unwrap();

    let err = client
        .invoke_tool("csv_processor", &json!({"key": "a long enough value"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PayloadTooLarge);

    let err = client
        .invoke_tool("csv_processor", &json!({"a": {"b": {"c": 1}}}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PayloadTooDeep);

    mock.assert_async().await;
}

#[tokio::test]
async fn token_is_fetched_once_and_reused() {
    let mut server = mockito::Server::new_async().await;

    let token_mock = server
        .mock("POST", "/api/v1/auth/client/token")
        .expect(1)
        .match_body(Matcher::PartialJson(json!({
            "client_id": "svc_echo",
            "client_secret": "s3cret"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({
            "access_token": "at_12345",
            "expires_in": 3600
        })))
        .create_async()
        .await;

    let invoke_mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .expect(2)
        .match_header("authorization", "Bearer at_12345")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({})))
        .create_async()
        .await;

    let options = FederationOptions {
        client_id: Some("svc_echo".to_string()),
        client_secret: Some("s3cret".to_string()),
        ..signing_options()
    };
    let client = FederationClient::new(options, test_config(&server.url())).unwrap();

    client.invoke_tool("csv_processor", &json!({})).await.unwrap();
    client.invoke_tool("csv_processor", &json!({})).await.unwrap();

    token_mock.assert_async().await;
    invoke_mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_invocations_share_one_token_fetch() {
    let mut server = mockito::Server::new_async().await;

    let token_mock = server
        .mock("POST", "/api/v1/auth/client/token")
        .expect(1)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({
            "access_token": "at_shared",
            "expires_in": 3600
        })))
        .create_async()
        .await;

    let invoke_mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .expect(4)
        .match_header("authorization", "Bearer at_shared")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({})))
        .create_async()
        .await;

    let options = FederationOptions {
        client_id: Some("svc_echo".to_string()),
        client_secret: Some("s3cret".to_string()),
        ..signing_options()
    };
    let client =
        Arc::new(FederationClient::new(options, test_config(&server.url())).unwrap());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client.invoke_tool("csv_processor", &json!({})).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    token_mock.assert_async().await;
    invoke_mock.assert_async().await;
}

#[tokio::test]
async fn token_fetch_failure_surfaces_authentication_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/v1/auth/client/token")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "ok": false,
                "error": {"code": "UNAUTHENTICATED", "message": "bad credentials", "details": {}},
                "meta": {}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let invoke_mock = server
        .mock("POST", "/api/v1/mcp/tools/invoke")
        .expect(0)
        .with_status(200)
        .with_body(success_envelope(json!({})))
        .create_async()
        .await;

    let options = FederationOptions {
        client_id: Some("svc_echo".to_string()),
        client_secret: Some("wrong".to_string()),
        ..signing_options()
    };
    let client = FederationClient::new(options, test_config(&server.url())).unwrap();

    let err = client.invoke_tool("csv_processor", &json!({})).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert!(!err.retryable);
    invoke_mock.assert_async().await;
}

#[tokio::test]
async fn list_tools_parses_descriptors() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/v1/mcp/tools/list")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(success_envelope(json!({
            "tools": [
                {"name": "csv_processor", "description": "Parse CSVs", "input_schema": {}},
                {"name": "echo"}
            ]
        })))
        .create_async()
        .await;

    let client =
        FederationClient::new(signing_options(), test_config(&server.url())).unwrap();
    let tools = client.list_tools().await.unwrap();

    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "csv_processor");
    assert_eq!(tools[0].description.as_deref(), Some("Parse CSVs"));
    assert!(tools[1].description.is_none());
}
