// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::TestContext;
use crate::sync::test_helpers::{pull_ok, server_error, MockApi};
use eco_core::Operation;
use serde_json::{json, Value};

#[tokio::test]
async fn text_report_for_configured_entities() {
    let api = MockApi::new();
    api.script_pull("orders", pull_ok(vec![json!({"_id": "a"})], Some(1_234_567_890)));
    let mut ctx = TestContext::with_api(api);
    ctx.queue("orders", Operation::Update, json!({"_id": "a"}));

    run_impl(&ctx.service, None, OutputFormat::Text, &mut ctx.out)
        .await
        .unwrap();

    assert_eq!(
        ctx.output(),
        "orders: pushed 1, added 1, updated 0, deleted 0\n\
         users: pushed 0, added 0, updated 0, deleted 0\n\
         Server timestamp: 1234567890 (1970-01-15 06:56:07 UTC)\n\
         Sync complete\n"
    );
    assert!(!ctx.service.has_pending_updates());
}

#[tokio::test]
async fn explicit_entities_override_configured() {
    let mut ctx = TestContext::new();

    run_impl(
        &ctx.service,
        Some(vec!["products".into()]),
        OutputFormat::Json,
        &mut ctx.out,
    )
    .await
    .unwrap();

    let parsed: Value = serde_json::from_str(&ctx.output()).unwrap();
    assert_eq!(parsed["success"], true);
    assert!(parsed["entities"].get("products").is_some());
    assert!(parsed["entities"].get("orders").is_none());
}

#[tokio::test]
async fn partial_failure_prints_then_errors() {
    let api = MockApi::new();
    api.script_pull("users", Err(server_error(502)));
    let mut ctx = TestContext::with_api(api);

    let err = run_impl(&ctx.service, None, OutputFormat::Text, &mut ctx.out)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SyncFailed(ref m) if m.contains("users: pull failed")));
    let output = ctx.output();
    assert!(output.contains("orders: pushed 0"));
    assert!(output.contains("users: pushed 0, added 0, updated 0, deleted 0, 1 error\n"));
    assert!(!output.contains("Sync complete"));
}

