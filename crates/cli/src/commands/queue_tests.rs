// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::commands::testing::TestContext;
use yare::parameterized;

#[test]
fn queues_record_with_its_id() {
    let mut ctx = TestContext::new();

    run_impl(
        &ctx.service,
        "orders",
        Operation::Update,
        r#"{"_id": "o1", "qty": 3}"#,
        &mut ctx.out,
    )
    .unwrap();

    assert_eq!(ctx.output(), "Queued update o1 (1 pending)\n");
    assert_eq!(ctx.service.pending_updates("orders")[0].data["qty"], 3);
}

#[test]
fn create_without_id_gets_local_id() {
    let mut ctx = TestContext::new();

    run_impl(&ctx.service, "orders", Operation::Create, r#"{"qty": 1}"#, &mut ctx.out).unwrap();

    assert!(ctx.output().starts_with("Queued create local-"));
}

#[parameterized(
    not_json = { "qty=1" },
    array = { "[1, 2]" },
    scalar = { "42" },
)]
fn rejects_non_object(data: &str) {
    let mut ctx = TestContext::new();

    let err = run_impl(&ctx.service, "orders", Operation::Create, data, &mut ctx.out).unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(!ctx.service.has_pending_updates());
    assert!(ctx.api.calls().is_empty());
}
