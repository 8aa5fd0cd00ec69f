// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for message routing.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use super::dispatcher::{handler, Dispatcher, Handler, ALL};
use eco_core::Message;
use yare::parameterized;

const SYNC_FRAME: &str =
    r#"{"type":"sync","entityType":"orders","changeType":"update","timestamp":1,"changes":[]}"#;

fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Handler {
    let log = Arc::clone(log);
    handler(move |msg: &Message| {
        log.lock().unwrap().push(format!("{}:{}", name, msg.kind()));
        Ok(())
    })
}

#[test]
fn sync_handlers_then_all_handlers_with_isolation() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    dispatcher.on("sync", recorder(&log, "a"));
    dispatcher.on("sync", handler(|_| Err("boom".into())));
    dispatcher.on("sync", recorder(&log, "b"));
    dispatcher.on(ALL, recorder(&log, "c"));

    let message = dispatcher.dispatch_frame(SYNC_FRAME);

    assert!(matches!(message, Some(Message::Sync(_))));
    assert_eq!(*log.lock().unwrap(), vec!["a:sync", "b:sync", "c:sync"]);
}

#[test]
fn panicking_handler_does_not_stop_others() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    dispatcher.on("sync", handler(|_| panic!("handler bug")));
    dispatcher.on("sync", recorder(&log, "after"));

    dispatcher.dispatch_frame(SYNC_FRAME);
    assert_eq!(*log.lock().unwrap(), vec!["after:sync"]);
}

#[test]
fn duplicate_registration_is_noop() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let h = recorder(&log, "h");

    assert!(dispatcher.on("sync", Arc::clone(&h)));
    assert!(!dispatcher.on("sync", Arc::clone(&h)));
    assert_eq!(dispatcher.handler_count("sync"), 1);

    dispatcher.dispatch_frame(SYNC_FRAME);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn off_removes_only_that_handler() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = recorder(&log, "first");
    let second = recorder(&log, "second");

    dispatcher.on("sync", Arc::clone(&first));
    dispatcher.on("sync", Arc::clone(&second));
    assert!(dispatcher.off("sync", &first));
    assert!(!dispatcher.off("sync", &first));

    dispatcher.dispatch_frame(SYNC_FRAME);
    assert_eq!(*log.lock().unwrap(), vec!["second:sync"]);
}

#[test]
fn other_types_only_reach_their_handlers_and_all() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    dispatcher.on("sync", recorder(&log, "sync"));
    dispatcher.on("notification", recorder(&log, "note"));
    dispatcher.on(ALL, recorder(&log, "all"));

    dispatcher.dispatch_frame(r#"{"type":"notification","title":"t","message":"m"}"#);
    dispatcher.dispatch_frame(r#"{"type":"presence","user":"u1"}"#);

    assert_eq!(
        *log.lock().unwrap(),
        vec!["note:notification", "all:notification", "all:presence"]
    );
}

#[test]
fn message_typed_all_runs_wildcard_once() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.on(ALL, recorder(&log, "all"));

    dispatcher.dispatch_frame(r#"{"type":"all"}"#);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[parameterized(
    not_json = { "not json" },
    array = { "[1,2]" },
    missing_type = { r#"{"entityType":"orders"}"# },
    bad_sync = { r#"{"type":"sync","changeType":"update"}"# },
)]
fn malformed_frames_are_dropped(frame: &str) {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.on(ALL, recorder(&log, "all"));

    assert!(dispatcher.dispatch_frame(frame).is_none());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn incomplete_typed_frames_still_reach_all_handlers() {
    let dispatcher = Dispatcher::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    dispatcher.on("sync", recorder(&log, "sync"));
    dispatcher.on(ALL, recorder(&log, "all"));

    let sync = dispatcher.dispatch_frame(r#"{"type":"sync","entityType":"users"}"#);
    let note = dispatcher.dispatch_frame(r#"{"type":"notification","message":"hi"}"#);

    assert_eq!(sync.unwrap().entity_type(), Some("users"));
    assert!(note.is_some());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["sync:sync", "all:sync", "all:notification"]
    );
}
