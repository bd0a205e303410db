// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingress ordering, draining and shutdown.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{AuthId, SettingKey, TenantId, TenantSession, Transport};
use herald_dispatch::{Ingress, IngressSummary};
use herald_test_utils::{EventBuilder, MockSecurity, MockTransport, TestHarness};
use tokio_util::sync::CancellationToken;

const GROUP_CHAT: &str = "120363025@g.us";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn log_order_matches_arrival_order() {
    let harness = TestHarness::new().await.unwrap();
    for i in 0..200 {
        harness
            .transport
            .inject_event(
                EventBuilder::new(format!("m{i}"))
                    .group("120363025", "5511")
                    .text("burst")
                    .build(),
            )
            .await;
    }
    harness.transport.close();

    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());
    let summary = ingress.run(CancellationToken::new()).await;

    assert_eq!(
        summary,
        IngressSummary {
            received: 200,
            admitted: 200,
            dropped: 0,
        }
    );
    let ids: Vec<_> = harness
        .dispatcher
        .state()
        .recent_messages(GROUP_CHAT)
        .into_iter()
        .map(|entry| entry.event.id.clone())
        .collect();
    let expected: Vec<_> = (0..200).map(|i| format!("m{i}")).collect();
    assert_eq!(ids, expected);
    assert_eq!(harness.metrics.samples().len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn direct_chat_log_keeps_arrival_order_when_routing_stalls() {
    let harness = TestHarness::builder()
        .with_security(MockSecurity::stalling("d0", Duration::from_millis(100)))
        .build()
        .await
        .unwrap();
    for i in 0..3 {
        harness
            .transport
            .inject_event(
                EventBuilder::new(format!("d{i}"))
                    .direct("5511777")
                    .text("hello")
                    .build(),
            )
            .await;
    }
    harness.transport.close();

    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());
    let summary = ingress.run(CancellationToken::new()).await;
    assert_eq!(summary.admitted, 3);

    let log = harness.dispatcher.state().recent_messages("5511777@s.whatsapp.net");
    let ids: Vec<_> = log.iter().map(|entry| entry.event.id.as_str()).collect();
    assert_eq!(ids, ["d0", "d1", "d2"]);
    let seqs: Vec<_> = log.iter().map(|entry| entry.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn malformed_events_are_counted_as_dropped() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .transport
        .inject_event(EventBuilder::new("ok").direct("5511").text(".ping").build())
        .await;
    harness
        .transport
        .inject_event(EventBuilder::new("bad").remote_jid(None).text("x").build())
        .await;
    harness.transport.close();

    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());
    let summary = ingress.run(CancellationToken::new()).await;

    assert_eq!(summary.received, 2);
    assert_eq!(summary.admitted, 1);
    assert_eq!(summary.dropped, 1);
    assert_eq!(harness.interpreter.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_drains_pending_status_batches() {
    let harness = TestHarness::builder()
        .with_stored_setting(SettingKey::Features, r#"{"status_seen":true}"#)
        .build()
        .await
        .unwrap();
    harness
        .transport
        .inject_event(EventBuilder::new("S1").status("5511").build())
        .await;
    harness.transport.close();

    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());
    ingress.run(CancellationToken::new()).await;

    assert_eq!(harness.transport.reactions().await.len(), 1);
    assert!(harness.dispatcher.tasks().is_empty());
}

#[tokio::test]
async fn missed_statuses_are_caught_up_once_per_run() {
    let harness = TestHarness::builder()
        .with_stored_setting(SettingKey::Features, r#"{"status_seen":true}"#)
        .build()
        .await
        .unwrap();
    harness
        .transport
        .set_unseen_statuses(vec![
            EventBuilder::new("U1").status("5511").build(),
            EventBuilder::new("U2").status("5522").build(),
        ])
        .await;
    harness.transport.close();

    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());
    let summary = ingress.run(CancellationToken::new()).await;

    assert_eq!(summary.received, 0);
    let mut ids: Vec<_> = harness
        .transport
        .reactions()
        .await
        .into_iter()
        .map(|r| r.key.id)
        .collect();
    ids.sort();
    assert_eq!(ids, ["U1", "U2"]);
    assert!(harness.transport.fetch_unseen_statuses().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_an_open_stream() {
    let harness = TestHarness::new().await.unwrap();
    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());

    let cancel = CancellationToken::new();
    let run = tokio::spawn(ingress.run(cancel.clone()));

    harness
        .transport
        .inject_event(EventBuilder::new("D1").direct("5511").text(".ping").build())
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let summary = run.await.unwrap();
    assert_eq!(summary.received, 1);
    assert_eq!(harness.interpreter.requests().len(), 1);
}

#[tokio::test]
async fn multiple_tenants_share_one_dispatcher() {
    let harness = TestHarness::new().await.unwrap();
    let second = Arc::new(MockTransport::new());
    second
        .inject_event(EventBuilder::new("T2").direct("5533").text(".ping").build())
        .await;
    second.close();
    harness
        .transport
        .inject_event(EventBuilder::new("T1").direct("5522").text(".ping").build())
        .await;
    harness.transport.close();

    let mut ingress = Ingress::new(Arc::clone(&harness.dispatcher));
    ingress.add_session(harness.session.clone());
    ingress.add_session(TenantSession::new(
        TenantId::new("551188888"),
        AuthId::new("auth-2"),
        second,
    ));
    assert_eq!(ingress.session_count(), 2);
    let summary = ingress.run(CancellationToken::new()).await;

    assert_eq!(summary.admitted, 2);
    let mut tenants: Vec<_> = harness
        .interpreter
        .requests()
        .into_iter()
        .map(|r| r.tenant_id.to_string())
        .collect();
    tenants.sort();
    assert_eq!(tenants, ["551188888", "551199999"]);
    assert!(harness.mock_store.knows_tenant("551188888"));
}
