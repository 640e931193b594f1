mod common;

use common::{exchange, init_test_tracing, raw_exchange, RecordingSink};
use haulwatch_actors::intercept::{Interceptor, NotifyBinding};
use haulwatch_drivers::haul_browser::tap::TapEvent;
use std::sync::Arc;

const CHAT: i64 = 42;

fn bound_interceptor() -> (Interceptor, Arc<RecordingSink>) {
    init_test_tracing();
    let sink = Arc::new(RecordingSink::default());
    let mut interceptor = Interceptor::new();
    interceptor.bind(NotifyBinding::new(CHAT, sink.clone()));
    (interceptor, sink)
}

#[tokio::test]
async fn repeated_leading_id_notifies_at_most_once() {
    let (mut interceptor, sink) = bound_interceptor();
    let body = r#"{"loads":[{"id":"L100"}]}"#;

    for _ in 0..4 {
        interceptor.on_event(exchange(200, body)).await.unwrap();
    }

    assert_eq!(sink.ids(), vec!["L100"]);
}

#[tokio::test]
async fn promoted_loads_are_invisible_to_dedup() {
    let (mut interceptor, sink) = bound_interceptor();

    // The raw list leads with a promoted item; the organic leader must win.
    interceptor
        .on_event(exchange(
            200,
            r#"{"loads":[{"id":"promo-9","priority":true},{"id":"L100"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(sink.ids(), vec!["L100"]);
    assert_eq!(interceptor.last_seen().unwrap().to_string(), "L100");
}

#[tokio::test]
async fn suppression_is_only_against_the_immediate_previous_id() {
    let (mut interceptor, sink) = bound_interceptor();

    for id in ["A", "B", "A"] {
        let body = format!(r#"{{"loads":[{{"id":"{id}"}}]}}"#);
        interceptor.on_event(exchange(200, &body)).await.unwrap();
    }

    assert_eq!(sink.ids(), vec!["A", "B", "A"]);
}

#[tokio::test]
async fn non_200_responses_gate_both_state_and_delivery() {
    let (mut interceptor, sink) = bound_interceptor();
    let body = r#"{"loads":[{"id":"L100"}]}"#;

    interceptor.on_event(exchange(404, body)).await.unwrap();
    assert!(sink.ids().is_empty());
    assert!(interceptor.last_seen().is_none());

    // The same body over a healthy response still counts as new.
    interceptor.on_event(exchange(200, body)).await.unwrap();
    assert_eq!(sink.ids(), vec!["L100"]);
}

#[tokio::test]
async fn all_promoted_listing_skips_the_cycle() {
    let (mut interceptor, sink) = bound_interceptor();

    interceptor
        .on_event(exchange(
            200,
            r#"{"loads":[{"id":"p1","priority":true},{"id":"p2","priority":1}]}"#,
        ))
        .await
        .unwrap();
    interceptor
        .on_event(exchange(200, r#"{"loads":[]}"#))
        .await
        .unwrap();

    assert!(sink.ids().is_empty());
    assert!(interceptor.last_seen().is_none());
}

#[tokio::test]
async fn unbound_interceptor_neither_notifies_nor_latches() {
    init_test_tracing();
    let sink = Arc::new(RecordingSink::default());
    let mut interceptor = Interceptor::new();
    let body = r#"{"loads":[{"id":"L100"}]}"#;

    interceptor.on_event(exchange(200, body)).await.unwrap();
    assert!(interceptor.last_seen().is_none());

    // Binding later makes the same leading id count as the first sighting.
    interceptor.bind(NotifyBinding::new(CHAT, sink.clone()));
    interceptor.on_event(exchange(200, body)).await.unwrap();
    assert_eq!(sink.delivered(), vec![(CHAT, "L100".to_string())]);
}

#[tokio::test]
async fn unbinding_turns_matches_into_noops() {
    let (mut interceptor, sink) = bound_interceptor();

    interceptor
        .on_event(exchange(200, r#"{"loads":[{"id":"L100"}]}"#))
        .await
        .unwrap();
    interceptor.unbind();
    interceptor
        .on_event(exchange(200, r#"{"loads":[{"id":"L200"}]}"#))
        .await
        .unwrap();

    assert_eq!(sink.ids(), vec!["L100"]);
}

#[tokio::test]
async fn malformed_bodies_error_without_touching_state() {
    let (mut interceptor, sink) = bound_interceptor();

    assert!(interceptor
        .on_event(exchange(200, "not json at all"))
        .await
        .is_err());
    assert!(interceptor
        .on_event(raw_exchange(200, vec![0xff, 0xfe, 0x00]))
        .await
        .is_err());
    assert!(sink.ids().is_empty());
    assert!(interceptor.last_seen().is_none());

    // The watch survives: the next healthy exchange notifies.
    interceptor
        .on_event(exchange(200, r#"{"loads":[{"id":"L100"}]}"#))
        .await
        .unwrap();
    assert_eq!(sink.ids(), vec!["L100"]);
}

#[tokio::test]
async fn request_and_quiet_events_are_noops() {
    let (mut interceptor, sink) = bound_interceptor();

    interceptor.on_event(TapEvent::Quiet).await.unwrap();
    interceptor
        .on_event(TapEvent::Request {
            request_id: "req-7".into(),
            url: "https://loads.ati.su/webapi/v1.0/loads/search".into(),
        })
        .await
        .unwrap();

    assert!(sink.ids().is_empty());
    assert!(interceptor.last_seen().is_none());
}

#[tokio::test]
async fn numeric_and_string_ids_never_collide() {
    let (mut interceptor, sink) = bound_interceptor();

    interceptor
        .on_event(exchange(200, r#"{"loads":[{"id":100}]}"#))
        .await
        .unwrap();
    interceptor
        .on_event(exchange(200, r#"{"loads":[{"id":"100"}]}"#))
        .await
        .unwrap();

    // Identifiers are opaque: 100 and "100" are distinct postings.
    assert_eq!(sink.ids(), vec!["100", "100"]);
}

#[tokio::test]
async fn end_to_end_scenario() {
    let (mut interceptor, sink) = bound_interceptor();

    let first = r#"{"loads":[{"id":"p1","priority":true},{"id":"L100"}]}"#;
    interceptor.on_event(exchange(200, first)).await.unwrap();
    interceptor.on_event(exchange(200, first)).await.unwrap();
    interceptor
        .on_event(exchange(200, r#"{"loads":[{"id":"L101"}]}"#))
        .await
        .unwrap();

    assert_eq!(sink.ids(), vec!["L100", "L101"]);
}
