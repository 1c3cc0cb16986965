//! Integration tests for event store replay semantics.
//!
//! These pin the resumability contract the streamable HTTP transport relies
//! on: process-unique monotonic ids, strict-suffix replay in append order,
//! and not-found signalling for unknown ids.

use serde_json::json;

use crawl4ai_mcp::mcp::EventStore;

#[test]
fn test_replay_after_first_event_yields_the_rest_of_its_stream() {
    let store = EventStore::new();
    let id_m1 = store.store_event("s1", json!({"seq": "m1"}));
    store.store_event("s1", json!({"seq": "m2"}));
    store.store_event("s2", json!({"seq": "m3"}));

    let mut replayed = Vec::new();
    let stream = store.replay_events_after(&id_m1, |event| replayed.push(event));

    assert_eq!(stream.as_deref(), Some("s1"));
    assert_eq!(replayed.len(), 1);
    assert_eq!(replayed[0].message, json!({"seq": "m2"}));
}

#[test]
fn test_replay_after_last_event_of_a_stream_is_empty() {
    let store = EventStore::new();
    store.store_event("s1", json!({"seq": "m1"}));
    store.store_event("s1", json!({"seq": "m2"}));
    let id_m3 = store.store_event("s2", json!({"seq": "m3"}));

    let mut calls = 0;
    let stream = store.replay_events_after(&id_m3, |_| calls += 1);

    assert_eq!(stream.as_deref(), Some("s2"));
    assert_eq!(calls, 0);
}

#[test]
fn test_replay_of_unknown_id_reports_not_found() {
    let store = EventStore::new();
    store.store_event("s1", json!({"seq": "m1"}));

    let mut calls = 0;
    let stream = store.replay_events_after("nonexistent-id", |_| calls += 1);

    assert!(stream.is_none());
    assert_eq!(calls, 0);
}

#[test]
fn test_replay_preserves_append_order_across_interleaved_streams() {
    let store = EventStore::new();
    let first = store.store_event("s1", json!({"n": 1}));
    store.store_event("s2", json!({"n": 2}));
    store.store_event("s1", json!({"n": 3}));
    store.store_event("s2", json!({"n": 4}));
    store.store_event("s1", json!({"n": 5}));

    let mut replayed = Vec::new();
    let stream = store.replay_events_after(&first, |event| replayed.push(event.message));

    // Only s1's suffix, in the order it was appended.
    assert_eq!(stream.as_deref(), Some("s1"));
    assert_eq!(replayed, vec![json!({"n": 3}), json!({"n": 5})]);
}

#[test]
fn test_event_ids_carry_through_replay() {
    let store = EventStore::new();
    let first = store.store_event("s1", json!({"n": 1}));
    let second = store.store_event("s1", json!({"n": 2}));

    let mut ids = Vec::new();
    store.replay_events_after(&first, |event| ids.push(event.event_id));

    assert_eq!(ids, vec![second]);
}

#[test]
fn test_clear_provides_test_isolation() {
    let store = EventStore::new();
    let stale = store.store_event("s1", json!({"n": 1}));
    store.clear();

    assert!(store.replay_events_after(&stale, |_| ()).is_none());
    assert!(store.get_events(None).is_empty());
}
