//! In-memory event log backing streamable HTTP resumability.
//!
//! Every outbound message sent under the streamable HTTP transport is
//! appended to its session's stream with a process-unique, monotonically
//! increasing event id. A reconnecting client presents the last id it saw
//! and receives exactly the suffix of that stream that followed it.
//!
//! Streams grow unbounded for the life of the process. That is acceptable
//! only because this is dev-grade resumability, not a durable log; nothing
//! is persisted across restarts.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// An event id paired with the message it tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    /// The id assigned at store time, e.g. `evt_000042`.
    pub event_id: String,
    /// The JSON-RPC message payload.
    pub message: Value,
}

#[derive(Default)]
struct Inner {
    /// Per-stream append-only logs: stream id -> [(event id, message)].
    streams: HashMap<String, Vec<EventMessage>>,
    /// Process-wide id counter; ids are unique across streams.
    counter: u64,
}

/// Append-only event store with replay-after-id.
///
/// A single mutex guards the whole store. Contention is low: appends happen
/// once per outbound message and scans only on client reconnect.
#[derive(Default)]
pub struct EventStore {
    inner: Mutex<Inner>,
}

impl EventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to a stream, creating the stream on first use.
    ///
    /// Returns the generated event id.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn store_event(&self, stream_id: &str, message: Value) -> String {
        let mut inner = self.inner.lock().expect("event store lock poisoned");

        inner.counter += 1;
        let event_id = format!("evt_{:06}", inner.counter);

        inner
            .streams
            .entry(stream_id.to_string())
            .or_default()
            .push(EventMessage {
                event_id: event_id.clone(),
                message,
            });

        tracing::debug!(%event_id, %stream_id, "stored event");
        event_id
    }

    /// Replays every event strictly after `last_event_id`, in append order.
    ///
    /// Scans all streams for the one containing the id. On a hit the
    /// callback is invoked once per subsequent event and the owning stream's
    /// id is returned. If the id appears in no stream, returns `None`
    /// without invoking the callback.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn replay_events_after(
        &self,
        last_event_id: &str,
        mut send: impl FnMut(EventMessage),
    ) -> Option<String> {
        let inner = self.inner.lock().expect("event store lock poisoned");

        for (stream_id, events) in &inner.streams {
            if let Some(position) = events.iter().position(|e| e.event_id == last_event_id) {
                for event in &events[position + 1..] {
                    send(event.clone());
                }
                tracing::debug!(%last_event_id, %stream_id, "replayed events");
                return Some(stream_id.clone());
            }
        }

        tracing::warn!(%last_event_id, "event not found in any stream");
        None
    }

    /// Returns the events of one stream, or of all streams when no id is
    /// given (order across streams unspecified, order within a stream is
    /// append order).
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    #[must_use]
    pub fn get_events(&self, stream_id: Option<&str>) -> Vec<EventMessage> {
        let inner = self.inner.lock().expect("event store lock poisoned");

        match stream_id {
            Some(id) => inner.streams.get(id).cloned().unwrap_or_default(),
            None => inner.streams.values().flatten().cloned().collect(),
        }
    }

    /// Resets all streams and the id counter.
    ///
    /// For test isolation only; never called in normal operation.
    ///
    /// # Panics
    ///
    /// Panics if the store mutex is poisoned.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("event store lock poisoned");
        inner.streams.clear();
        inner.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_are_monotonic_and_process_unique() {
        let store = EventStore::new();
        let a = store.store_event("s1", json!({"n": 1}));
        let b = store.store_event("s2", json!({"n": 2}));
        let c = store.store_event("s1", json!({"n": 3}));

        assert_eq!(a, "evt_000001");
        assert_eq!(b, "evt_000002");
        assert_eq!(c, "evt_000003");
    }

    #[test]
    fn replay_returns_the_strict_suffix_in_order() {
        let store = EventStore::new();
        let first = store.store_event("s1", json!({"n": 1}));
        store.store_event("s1", json!({"n": 2}));
        store.store_event("s1", json!({"n": 3}));

        let mut seen = Vec::new();
        let stream = store.replay_events_after(&first, |e| seen.push(e.message));

        assert_eq!(stream.as_deref(), Some("s1"));
        assert_eq!(seen, vec![json!({"n": 2}), json!({"n": 3})]);
    }

    #[test]
    fn replay_from_the_tail_sends_nothing() {
        let store = EventStore::new();
        store.store_event("s1", json!({"n": 1}));
        let last = store.store_event("s2", json!({"n": 2}));

        let mut calls = 0;
        let stream = store.replay_events_after(&last, |_| calls += 1);

        assert_eq!(stream.as_deref(), Some("s2"));
        assert_eq!(calls, 0);
    }

    #[test]
    fn replay_of_unknown_id_is_not_found() {
        let store = EventStore::new();
        store.store_event("s1", json!({"n": 1}));

        let mut calls = 0;
        let stream = store.replay_events_after("nonexistent-id", |_| calls += 1);

        assert!(stream.is_none());
        assert_eq!(calls, 0);
    }

    #[test]
    fn get_events_filters_by_stream() {
        let store = EventStore::new();
        store.store_event("s1", json!({"n": 1}));
        store.store_event("s2", json!({"n": 2}));
        store.store_event("s1", json!({"n": 3}));

        let s1 = store.get_events(Some("s1"));
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].message, json!({"n": 1}));
        assert_eq!(s1[1].message, json!({"n": 3}));

        assert_eq!(store.get_events(None).len(), 3);
        assert!(store.get_events(Some("missing")).is_empty());
    }

    #[test]
    fn clear_resets_the_counter() {
        let store = EventStore::new();
        store.store_event("s1", json!({"n": 1}));
        store.clear();

        assert!(store.get_events(None).is_empty());
        assert_eq!(store.store_event("s1", json!({"n": 2})), "evt_000001");
    }
}
