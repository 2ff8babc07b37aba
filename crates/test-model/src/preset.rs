use serde::{Deserialize, Serialize};

/// The events in a preset reply.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// Fails the stream with the given message when reached, after any
    /// preceding deltas have been delivered.
    #[serde(rename = "fail")]
    Fail(String),
}

/// The preset reply for one user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this reply.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts,
    /// before any event is produced. `Some(0)` means the request will
    /// fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a `PresetResponse` that streams the given text one
    /// whitespace-delimited fragment at a time.
    pub fn with_text(text: &str) -> Self {
        let mut events = Vec::new();
        let mut rest = text;
        while let Some(idx) = rest.find(' ') {
            events.push(PresetEvent::MessageDelta(rest[..=idx].to_owned()));
            rest = &rest[idx + 1..];
        }
        if !rest.is_empty() {
            events.push(PresetEvent::MessageDelta(rest.to_owned()));
        }
        Self {
            events,
            failures: None,
        }
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}
