use crate::presence::domain::presence_tracker::PresenceEvent;
use crate::shared::clock::Timestamp;
use crate::shared::error::SinkError;

/// Append-only destination for presence events.
///
/// Called synchronously from the frame loop. A failed write is reported to
/// the caller and dropped; implementations must not retry or block
/// indefinitely.
pub trait EventSink: Send {
    fn record(&mut self, event: PresenceEvent, at: Timestamp) -> Result<(), SinkError>;
}

/// Sink that discards every event.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&mut self, _event: PresenceEvent, _at: Timestamp) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that keeps events in memory, for embedding and tests.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Vec<(PresenceEvent, Timestamp)>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[(PresenceEvent, Timestamp)] {
        &self.events
    }
}

impl EventSink for MemoryEventSink {
    fn record(&mut self, event: PresenceEvent, at: Timestamp) -> Result<(), SinkError> {
        self.events.push((event, at));
        Ok(())
    }
}
