use mnemos_protocol::{EventMsg, EventPayload, EventSink};
use parking_lot::Mutex;

/// Collects emitted events in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EventMsg>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EventMsg> {
        self.events.lock().clone()
    }

    pub fn payloads(&self) -> Vec<EventPayload> {
        self.events
            .lock()
            .iter()
            .map(|event| event.payload.clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EventMsg) {
        self.events.lock().push(event);
    }
}
