use std::sync::mpsc::{self, Receiver, Sender};

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::events::{CaptureEvent, ChunkEvent, DurationEvent};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::traits::capture_subscriber::CaptureSubscriber;

/// Subscriber that forwards every notification as a `CaptureEvent` over a channel.
///
/// Lets a host drain events on its own thread (e.g. a UI bridge that
/// serializes them to JSON). Only chunk delivery reports a closed receiver;
/// the other notifications are best effort.
pub struct ChannelSubscriber {
    tx: Mutex<Sender<CaptureEvent>>,
}

impl ChannelSubscriber {
    pub fn new(tx: Sender<CaptureEvent>) -> Self {
        Self { tx: Mutex::new(tx) }
    }

    /// A subscriber with the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<CaptureEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: CaptureEvent) -> Result<(), CaptureError> {
        self.tx
            .lock()
            .send(event)
            .map_err(|_| CaptureError::Emit("event receiver disconnected".into()))
    }

    fn send_quietly(&self, event: CaptureEvent) {
        if self.send(event).is_err() {
            log::debug!("Capture event dropped, receiver gone");
        }
    }
}

impl CaptureSubscriber for ChannelSubscriber {
    fn on_state_changed(&self, state: CaptureState) {
        self.send_quietly(CaptureEvent::StateChanged { state });
    }

    fn on_chunk(&self, chunk: &ChunkEvent) -> Result<(), CaptureError> {
        self.send(CaptureEvent::Data(chunk.clone()))
    }

    fn on_duration(&self, event: &DurationEvent) {
        self.send_quietly(CaptureEvent::Duration(event.clone()));
    }

    fn on_error(&self, error: &CaptureError) {
        self.send_quietly(CaptureEvent::Error { error: error.clone() });
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.send_quietly(CaptureEvent::Finished(result.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_events_in_order() {
        let (subscriber, rx) = ChannelSubscriber::channel();
        subscriber.on_state_changed(CaptureState::Running);
        subscriber.on_duration(&DurationEvent::new(1));

        assert_eq!(
            rx.try_recv().unwrap(),
            CaptureEvent::StateChanged {
                state: CaptureState::Running
            }
        );
        assert_eq!(rx.try_recv().unwrap(), CaptureEvent::Duration(DurationEvent::new(1)));
    }

    #[test]
    fn chunk_to_closed_receiver_is_an_emit_error() {
        let (subscriber, rx) = ChannelSubscriber::channel();
        drop(rx);

        let chunk = ChunkEvent {
            data: "AA==".into(),
            size: 1,
            sequence: 0,
        };
        assert!(matches!(subscriber.on_chunk(&chunk), Err(CaptureError::Emit(_))));
        // other notifications stay silent
        subscriber.on_state_changed(CaptureState::Idle);
    }
}
