use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::events::ChunkEvent;
use crate::traits::capture_subscriber::CaptureSubscriber;
use crate::traits::chunk_encoder::ChunkEncoder;

/// Encodes drained chunks and forwards them to the subscriber.
///
/// Stateless apart from its collaborators; failures are returned for the
/// caller to log and count, never escalated.
#[derive(Clone)]
pub struct ChunkEmitter {
    encoder: Arc<dyn ChunkEncoder>,
    subscriber: Option<Arc<dyn CaptureSubscriber>>,
}

impl ChunkEmitter {
    pub fn new(encoder: Arc<dyn ChunkEncoder>, subscriber: Option<Arc<dyn CaptureSubscriber>>) -> Self {
        Self { encoder, subscriber }
    }

    /// Name of the chunk text representation.
    pub fn encoding(&self) -> &str {
        self.encoder.name()
    }

    /// Encode `bytes` and notify the subscriber.
    ///
    /// Returns `Ok(false)` when nobody is subscribed (nothing encoded).
    pub fn emit(&self, bytes: &[u8], sequence: u64) -> Result<bool, CaptureError> {
        let Some(subscriber) = &self.subscriber else {
            return Ok(false);
        };

        let event = ChunkEvent {
            data: self.encoder.encode(bytes),
            size: bytes.len(),
            sequence,
        };
        subscriber.on_chunk(&event).map_err(|e| match e {
            CaptureError::Emit(_) => e,
            other => CaptureError::Emit(other.to_string()),
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::events::DurationEvent;
    use crate::models::recording_result::RecordingResult;
    use crate::models::state::CaptureState;
    use crate::traits::chunk_encoder::Base64Encoder;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collector {
        chunks: Mutex<Vec<ChunkEvent>>,
        fail: bool,
    }

    impl CaptureSubscriber for Collector {
        fn on_state_changed(&self, _state: CaptureState) {}

        fn on_chunk(&self, chunk: &ChunkEvent) -> Result<(), CaptureError> {
            if self.fail {
                return Err(CaptureError::Io("bridge closed".into()));
            }
            self.chunks.lock().push(chunk.clone());
            Ok(())
        }

        fn on_duration(&self, _event: &DurationEvent) {}
        fn on_error(&self, _error: &CaptureError) {}
        fn on_capture_finished(&self, _result: &RecordingResult) {}
    }

    #[test]
    fn emits_encoded_chunk() {
        let collector = Arc::new(Collector::default());
        let emitter = ChunkEmitter::new(Arc::new(Base64Encoder), Some(collector.clone()));

        assert!(emitter.emit(&[0x00, 0x01, 0xff], 4).unwrap());

        let chunks = collector.chunks.lock();
        assert_eq!(
            chunks[0],
            ChunkEvent {
                data: "AAH/".into(),
                size: 3,
                sequence: 4
            }
        );
    }

    #[test]
    fn reports_encoder_name() {
        let emitter = ChunkEmitter::new(Arc::new(Base64Encoder), None);
        assert_eq!(emitter.encoding(), "base64");
    }

    #[test]
    fn subscriber_failures_become_emit_errors() {
        let collector = Arc::new(Collector {
            fail: true,
            ..Default::default()
        });
        let emitter = ChunkEmitter::new(Arc::new(Base64Encoder), Some(collector));

        assert!(matches!(emitter.emit(&[1, 2], 0), Err(CaptureError::Emit(_))));
    }

    #[test]
    fn without_subscriber_nothing_is_emitted() {
        let emitter = ChunkEmitter::new(Arc::new(Base64Encoder), None);
        assert!(!emitter.emit(&[1, 2], 0).unwrap());
    }
}
