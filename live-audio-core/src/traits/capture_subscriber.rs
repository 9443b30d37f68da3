use crate::models::error::CaptureError;
use crate::models::events::{ChunkEvent, DurationEvent};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Receives capture session notifications.
///
/// Methods are called from engine threads (drain worker, duration tracker,
/// or the caller of a control method), never from the audio source's
/// real-time thread. Implementations must not call back into the engine's
/// control methods and should hand work off to their own thread if needed.
pub trait CaptureSubscriber: Send + Sync {
    /// Called when the engine changes state.
    fn on_state_changed(&self, state: CaptureState);

    /// Called with each dispatched chunk, after it has been written to file.
    ///
    /// An error is logged and counted; it never stops the recording.
    fn on_chunk(&self, chunk: &ChunkEvent) -> Result<(), CaptureError>;

    /// Called once per second of running time.
    fn on_duration(&self, event: &DurationEvent);

    /// Called when an error terminates or disturbs the session.
    fn on_error(&self, error: &CaptureError);

    /// Called when the recording file has been finalized.
    fn on_capture_finished(&self, result: &RecordingResult);
}
