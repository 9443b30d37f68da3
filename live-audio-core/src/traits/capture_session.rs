use crate::models::audio_models::CaptureDiagnostics;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Control surface of a capture session, object-safe for host bridges.
pub trait CaptureSession: Send + Sync {
    /// Current engine state.
    fn state(&self) -> CaptureState;

    /// Seconds of running time in the current session.
    fn elapsed_seconds(&self) -> u64;

    /// Counters for the current (or last) session.
    fn diagnostics(&self) -> CaptureDiagnostics;

    /// Open the output and start capturing. Transitions: idle → running.
    fn start(&self, config: CaptureConfiguration) -> Result<(), CaptureError>;

    /// Transitions: running → paused.
    fn pause(&self) -> Result<CaptureState, CaptureError>;

    /// Transitions: paused → running.
    fn resume(&self) -> Result<CaptureState, CaptureError>;

    /// Finalize the recording. Transitions: running/paused → stopped → idle.
    /// Returns `None` when no session was active.
    fn stop(&self) -> Result<Option<RecordingResult>, CaptureError>;
}
