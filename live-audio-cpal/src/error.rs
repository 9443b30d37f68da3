use cpal::SampleFormat;
use thiserror::Error;

use live_audio_core::models::error::CaptureError;

/// Failures while acquiring an input device and opening its stream.
///
/// All of them surface to the engine as `ResourceUnavailable`.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no default input device")]
    NoDefaultDevice,

    #[error("no input device named '{0}'")]
    DeviceNotFound(String),

    #[error("device does not support {channels} channel(s) at {sample_rate} Hz")]
    UnsupportedConfig { channels: u16, sample_rate: u32 },

    #[error("unsupported device sample format: {0:?}")]
    UnsupportedSampleFormat(SampleFormat),

    #[error("failed to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query stream configurations: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("capture thread exited during setup")]
    ThreadExited,
}

impl From<SetupError> for CaptureError {
    fn from(error: SetupError) -> Self {
        CaptureError::ResourceUnavailable(error.to_string())
    }
}
