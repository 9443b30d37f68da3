//! Microphone access probe.
//!
//! Operating systems gate microphone access differently (privacy toggles,
//! per-app consent, PipeWire portals). The common observable is whether the
//! default input device will report a usable configuration.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::DefaultStreamConfigError;

use live_audio_core::models::error::CaptureError;

/// Check if microphone access is available.
///
/// Returns `Ok(false)` when there is no default input device or the device
/// refuses to report a configuration.
pub fn check_microphone_access() -> Result<bool, CaptureError> {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        return Ok(false);
    };

    match device.default_input_config() {
        Ok(_) => Ok(true),
        Err(DefaultStreamConfigError::DeviceNotAvailable) => Ok(false),
        Err(DefaultStreamConfigError::StreamTypeNotSupported) => Ok(false),
        Err(e) => {
            // Other error: assume available but report
            log::warn!("Unexpected error checking microphone access: {}", e);
            Ok(true)
        }
    }
}
