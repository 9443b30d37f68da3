//! Input device enumeration via the cpal default host.
//!
//! cpal exposes no stable endpoint identifier on every backend, so the
//! device name doubles as its id.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use live_audio_core::models::audio_models::SourceInfo;
use live_audio_core::models::error::CaptureError;

use crate::error::SetupError;

const UNKNOWN_DEVICE: &str = "Unknown Device";

/// List the input devices of the default host.
pub fn list_input_devices() -> Result<Vec<SourceInfo>, CaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::ResourceUnavailable(format!("failed to list input devices: {}", e)))?;

    Ok(devices
        .map(|device| {
            let name = device.name().unwrap_or_else(|_| UNKNOWN_DEVICE.to_string());
            SourceInfo {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            }
        })
        .collect())
}

/// Whether the default host has a default input device.
pub fn default_input_available() -> bool {
    cpal::default_host().default_input_device().is_some()
}

/// Resolve an input device by name, or the default input when `name` is `None`.
pub(crate) fn find_input_device(host: &Host, name: Option<&str>) -> Result<Device, SetupError> {
    let Some(name) = name else {
        return host.default_input_device().ok_or(SetupError::NoDefaultDevice);
    };

    host.input_devices()?
        .find(|device| device.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| SetupError::DeviceNotFound(name.to_string()))
}
