//! # live-audio-cpal
//!
//! Microphone backend for live-audio-core, built on cpal.
//!
//! Provides:
//! - `CpalSource`: `AudioSource` capturing from the default or a named input device
//! - `device_enumerator`: input device listing and default-device probe
//! - `permissions`: microphone access check
//!
//! ## Platform Requirements
//! - Linux: ALSA development headers (`libasound2-dev`) for linking
//! - macOS/Windows: no extra requirements
//!
//! ## Usage
//! ```ignore
//! use live_audio_cpal::CpalSource;
//! use live_audio_core::{AudioFormat, CaptureConfiguration, CaptureEngine};
//!
//! let engine = CaptureEngine::new(CpalSource::default_device());
//! engine.start(CaptureConfiguration::new(AudioFormat::pcm(16_000, 1, 16), "take.wav"))?;
//! ```

pub mod cpal_source;
pub mod device_enumerator;
pub mod error;
pub mod permissions;

pub use cpal_source::CpalSource;
pub use device_enumerator::{default_input_available, list_input_devices};
pub use error::SetupError;
pub use permissions::check_microphone_access;
