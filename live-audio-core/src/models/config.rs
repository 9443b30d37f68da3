use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::audio_models::{AudioFormat, SampleEncoding};
use super::error::CaptureError;

/// Default buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Largest buffer accepted by `CaptureConfiguration::validate`.
pub const MAX_BUFFER_SIZE: usize = 1 << 20;

/// Default output file name, relative to the host's output directory.
pub const DEFAULT_OUTPUT_FILE: &str = "audio.wav";

/// Container written around the raw sample bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputContainer {
    /// Flat append of raw sample bytes.
    #[default]
    Raw,
    /// Raw sample bytes behind a 44-byte RIFF/WAVE header patched on finalize.
    Wav,
}

impl OutputContainer {
    /// Picks WAV for `.wav` file names, raw otherwise.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("wav") => Self::Wav,
            _ => Self::Raw,
        }
    }
}

/// Configuration for one capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    /// Sample format requested from the audio source.
    pub format: AudioFormat,

    /// Size of each pool buffer in bytes (default: 2048).
    pub buffer_size: usize,

    /// File receiving the captured bytes. Fixed for the session.
    pub output_path: PathBuf,

    /// Container around the sample bytes (default: WAV, matching `audio.wav`).
    pub container: OutputContainer,

    /// Filled buffers dropped at the start of a session before dispatch begins.
    pub discard_leading_buffers: u32,

    /// Write a `.metadata.json` sidecar next to the recording on stop.
    pub write_metadata: bool,
}

impl CaptureConfiguration {
    /// Container is inferred from the file name.
    pub fn new(format: AudioFormat, output_path: impl Into<PathBuf>) -> Self {
        let output_path = output_path.into();
        Self {
            format,
            container: OutputContainer::for_path(&output_path),
            output_path,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        self.format.validate()?;

        let packet = self.format.bytes_per_packet();
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(CaptureError::InvalidFormat(format!(
                "unsupported buffer size: {}",
                self.buffer_size
            )));
        }
        if self.buffer_size % packet != 0 {
            return Err(CaptureError::InvalidFormat(format!(
                "buffer size {} is not a multiple of the {}-byte frame",
                self.buffer_size, packet
            )));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(CaptureError::InvalidFormat("output path is empty".into()));
        }
        Ok(())
    }

    /// Packets (frames) held by one full buffer.
    pub fn packets_per_buffer(&self) -> usize {
        self.buffer_size / self.format.bytes_per_packet()
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            container: OutputContainer::Wav,
            discard_leading_buffers: 0,
            write_metadata: false,
        }
    }
}

/// Start request as delivered by a host bridge.
///
/// ```json
/// {"sampleRate": 16000, "channels": 1, "bitsPerSample": 16,
///  "encoding": "pcm", "bufferSize": 2048, "outputFileName": "take.wav"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartRequest {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bits_per_sample: Option<u16>,
    pub encoding: Option<SampleEncoding>,
    pub buffer_size: Option<usize>,
    #[serde(alias = "wavFile")]
    pub output_file_name: Option<String>,
    /// Platform input-source selector sent by mobile hosts. Accepted and ignored.
    pub audio_source: Option<i32>,
    pub container: Option<OutputContainer>,
    pub discard_leading_buffers: Option<u32>,
    pub write_metadata: Option<bool>,
}

impl StartRequest {
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        serde_json::from_str(json)
            .map_err(|e| CaptureError::InvalidFormat(format!("malformed start request: {}", e)))
    }

    /// Resolve into a validated configuration.
    ///
    /// Relative file names are joined onto `output_dir`; absolute paths are kept.
    pub fn into_configuration(self, output_dir: &Path) -> Result<CaptureConfiguration, CaptureError> {
        if let Some(audio_source) = self.audio_source {
            log::debug!("Ignoring platform audio source selector {}", audio_source);
        }

        let defaults = CaptureConfiguration::default();
        let default_format = defaults.format;

        let format = AudioFormat {
            sample_rate: self.sample_rate.unwrap_or(default_format.sample_rate),
            channels: self.channels.unwrap_or(default_format.channels),
            bits_per_sample: self.bits_per_sample.unwrap_or(default_format.bits_per_sample),
            encoding: self.encoding.unwrap_or_default(),
        };

        let file_name = self
            .output_file_name
            .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string());
        let output_path = output_dir.join(file_name);
        let container = self
            .container
            .unwrap_or_else(|| OutputContainer::for_path(&output_path));

        let config = CaptureConfiguration {
            format,
            buffer_size: self.buffer_size.unwrap_or(defaults.buffer_size),
            output_path,
            container,
            discard_leading_buffers: self
                .discard_leading_buffers
                .unwrap_or(defaults.discard_leading_buffers),
            write_metadata: self.write_metadata.unwrap_or(defaults.write_metadata),
        };
        config.validate()?;
        Ok(config)
    }
}
