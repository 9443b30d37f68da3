use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Highest sample rate accepted by `AudioFormat::validate`.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Sample encoding tag.
///
/// Only interleaved linear PCM is captured: 8-bit samples are unsigned,
/// 16-bit samples are signed little-endian (the WAV conventions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    #[default]
    #[serde(alias = "lpcm", alias = "PCM")]
    Pcm,
}

/// Format of the captured audio. Immutable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    #[serde(default)]
    pub encoding: SampleEncoding,
}

impl AudioFormat {
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            encoding: SampleEncoding::Pcm,
        }
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(CaptureError::InvalidFormat(format!(
                "unsupported sample rate: {}",
                self.sample_rate
            )));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(CaptureError::InvalidFormat(format!(
                "unsupported channel count: {}",
                self.channels
            )));
        }
        if ![8, 16].contains(&self.bits_per_sample) {
            return Err(CaptureError::InvalidFormat(format!(
                "unsupported bits per sample: {}",
                self.bits_per_sample
            )));
        }
        Ok(())
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes in one packet (one frame across all channels).
    pub fn bytes_per_packet(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.bytes_per_packet() as u64
    }

    /// Wall-clock time one buffer of `buffer_size` bytes represents.
    pub fn buffer_duration(&self, buffer_size: usize) -> std::time::Duration {
        let rate = self.byte_rate().max(1);
        std::time::Duration::from_nanos(buffer_size as u64 * 1_000_000_000 / rate)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::pcm(44_100, 1, 16)
    }
}

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Per-session counters for debugging capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    pub fill_callbacks: u64,
    pub buffers_dispatched: u64,
    pub buffers_dropped: u64,
    pub leading_buffers_discarded: u64,
    pub chunks_emitted: u64,
    pub emit_failures: u64,
    pub bytes_written: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn packet_and_byte_rate() {
        let format = AudioFormat::pcm(16_000, 1, 16);
        assert_eq!(format.bytes_per_packet(), 2);
        assert_eq!(format.byte_rate(), 32_000);
        assert_eq!(format.buffer_duration(2048), Duration::from_millis(64));

        let stereo8 = AudioFormat::pcm(8_000, 2, 8);
        assert_eq!(stereo8.bytes_per_packet(), 2);
    }

    #[test]
    fn rejects_unsupported_formats() {
        assert!(AudioFormat::pcm(0, 1, 16).validate().is_err());
        assert!(AudioFormat::pcm(44_100, 3, 16).validate().is_err());
        assert!(AudioFormat::pcm(44_100, 1, 24).validate().is_err());
        assert!(AudioFormat::pcm(MAX_SAMPLE_RATE + 1, 1, 16).validate().is_err());
        assert!(AudioFormat::pcm(48_000, 2, 8).validate().is_ok());
    }

    #[test]
    fn deserializes_encoding_aliases() {
        let format: AudioFormat = serde_json::from_str(
            r#"{"sampleRate":16000,"channels":1,"bitsPerSample":16,"encoding":"lpcm"}"#,
        )
        .unwrap();
        assert_eq!(format.encoding, SampleEncoding::Pcm);

        let unknown = serde_json::from_str::<AudioFormat>(
            r#"{"sampleRate":16000,"channels":1,"bitsPerSample":16,"encoding":"opus"}"#,
        );
        assert!(unknown.is_err());
    }
}
