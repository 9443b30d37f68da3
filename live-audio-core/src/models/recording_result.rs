use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::AudioFormat;
use super::config::OutputContainer;

/// Result returned when a capture session is stopped and its file finalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingResult {
    pub file_path: PathBuf,
    /// Seconds counted by the duration tracker (Running time only).
    pub elapsed_secs: u64,
    pub duration_text: String,
    /// Sample bytes written, excluding any container header.
    pub bytes_written: u64,
    pub packet_count: u64,
    /// Audio length implied by `packet_count` at the session's sample rate.
    pub audio_duration_secs: f64,
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub format: AudioFormat,
    pub container: OutputContainer,
    pub bytes_written: u64,
    pub packet_count: u64,
    pub elapsed_secs: u64,
    pub audio_duration_secs: f64,
    pub checksum: String,
    pub created_at: String,
}

impl RecordingMetadata {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: uuid::Uuid,
        file_path: &str,
        format: AudioFormat,
        container: OutputContainer,
        bytes_written: u64,
        packet_count: u64,
        elapsed_secs: u64,
        checksum: &str,
    ) -> Self {
        Self {
            id: session_id.to_string(),
            file_path: file_path.to_string(),
            format,
            container,
            bytes_written,
            packet_count,
            elapsed_secs,
            audio_duration_secs: packet_count as f64 / format.sample_rate as f64,
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
