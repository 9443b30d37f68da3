use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Sidecar path for a recording: `{recording_path}.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    let mut name = recording_path.as_os_str().to_owned();
    name.push(".metadata.json");
    PathBuf::from(name)
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<PathBuf, CaptureError> {
    let path = metadata_path(recording_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::Io(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&path, json).map_err(|e| CaptureError::Io(format!("failed to write metadata: {}", e)))?;
    Ok(path)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::Io(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::Io(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::AudioFormat;
    use crate::models::config::OutputContainer;

    #[test]
    fn sidecar_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let recording = dir.path().join("take.wav");
        let metadata = RecordingMetadata::new(
            uuid::Uuid::new_v4(),
            &recording.to_string_lossy(),
            AudioFormat::pcm(16_000, 1, 16),
            OutputContainer::Wav,
            32_000,
            16_000,
            1,
            "deadbeef",
        );

        let written = write_metadata(&metadata, &recording).unwrap();
        assert_eq!(written, dir.path().join("take.wav.metadata.json"));
        assert_eq!(read_metadata(&recording).unwrap(), metadata);
        approx::assert_relative_eq!(metadata.audio_duration_secs, 1.0);
    }

    #[test]
    fn missing_sidecar_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_metadata(&dir.path().join("nothing.pcm")),
            Err(CaptureError::Io(_))
        ));
    }
}
