use serde::Serialize;

use super::error::CaptureError;
use super::recording_result::RecordingResult;
use super::state::CaptureState;

/// One filled buffer's worth of audio, encoded for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEvent {
    /// Encoded chunk bytes (base64 by default).
    pub data: String,
    /// Byte count of the raw chunk before encoding.
    pub size: usize,
    /// Zero-based index of the chunk within the session.
    pub sequence: u64,
}

/// Elapsed recording time, delivered once per second while running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationEvent {
    pub elapsed_seconds: u64,
    pub formatted_text: String,
}

impl DurationEvent {
    pub fn new(elapsed_seconds: u64) -> Self {
        Self {
            elapsed_seconds,
            formatted_text: format_duration(elapsed_seconds),
        }
    }
}

/// Every notification a capture session produces, as one serializable envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CaptureEvent {
    StateChanged { state: CaptureState },
    Data(ChunkEvent),
    Duration(DurationEvent),
    Error { error: CaptureError },
    Finished(RecordingResult),
}

/// Format seconds as `mm:ss`, or `h:mm:ss` from one hour on.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(8), "00:08");
        assert_eq!(format_duration(125), "02:05");
        assert_eq!(format_duration(3599), "59:59");
    }

    #[test]
    fn formats_hours_once_reached() {
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3 * 3600 + 61), "3:01:01");
    }

    #[test]
    fn events_serialize_with_camel_case_names() {
        let duration = serde_json::to_value(DurationEvent::new(61)).unwrap();
        assert_eq!(duration["elapsedSeconds"], 61);
        assert_eq!(duration["formattedText"], "01:01");

        let chunk = serde_json::to_value(ChunkEvent {
            data: "AAA=".into(),
            size: 2,
            sequence: 0,
        })
        .unwrap();
        assert_eq!(chunk["data"], "AAA=");
        assert_eq!(chunk["size"], 2);
    }

    #[test]
    fn capture_events_are_tagged() {
        let event = serde_json::to_value(CaptureEvent::Duration(DurationEvent::new(5))).unwrap();
        assert_eq!(event["event"], "duration");
        assert_eq!(event["formattedText"], "00:05");

        let state = serde_json::to_value(CaptureEvent::StateChanged {
            state: CaptureState::Paused,
        })
        .unwrap();
        assert_eq!(state["event"], "stateChanged");
        assert_eq!(state["state"], "paused");

        let error = serde_json::to_value(CaptureEvent::Error {
            error: CaptureError::Io("disk full".into()),
        })
        .unwrap();
        assert_eq!(error["error"]["kind"], "io");
    }
}
