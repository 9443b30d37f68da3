//! End-to-end capture scenarios driven by the real-time synthetic source.

use std::fs;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_abs_diff_eq;

use live_audio_core::{
    AudioFormat, CaptureConfiguration, CaptureEngine, CaptureEvent, CaptureSession, CaptureState, ChannelSubscriber,
    OutputContainer, StartRequest, SyntheticSource,
};

fn engine_with_events(tick: Duration) -> (CaptureEngine<SyntheticSource>, Receiver<CaptureEvent>) {
    let engine = CaptureEngine::new(SyntheticSource::default()).with_tick_interval(tick);
    let (subscriber, rx) = ChannelSubscriber::channel();
    engine.set_subscriber(Arc::new(subscriber));
    (engine, rx)
}

fn first_chunk(rx: &Receiver<CaptureEvent>, timeout: Duration) -> Option<Instant> {
    let deadline = Instant::now() + timeout;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(CaptureEvent::Data(_)) => return Some(Instant::now()),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

#[test]
fn continuous_capture_matches_byte_rate() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, rx) = engine_with_events(Duration::from_secs(1));
    let format = AudioFormat::pcm(16_000, 1, 16);
    let buffer_size = 2048;
    let period = format.buffer_duration(buffer_size);

    let config = CaptureConfiguration {
        buffer_size,
        ..CaptureConfiguration::new(format, dir.path().join("take.pcm"))
    };
    let started = Instant::now();
    engine.start(config).unwrap();

    let first = first_chunk(&rx, Duration::from_secs(2)).expect("no chunk delivered");
    let latency = first - started;
    assert!(latency >= period / 2, "chunk after {:?}", latency);
    assert!(latency < period + Duration::from_millis(200), "chunk after {:?}", latency);

    thread::sleep(Duration::from_millis(1100).saturating_sub(started.elapsed()));
    let run = started.elapsed();
    let result = engine.stop().unwrap().unwrap();

    let expected = (format.byte_rate() as f64 * run.as_secs_f64()) as u64;
    assert!(
        result.bytes_written.abs_diff(expected) <= 2 * buffer_size as u64,
        "wrote {} bytes, expected about {}",
        result.bytes_written,
        expected
    );
    assert_eq!(fs::metadata(&result.file_path).unwrap().len(), result.bytes_written);
    assert_eq!(result.elapsed_secs, 1);
    assert_eq!(result.duration_text, "00:01");
}

#[test]
fn pause_right_after_start_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, rx) = engine_with_events(Duration::from_secs(1));
    let config = CaptureConfiguration {
        buffer_size: 2048,
        ..CaptureConfiguration::new(AudioFormat::pcm(16_000, 1, 16), dir.path().join("paused.pcm"))
    };

    engine.start(config).unwrap();
    assert_eq!(engine.pause().unwrap(), CaptureState::Paused);
    thread::sleep(Duration::from_millis(200));
    let result = engine.stop().unwrap().unwrap();

    assert_eq!(result.bytes_written, 0);
    assert_eq!(fs::metadata(&result.file_path).unwrap().len(), 0);
    assert!(!rx.try_iter().any(|event| matches!(event, CaptureEvent::Data(_))));
    assert_eq!(engine.state(), CaptureState::Idle);
}

#[test]
fn paused_time_is_excluded_from_duration_and_audio() {
    let dir = tempfile::tempdir().unwrap();
    // 50 ms ticks stand in for seconds
    let (engine, rx) = engine_with_events(Duration::from_millis(50));
    let format = AudioFormat::pcm(16_000, 1, 16);
    let config = CaptureConfiguration {
        buffer_size: 320,
        ..CaptureConfiguration::new(format, dir.path().join("gaps.pcm"))
    };

    engine.start(config).unwrap();
    thread::sleep(Duration::from_millis(250));
    engine.pause().unwrap();
    thread::sleep(Duration::from_millis(300));
    engine.resume().unwrap();
    thread::sleep(Duration::from_millis(150));
    let result = engine.stop().unwrap().unwrap();

    assert!((7..=9).contains(&result.elapsed_secs), "elapsed = {}", result.elapsed_secs);
    assert_abs_diff_eq!(result.audio_duration_secs, 0.4, epsilon = 0.08);

    let ticks: Vec<u64> = rx
        .try_iter()
        .filter_map(|event| match event {
            CaptureEvent::Duration(duration) => Some(duration.elapsed_seconds),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, (1..=result.elapsed_secs).collect::<Vec<_>>());
}

#[test]
fn start_request_json_produces_a_wav_recording() {
    let dir = tempfile::tempdir().unwrap();
    let request = StartRequest::from_json(
        r#"{"sampleRate":8000,"channels":2,"bitsPerSample":16,"encoding":"pcm","bufferSize":1600,"outputFileName":"meeting.wav"}"#,
    )
    .unwrap();
    let config = request.into_configuration(dir.path()).unwrap();
    assert_eq!(config.container, OutputContainer::Wav);

    let engine: Box<dyn CaptureSession> = Box::new(CaptureEngine::new(SyntheticSource::default()));
    engine.start(config).unwrap();
    thread::sleep(Duration::from_millis(180));
    let result = engine.stop().unwrap().unwrap();

    let data = fs::read(&result.file_path).unwrap();
    assert_eq!(&data[0..4], b"RIFF");
    assert_eq!(&data[8..12], b"WAVE");
    assert_eq!(data.len() as u64, 44 + result.bytes_written);
    assert!(result.bytes_written >= 1600);
    assert_eq!(result.checksum.len(), 64);
}
