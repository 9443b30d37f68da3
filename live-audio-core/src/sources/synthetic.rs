//! Synthetic tone source.
//!
//! Generates a sine tone in the requested PCM layout at real-time cadence:
//! each buffer is delivered once the wall-clock time it represents has
//! elapsed, the way a hardware input fills its queue.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::audio_models::{AudioFormat, SourceInfo};
use crate::models::error::CaptureError;
use crate::processing::buffer_pool::AudioBuffer;
use crate::processing::buffer_queue::BufferQueue;
use crate::traits::audio_source::{AudioSource, FilledBufferCallback};

/// How long the generator waits for a queued buffer before re-checking its flags.
const QUEUE_POLL: Duration = Duration::from_millis(50);

/// Granularity of the pacing sleep, bounding stop/pause latency.
const PACING_STEP: Duration = Duration::from_millis(5);

/// Sine-tone `AudioSource` on a dedicated thread.
pub struct SyntheticSource {
    frequency: f32,
    amplitude: f32,
    flags: Arc<Flags>,
    capture_handle: Option<thread::JoinHandle<Option<AudioBuffer>>>,
}

#[derive(Default)]
struct Flags {
    running: AtomicBool,
    paused: AtomicBool,
}

impl SyntheticSource {
    /// `amplitude` is relative to full scale and clamped to 0..=1.
    pub fn new(frequency: f32, amplitude: f32) -> Self {
        Self {
            frequency,
            amplitude: amplitude.clamp(0.0, 1.0),
            flags: Arc::new(Flags::default()),
            capture_handle: None,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(440.0, 0.5)
    }
}

impl AudioSource for SyntheticSource {
    fn is_available(&self) -> bool {
        true
    }

    fn source_info(&self) -> SourceInfo {
        SourceInfo {
            id: "synthetic".into(),
            name: format!("Synthetic tone ({} Hz)", self.frequency),
            is_default: false,
        }
    }

    fn start(
        &mut self,
        format: &AudioFormat,
        queue: BufferQueue,
        on_filled: FilledBufferCallback,
    ) -> Result<(), CaptureError> {
        if self.capture_handle.is_some() {
            return Err(CaptureError::InvalidState("synthetic source already running".into()));
        }

        let flags = Arc::new(Flags::default());
        flags.running.store(true, Ordering::SeqCst);
        self.flags = Arc::clone(&flags);

        let generator = ToneGenerator {
            format: *format,
            step: TAU * self.frequency / format.sample_rate as f32,
            amplitude: self.amplitude,
            phase: 0.0,
        };

        let handle = thread::Builder::new()
            .name("synthetic-capture".into())
            .spawn(move || generate_loop(flags, queue, on_filled, generator))
            .map_err(|e| CaptureError::ResourceUnavailable(format!("failed to spawn synthetic source: {}", e)))?;

        self.capture_handle = Some(handle);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        self.flags.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        self.flags.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<AudioBuffer>, CaptureError> {
        self.flags.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.capture_handle.take() else {
            return Ok(Vec::new());
        };
        let held = handle
            .join()
            .map_err(|_| CaptureError::Io("synthetic source thread panicked".into()))?;
        Ok(held.into_iter().collect())
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Synthetic source stop failed: {}", e);
        }
    }
}

struct ToneGenerator {
    format: AudioFormat,
    step: f32,
    amplitude: f32,
    phase: f32,
}

impl ToneGenerator {
    /// Fill `buffer` with whole frames of the tone.
    fn fill(&mut self, buffer: &mut AudioBuffer) {
        let frame = self.format.bytes_per_packet();
        let channels = self.format.channels as usize;
        let sixteen_bit = self.format.bits_per_sample == 16;

        let storage = buffer.storage_mut();
        let frames = storage.len() / frame;
        for frame_bytes in storage[..frames * frame].chunks_exact_mut(frame) {
            let value = self.phase.sin() * self.amplitude;
            self.phase = (self.phase + self.step) % TAU;

            if sixteen_bit {
                let sample = ((value * i16::MAX as f32) as i16).to_le_bytes();
                for channel in 0..channels {
                    frame_bytes[channel * 2..channel * 2 + 2].copy_from_slice(&sample);
                }
            } else {
                let sample = (value * 127.0 + 128.0).round().clamp(0.0, 255.0) as u8;
                frame_bytes[..channels].fill(sample);
            }
        }
        buffer.set_len(frames * frame);
    }
}

/// Generator loop. Returns the buffer it was holding when stopped.
fn generate_loop(
    flags: Arc<Flags>,
    queue: BufferQueue,
    on_filled: FilledBufferCallback,
    mut generator: ToneGenerator,
) -> Option<AudioBuffer> {
    let mut held: Option<AudioBuffer> = None;
    let mut deadline = Instant::now();

    while flags.running.load(Ordering::SeqCst) {
        if flags.paused.load(Ordering::SeqCst) {
            if let Some(buffer) = held.as_mut() {
                buffer.clear();
            }
            thread::sleep(PACING_STEP);
            deadline = Instant::now();
            continue;
        }

        let Some(mut buffer) = held.take().or_else(|| queue.pop_timeout(QUEUE_POLL)) else {
            // No buffer queued: the device would be dropping samples.
            continue;
        };

        let period = generator.format.buffer_duration(buffer.capacity());
        let now = Instant::now();
        if now > deadline + period {
            log::trace!("Synthetic source fell behind by {:?}", now - deadline);
            deadline = now;
        }
        deadline += period;

        // Pace to the wall-clock span the buffer represents.
        loop {
            if !flags.running.load(Ordering::SeqCst) || flags.paused.load(Ordering::SeqCst) {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(PACING_STEP));
        }
        if !flags.running.load(Ordering::SeqCst) || flags.paused.load(Ordering::SeqCst) {
            held = Some(buffer);
            continue;
        }

        generator.fill(&mut buffer);
        on_filled(buffer);
    }

    held
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::buffer_pool::BufferPool;
    use parking_lot::Mutex;

    fn collect() -> (Arc<Mutex<Vec<AudioBuffer>>>, FilledBufferCallback) {
        let filled = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&filled);
        (filled, Arc::new(move |buffer: AudioBuffer| sink.lock().push(buffer)))
    }

    #[test]
    fn delivers_full_buffers_at_real_time_cadence() {
        // 8 kHz mono 16-bit: 160 bytes = 10 ms
        let format = AudioFormat::pcm(8_000, 1, 16);
        let mut pool = BufferPool::new(3, 160, 2);
        let queue = BufferQueue::new();
        for _ in 0..3 {
            queue.push(pool.acquire().unwrap()).unwrap();
        }

        let (filled, on_filled) = collect();
        let mut source = SyntheticSource::default();
        let started = Instant::now();
        source.start(&format, queue.clone(), on_filled).unwrap();

        while filled.lock().len() < 3 && started.elapsed() < Duration::from_secs(2) {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(started.elapsed() >= Duration::from_millis(25));

        let leftovers = source.stop().unwrap();
        let filled = filled.lock();
        assert_eq!(filled.len(), 3);
        assert!(filled.iter().all(|b| b.is_full()));
        assert!(filled[0].bytes().iter().any(|&b| b != 0));
        assert!(leftovers.is_empty());
    }

    #[test]
    fn paused_source_delivers_nothing() {
        let format = AudioFormat::pcm(8_000, 1, 8);
        let mut pool = BufferPool::new(2, 80, 1);
        let queue = BufferQueue::new();
        queue.push(pool.acquire().unwrap()).unwrap();

        let (filled, on_filled) = collect();
        let mut source = SyntheticSource::default();
        source.start(&format, queue, on_filled).unwrap();
        source.pause().unwrap();

        thread::sleep(Duration::from_millis(60));
        assert!(filled.lock().is_empty());

        source.resume().unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(filled.lock().len(), 1);
        source.stop().unwrap();
    }

    #[test]
    fn stop_returns_the_buffer_being_filled() {
        let format = AudioFormat::pcm(8_000, 2, 16);
        // 1 s per buffer, so the generator is still holding it at stop
        let mut pool = BufferPool::new(1, 32_000, 4);
        let queue = BufferQueue::new();
        queue.push(pool.acquire().unwrap()).unwrap();

        let (filled, on_filled) = collect();
        let mut source = SyntheticSource::default();
        source.start(&format, queue, on_filled).unwrap();
        thread::sleep(Duration::from_millis(30));

        let leftovers = source.stop().unwrap();
        assert_eq!(leftovers.len(), 1);
        assert!(filled.lock().is_empty());
        assert!(source.stop().unwrap().is_empty());
    }

    #[test]
    fn eight_bit_tone_is_centred_on_128() {
        let format = AudioFormat::pcm(8_000, 1, 8);
        let mut pool = BufferPool::new(1, 8, 1);
        let mut buffer = pool.acquire().unwrap();
        let mut generator = ToneGenerator {
            format,
            step: 0.0,
            amplitude: 1.0,
            phase: 0.0,
        };

        generator.fill(&mut buffer);
        assert_eq!(buffer.bytes(), &[128; 8]);
    }
}
