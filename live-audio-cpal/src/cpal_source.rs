//! cpal microphone source.
//!
//! Opens an input device on a dedicated thread that owns the cpal stream
//! (streams are not `Send` on every backend). The device callback converts
//! the native sample type to the requested PCM layout and copies it into
//! the buffer at the head of the engine's queue. It never waits for a
//! buffer: with none queued, samples are dropped and counted as an overrun.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfigRange};
use parking_lot::Mutex;

use live_audio_core::models::audio_models::{AudioFormat, SourceInfo};
use live_audio_core::models::error::CaptureError;
use live_audio_core::processing::buffer_pool::AudioBuffer;
use live_audio_core::processing::buffer_queue::BufferQueue;
use live_audio_core::traits::audio_source::{AudioSource, FilledBufferCallback};

use crate::device_enumerator::find_input_device;
use crate::error::SetupError;

/// Microphone capture through cpal.
pub struct CpalSource {
    device_name: Option<String>,
    capture: Option<CaptureThread>,
}

struct CaptureThread {
    commands: Sender<StreamCommand>,
    handle: thread::JoinHandle<Option<AudioBuffer>>,
    filler: Arc<Mutex<BufferFiller>>,
}

enum StreamCommand {
    Pause,
    Resume,
    Stop,
}

impl CpalSource {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            capture: None,
        }
    }

    /// Capture from the input device with this name (see `list_input_devices`).
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            capture: None,
        }
    }

    /// Callbacks whose samples were dropped because no buffer was queued.
    pub fn overruns(&self) -> u64 {
        self.capture.as_ref().map_or(0, |c| c.filler.lock().overruns)
    }
}

impl AudioSource for CpalSource {
    fn is_available(&self) -> bool {
        find_input_device(&cpal::default_host(), self.device_name.as_deref()).is_ok()
    }

    fn source_info(&self) -> SourceInfo {
        let name = self
            .device_name
            .clone()
            .unwrap_or_else(|| "Default Microphone".to_string());
        SourceInfo {
            id: self.device_name.clone().unwrap_or_else(|| "default-input".into()),
            name,
            is_default: self.device_name.is_none(),
        }
    }

    fn start(
        &mut self,
        format: &AudioFormat,
        queue: BufferQueue,
        on_filled: FilledBufferCallback,
    ) -> Result<(), CaptureError> {
        if self.capture.is_some() {
            return Err(CaptureError::InvalidState("microphone capture already running".into()));
        }

        let filler = Arc::new(Mutex::new(BufferFiller::new(queue, on_filled)));
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let device_name = self.device_name.clone();
        let format = *format;
        let stream_filler = Arc::clone(&filler);
        let handle = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || capture_loop(device_name, format, stream_filler, command_rx, ready_tx))
            .map_err(|e| CaptureError::ResourceUnavailable(format!("failed to spawn capture thread: {}", e)))?;

        let setup = ready_rx.recv().unwrap_or(Err(SetupError::ThreadExited));
        if let Err(e) = setup {
            if handle.join().is_err() {
                log::error!("Capture thread panicked during setup");
            }
            return Err(e.into());
        }

        log::info!(
            "Microphone capture started on '{}'",
            self.device_name.as_deref().unwrap_or("default input")
        );
        self.capture = Some(CaptureThread {
            commands: command_tx,
            handle,
            filler,
        });
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        let capture = self
            .capture
            .as_ref()
            .ok_or_else(|| CaptureError::InvalidState("microphone capture not running".into()))?;
        capture.filler.lock().set_paused(true);
        capture
            .commands
            .send(StreamCommand::Pause)
            .map_err(|_| CaptureError::ResourceUnavailable("capture thread is gone".into()))
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        let capture = self
            .capture
            .as_ref()
            .ok_or_else(|| CaptureError::InvalidState("microphone capture not running".into()))?;
        capture
            .commands
            .send(StreamCommand::Resume)
            .map_err(|_| CaptureError::ResourceUnavailable("capture thread is gone".into()))?;
        capture.filler.lock().set_paused(false);
        Ok(())
    }

    fn stop(&mut self) -> Result<Vec<AudioBuffer>, CaptureError> {
        let Some(capture) = self.capture.take() else {
            return Ok(Vec::new());
        };
        // A send error means the thread already exited; join regardless.
        let _ = capture.commands.send(StreamCommand::Stop);
        let held = capture
            .handle
            .join()
            .map_err(|_| CaptureError::Io("capture thread panicked".into()))?;

        let overruns = capture.filler.lock().overruns;
        if overruns > 0 {
            log::warn!("Microphone capture dropped samples {} time(s): no buffer queued", overruns);
        }
        log::info!("Microphone capture stopped");
        Ok(held.into_iter().collect())
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Microphone capture stop failed: {}", e);
        }
    }
}

/// Copies converted sample bytes into queued buffers.
struct BufferFiller {
    queue: BufferQueue,
    on_filled: FilledBufferCallback,
    current: Option<AudioBuffer>,
    paused: bool,
    overruns: u64,
}

impl BufferFiller {
    fn new(queue: BufferQueue, on_filled: FilledBufferCallback) -> Self {
        Self {
            queue,
            on_filled,
            current: None,
            paused: false,
            overruns: 0,
        }
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if paused {
            if let Some(buffer) = self.current.as_mut() {
                buffer.clear();
            }
        }
    }

    fn push_bytes(&mut self, mut bytes: &[u8]) {
        if self.paused {
            return;
        }
        while !bytes.is_empty() {
            if self.current.is_none() {
                self.current = self.queue.try_pop();
            }
            let Some(buffer) = self.current.as_mut() else {
                self.overruns += 1;
                log::trace!("No buffer queued, dropped {} bytes", bytes.len());
                return;
            };

            let copied = buffer.extend_from_slice(bytes);
            bytes = &bytes[copied..];
            if buffer.is_full() {
                if let Some(full) = self.current.take() {
                    (self.on_filled)(full);
                }
            }
        }
    }
}

/// Capture thread body. Returns the partially filled buffer it held, if any.
fn capture_loop(
    device_name: Option<String>,
    format: AudioFormat,
    filler: Arc<Mutex<BufferFiller>>,
    commands: Receiver<StreamCommand>,
    ready: SyncSender<Result<(), SetupError>>,
) -> Option<AudioBuffer> {
    let stream = match open_stream(device_name.as_deref(), &format, Arc::clone(&filler)) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(e));
            return filler.lock().current.take();
        }
    };
    let _ = ready.send(Ok(()));

    while let Ok(command) = commands.recv() {
        match command {
            StreamCommand::Pause => {
                if let Err(e) = stream.pause() {
                    // Samples still arrive but the filler discards them.
                    log::warn!("Input stream does not support pausing: {}", e);
                }
            }
            StreamCommand::Resume => {
                if let Err(e) = stream.play() {
                    log::error!("Failed to resume input stream: {}", e);
                }
            }
            StreamCommand::Stop => break,
        }
    }

    drop(stream);
    filler.lock().current.take()
}

fn open_stream(
    device_name: Option<&str>,
    format: &AudioFormat,
    filler: Arc<Mutex<BufferFiller>>,
) -> Result<Stream, SetupError> {
    let host = cpal::default_host();
    let device = find_input_device(&host, device_name)?;
    let (config, sample_format) = select_config(&device, format)?;
    log::debug!(
        "Opening input stream: {:?}, {} ch @ {} Hz",
        sample_format,
        config.channels,
        config.sample_rate.0
    );

    let bits = format.bits_per_sample;
    let stream = match sample_format {
        SampleFormat::I8 => build_stream::<i8>(&device, &config, filler, bits)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, filler, bits)?,
        SampleFormat::I32 => build_stream::<i32>(&device, &config, filler, bits)?,
        SampleFormat::U8 => build_stream::<u8>(&device, &config, filler, bits)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, filler, bits)?,
        SampleFormat::U32 => build_stream::<u32>(&device, &config, filler, bits)?,
        SampleFormat::F32 => build_stream::<f32>(&device, &config, filler, bits)?,
        SampleFormat::F64 => build_stream::<f64>(&device, &config, filler, bits)?,
        other => return Err(SetupError::UnsupportedSampleFormat(other)),
    };
    stream.play()?;
    Ok(stream)
}

/// Pick a supported configuration with exactly the requested channels and rate.
fn select_config(device: &Device, format: &AudioFormat) -> Result<(StreamConfig, SampleFormat), SetupError> {
    let rate = cpal::SampleRate(format.sample_rate);
    let mut candidates: Vec<SupportedStreamConfigRange> = device
        .supported_input_configs()?
        .filter(|c| c.channels() == format.channels && c.min_sample_rate() <= rate && rate <= c.max_sample_rate())
        .collect();
    candidates.sort_by_key(|c| conversion_cost(c.sample_format(), format.bits_per_sample));

    let chosen = candidates
        .into_iter()
        .next()
        .ok_or(SetupError::UnsupportedConfig {
            channels: format.channels,
            sample_rate: format.sample_rate,
        })?;
    let sample_format = chosen.sample_format();
    Ok((chosen.with_sample_rate(rate).config(), sample_format))
}

/// Lower is better: native matches first, then float, then anything else.
fn conversion_cost(sample_format: SampleFormat, bits_per_sample: u16) -> u8 {
    match (sample_format, bits_per_sample) {
        (SampleFormat::I16, 16) | (SampleFormat::U8, 8) => 0,
        (SampleFormat::F32, _) => 1,
        (SampleFormat::I16, _) | (SampleFormat::U8, _) => 2,
        _ => 3,
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    filler: Arc<Mutex<BufferFiller>>,
    bits_per_sample: u16,
) -> Result<Stream, SetupError>
where
    T: SizedSample + Send + 'static,
    i16: FromSample<T>,
    u8: FromSample<T>,
{
    let mut scratch = Vec::new();
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            encode_samples(data, bits_per_sample, &mut scratch);
            filler.lock().push_bytes(&scratch);
        },
        |err| log::error!("Input stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// Convert interleaved device samples to PCM bytes: unsigned 8-bit, or
/// signed 16-bit little-endian.
fn encode_samples<T>(samples: &[T], bits_per_sample: u16, out: &mut Vec<u8>)
where
    T: SizedSample,
    i16: FromSample<T>,
    u8: FromSample<T>,
{
    out.clear();
    if bits_per_sample == 8 {
        out.extend(samples.iter().map(|&s| <u8 as cpal::Sample>::from_sample(s)));
    } else {
        out.reserve(samples.len() * 2);
        for &sample in samples {
            let value: i16 = cpal::Sample::from_sample(sample);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}
