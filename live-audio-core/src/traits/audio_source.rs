use std::sync::Arc;

use crate::models::audio_models::{AudioFormat, SourceInfo};
use crate::models::error::CaptureError;
use crate::processing::buffer_pool::AudioBuffer;
use crate::processing::buffer_queue::BufferQueue;

/// Callback invoked by a source with each filled buffer.
///
/// Ownership of the buffer passes to the callee. May be invoked from the
/// source's own thread, concurrently with engine control calls.
pub type FilledBufferCallback = Arc<dyn Fn(AudioBuffer) + Send + Sync + 'static>;

/// Platform audio capture capability.
///
/// The source pops empty buffers from the `BufferQueue` it is given, fills
/// them with PCM bytes in the requested `AudioFormat`, and hands each filled
/// buffer to the callback. It must never block the device on an empty queue:
/// with no buffer available, samples are dropped.
///
/// Implemented by:
/// - `SyntheticSource` (tone generator, this crate)
/// - `CpalSource` (live-audio-cpal)
pub trait AudioSource: Send {
    /// Whether a device is present and could be acquired.
    fn is_available(&self) -> bool;

    /// Information about the device backing this source.
    fn source_info(&self) -> SourceInfo;

    /// Acquire the device and begin filling buffers from `queue`.
    ///
    /// Fails with `ResourceUnavailable` if the device cannot be acquired
    /// (permission denied, busy, unsupported format).
    fn start(
        &mut self,
        format: &AudioFormat,
        queue: BufferQueue,
        on_filled: FilledBufferCallback,
    ) -> Result<(), CaptureError>;

    /// Stop delivering filled buffers. Any partially filled buffer is emptied.
    fn pause(&mut self) -> Result<(), CaptureError>;

    /// Resume delivering filled buffers after `pause`.
    fn resume(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing and release the device.
    ///
    /// Synchronous: once this returns the callback is never invoked again and
    /// has been dropped. Returns the buffers the source was still holding
    /// outside the queue (e.g. one being filled).
    fn stop(&mut self) -> Result<Vec<AudioBuffer>, CaptureError>;
}
