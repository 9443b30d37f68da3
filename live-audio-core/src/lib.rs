//! # live-audio-core
//!
//! Platform-agnostic live audio capture core library.
//!
//! Cycles a fixed pool of buffers through an audio source, persists every
//! buffer filled while running to a file, streams it to a subscriber as an
//! encoded chunk, and counts running seconds. Platform backends (cpal)
//! implement the `AudioSource` trait and plug into the generic `CaptureEngine`.
//!
//! ## Architecture
//!
//! ```text
//! live-audio-core (this crate)
//! ├── traits/       ← AudioSource, CaptureSession, CaptureSubscriber, ChunkEncoder
//! ├── models/       ← CaptureError, CaptureState, AudioFormat, CaptureConfiguration, events
//! ├── processing/   ← BufferPool, BufferQueue, WAV header generation
//! ├── session/      ← CaptureEngine, DurationTracker, ChunkEmitter
//! ├── sources/      ← SyntheticSource (tone generator)
//! └── storage/      ← PcmFileWriter, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioFormat, CaptureDiagnostics, SampleEncoding, SourceInfo};
pub use models::config::{CaptureConfiguration, OutputContainer, StartRequest};
pub use models::error::CaptureError;
pub use models::events::{format_duration, CaptureEvent, ChunkEvent, DurationEvent};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use processing::buffer_pool::{AudioBuffer, BufferOwner, BufferPool, PoolCounts, POOL_SIZE};
pub use processing::buffer_queue::BufferQueue;
pub use session::capture_engine::CaptureEngine;
pub use session::channel_subscriber::ChannelSubscriber;
pub use session::chunk_emitter::ChunkEmitter;
pub use session::duration_tracker::DurationTracker;
pub use sources::synthetic::SyntheticSource;
pub use storage::file_sink::{FileSink, PcmFileWriter, SinkFactory, SinkSummary};
pub use traits::audio_source::{AudioSource, FilledBufferCallback};
pub use traits::capture_session::CaptureSession;
pub use traits::capture_subscriber::CaptureSubscriber;
pub use traits::chunk_encoder::{Base64Encoder, ChunkEncoder};
