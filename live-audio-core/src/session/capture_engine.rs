use std::fs;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex, RwLock};
use uuid::Uuid;

use crate::models::audio_models::{CaptureDiagnostics, SourceInfo};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::events::{format_duration, DurationEvent};
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::buffer_pool::{AudioBuffer, BufferPool, PoolCounts, POOL_SIZE};
use crate::processing::buffer_queue::BufferQueue;
use crate::session::chunk_emitter::ChunkEmitter;
use crate::session::drain::{self, DrainHandle, DrainHost, DrainJob, DrainOutcome};
use crate::session::duration_tracker::{DurationTracker, TICK_INTERVAL};
use crate::storage::file_sink::{open_file_sink, SinkFactory, SinkSummary};
use crate::storage::metadata;
use crate::traits::audio_source::{AudioSource, FilledBufferCallback};
use crate::traits::capture_session::CaptureSession;
use crate::traits::capture_subscriber::CaptureSubscriber;
use crate::traits::chunk_encoder::{Base64Encoder, ChunkEncoder};

/// Default bound on how long `pause()` waits for in-flight drains.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Capture session orchestrator.
///
/// Drives one `AudioSource` through the session state machine and routes
/// every buffer it fills:
/// ```text
/// [AudioSource] → filled buffer → (Running?) ─yes→ [drain worker] → FileSink.write → ChunkEmitter.emit
///       ↑                             │ no                                              │
///       └──────── BufferQueue ←───────┴──────────────── BufferPool ←────────────────────┘
/// ```
///
/// Two locks, always taken in this order:
/// - `control` serializes `start`/`pause`/`resume`/`stop` and owns the source,
///   the duration tracker and the drain worker handle.
/// - `shared` guards the state, the buffer pool and the counters. The source
///   callback, the drain worker and the tracker only ever take this one.
///
/// Subscriber callbacks are invoked without `shared` held.
pub struct CaptureEngine<S: AudioSource + 'static> {
    inner: Arc<EngineInner<S>>,
}

struct EngineInner<S: AudioSource + 'static> {
    control: Mutex<Control<S>>,
    shared: Mutex<Shared>,
    drained: Condvar,
    subscriber: RwLock<Option<Arc<dyn CaptureSubscriber>>>,
}

struct Control<S> {
    source: S,
    tracker: DurationTracker,
    drain_handle: Option<DrainHandle>,
    encoder: Arc<dyn ChunkEncoder>,
    sink_factory: SinkFactory,
    drain_timeout: Duration,
}

struct Shared {
    state: CaptureState,
    session: Option<ActiveSession>,
    diagnostics: CaptureDiagnostics,
    last_error: Option<CaptureError>,
}

/// Per-session pipeline state. Dropped when the session is stopped.
struct ActiveSession {
    id: Uuid,
    config: CaptureConfiguration,
    pool: BufferPool,
    queue: BufferQueue,
    drain_tx: Option<Sender<DrainJob>>,
    packet_position: u64,
    elapsed_secs: u64,
    next_sequence: u64,
    leading_to_discard: u32,
    fault: Option<CaptureError>,
}

impl ActiveSession {
    /// Return a buffer to the pool, handing free buffers back to the source if `requeue`.
    fn recycle(&mut self, buffer: AudioBuffer, requeue: bool) {
        if let Err(e) = self.pool.release(buffer) {
            log::warn!("Failed to recycle buffer: {}", e);
            return;
        }
        if requeue {
            self.refill_queue();
        }
    }

    fn refill_queue(&mut self) {
        while self.pool.free_count() > 0 {
            let Ok(buffer) = self.pool.acquire() else {
                break;
            };
            if let Err(refused) = self.queue.push(buffer) {
                // queue closed by teardown
                if let Err(e) = self.pool.release(refused) {
                    log::warn!("Failed to return refused buffer: {}", e);
                }
                break;
            }
        }
    }
}

impl<S: AudioSource + 'static> CaptureEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                control: Mutex::new(Control {
                    source,
                    tracker: DurationTracker::new(TICK_INTERVAL),
                    drain_handle: None,
                    encoder: Arc::new(Base64Encoder),
                    sink_factory: Box::new(open_file_sink),
                    drain_timeout: DRAIN_TIMEOUT,
                }),
                shared: Mutex::new(Shared {
                    state: CaptureState::Idle,
                    session: None,
                    diagnostics: CaptureDiagnostics::default(),
                    last_error: None,
                }),
                drained: Condvar::new(),
                subscriber: RwLock::new(None),
            }),
        }
    }

    /// Replace the chunk encoder (default: base64).
    pub fn with_encoder(self, encoder: Arc<dyn ChunkEncoder>) -> Self {
        self.inner.control.lock().encoder = encoder;
        self
    }

    /// Replace how the per-session sink is opened (default: `PcmFileWriter`).
    pub fn with_sink_factory(self, factory: SinkFactory) -> Self {
        self.inner.control.lock().sink_factory = factory;
        self
    }

    /// Change the duration tick interval (default: one second).
    pub fn with_tick_interval(self, interval: Duration) -> Self {
        self.inner.control.lock().tracker = DurationTracker::new(interval);
        self
    }

    /// Change how long `pause()` waits for in-flight drains (default: two seconds).
    pub fn with_drain_timeout(self, timeout: Duration) -> Self {
        self.inner.control.lock().drain_timeout = timeout;
        self
    }

    /// Set the notification subscriber.
    ///
    /// Chunk delivery uses the subscriber present when `start()` was called;
    /// other notifications always go to the current one.
    pub fn set_subscriber(&self, subscriber: Arc<dyn CaptureSubscriber>) {
        *self.inner.subscriber.write() = Some(subscriber);
    }

    pub fn clear_subscriber(&self) {
        *self.inner.subscriber.write() = None;
    }

    pub fn state(&self) -> CaptureState {
        self.inner.shared.lock().state
    }

    /// Seconds of Running time in the active session (0 when idle).
    pub fn elapsed_seconds(&self) -> u64 {
        self.inner
            .shared
            .lock()
            .session
            .as_ref()
            .map_or(0, |s| s.elapsed_secs)
    }

    /// Packets persisted to the sink in the active session (0 when idle).
    pub fn packet_position(&self) -> u64 {
        self.inner
            .shared
            .lock()
            .session
            .as_ref()
            .map_or(0, |s| s.packet_position)
    }

    /// Buffer ownership in the active session's pool.
    pub fn buffer_counts(&self) -> Option<PoolCounts> {
        self.inner.shared.lock().session.as_ref().map(|s| s.pool.counts())
    }

    /// Counters for the current or most recent session.
    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.inner.shared.lock().diagnostics.clone()
    }

    /// The last error that disturbed a session, cleared on `start()`.
    pub fn last_error(&self) -> Option<CaptureError> {
        self.inner.shared.lock().last_error.clone()
    }

    pub fn source_info(&self) -> SourceInfo {
        self.inner.control.lock().source.source_info()
    }

    /// Open the output, hand all pool buffers to the source and start capturing.
    ///
    /// All-or-nothing: on failure nothing is left running and a partially
    /// created output file is removed.
    pub fn start(&self, config: CaptureConfiguration) -> Result<(), CaptureError> {
        let inner = &self.inner;
        let mut control = inner.control.lock();

        let state = inner.shared.lock().state;
        if !state.is_idle() {
            return Err(CaptureError::InvalidState(format!("cannot start while {}", state)));
        }

        config.validate()?;
        if !control.source.is_available() {
            return Err(CaptureError::ResourceUnavailable(format!(
                "audio source '{}' is not available",
                control.source.source_info().name
            )));
        }

        let sink = (control.sink_factory)(&config)?;

        let pool = BufferPool::new(POOL_SIZE, config.buffer_size, config.format.bytes_per_packet());
        let queue = BufferQueue::new();
        let (drain_tx, drain_rx) = mpsc::channel();
        let emitter = ChunkEmitter::new(Arc::clone(&control.encoder), inner.subscriber());
        let encoding = emitter.encoding().to_string();
        let host: Arc<dyn DrainHost> = Arc::clone(inner) as Arc<dyn DrainHost>;
        let handle = match drain::spawn_worker(drain_rx, sink, emitter, host) {
            Ok(handle) => handle,
            Err(e) => {
                remove_partial_output(&config);
                return Err(e);
            }
        };
        control.drain_handle = Some(handle);

        let mut session = ActiveSession {
            id: Uuid::new_v4(),
            config: config.clone(),
            pool,
            queue: queue.clone(),
            drain_tx: Some(drain_tx),
            packet_position: 0,
            elapsed_secs: 0,
            next_sequence: 0,
            leading_to_discard: config.discard_leading_buffers,
            fault: None,
        };
        session.refill_queue();
        let session_id = session.id;

        {
            let mut shared = inner.shared.lock();
            shared.session = Some(session);
            shared.state = CaptureState::Running;
            shared.diagnostics = CaptureDiagnostics::default();
            shared.last_error = None;
        }

        let on_filled = inner.filled_callback();
        if let Err(e) = control.source.start(&config.format, queue, on_filled) {
            inner.abort_start(&mut control, false);
            return Err(match e {
                CaptureError::ResourceUnavailable(_) | CaptureError::InvalidFormat(_) => e,
                other => CaptureError::ResourceUnavailable(other.to_string()),
            });
        }

        control.tracker.reset();
        let on_tick = inner.tick_callback();
        if let Err(e) = control.tracker.start(on_tick) {
            inner.abort_start(&mut control, true);
            return Err(e);
        }

        log::info!(
            "Capture session {} started: {} Hz, {} ch, {}-bit, {}-byte buffers → {}, {} chunks",
            session_id,
            config.format.sample_rate,
            config.format.channels,
            config.format.bits_per_sample,
            config.buffer_size,
            config.output_path.display(),
            encoding
        );
        inner.notify_state(CaptureState::Running);
        Ok(())
    }

    /// Stop dispatching filled buffers and freeze the duration counter.
    ///
    /// Buffers already dispatched are drained before this returns, bounded
    /// by the drain timeout. Buffers filled while paused are recycled unwritten.
    ///
    /// If the sink is still blocked when the timeout expires, `pause()` returns
    /// anyway. That buffer's write completes later and advances the packet
    /// position once while paused; nothing dispatched after the pause does.
    pub fn pause(&self) -> Result<CaptureState, CaptureError> {
        let inner = &self.inner;
        let mut control = inner.control.lock();
        {
            let mut shared = inner.shared.lock();
            if !shared.state.is_running() {
                return Err(CaptureError::InvalidState(format!("cannot pause while {}", shared.state)));
            }
            shared.state = CaptureState::Paused;
        }

        if let Err(e) = control.source.pause() {
            log::warn!("Audio source failed to pause, buffers will be recycled: {}", e);
        }
        control.tracker.stop();
        inner.wait_for_drains(control.drain_timeout);

        log::info!("Capture paused");
        inner.notify_state(CaptureState::Paused);
        Ok(inner.shared.lock().state)
    }

    /// Resume dispatching and restart the duration counter.
    pub fn resume(&self) -> Result<CaptureState, CaptureError> {
        let inner = &self.inner;
        let mut control = inner.control.lock();
        {
            let shared = inner.shared.lock();
            if !shared.state.is_paused() {
                return Err(CaptureError::InvalidState(format!("cannot resume while {}", shared.state)));
            }
        }

        control.source.resume()?;

        {
            let mut shared = inner.shared.lock();
            if !shared.state.is_paused() {
                // a sink failure began teardown in the meantime
                return Err(CaptureError::InvalidState(format!("cannot resume while {}", shared.state)));
            }
            shared.state = CaptureState::Running;
            if let Some(session) = shared.session.as_mut() {
                session.refill_queue();
            }
        }

        let on_tick = inner.tick_callback();
        if let Err(e) = control.tracker.start(on_tick) {
            inner.shared.lock().state = CaptureState::Paused;
            if let Err(pause_err) = control.source.pause() {
                log::warn!("Audio source failed to pause: {}", pause_err);
            }
            return Err(e);
        }

        log::info!("Capture resumed");
        inner.notify_state(CaptureState::Running);
        Ok(CaptureState::Running)
    }

    /// Finalize the recording and return to idle.
    ///
    /// Returns `Ok(None)` when there is no session, so repeated calls are
    /// harmless. If the session was terminated by a sink failure, that
    /// failure is returned instead of a result.
    pub fn stop(&self) -> Result<Option<RecordingResult>, CaptureError> {
        let inner = &self.inner;
        let mut control = inner.control.lock();
        let began_teardown = {
            let mut shared = inner.shared.lock();
            if shared.session.is_none() {
                shared.state = CaptureState::Idle;
                return Ok(None);
            }
            match shared.state {
                CaptureState::Idle | CaptureState::Stopped => return Ok(None),
                CaptureState::Running | CaptureState::Paused => {
                    shared.state = CaptureState::Stopping;
                    true
                }
                CaptureState::Stopping => false,
            }
        };
        if began_teardown {
            inner.notify_state(CaptureState::Stopping);
        }
        inner.finish_session(&mut control)
    }
}

impl<S: AudioSource + 'static> EngineInner<S> {
    fn subscriber(&self) -> Option<Arc<dyn CaptureSubscriber>> {
        self.subscriber.read().clone()
    }

    fn notify_state(&self, state: CaptureState) {
        if let Some(subscriber) = self.subscriber() {
            subscriber.on_state_changed(state);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(subscriber) = self.subscriber() {
            subscriber.on_error(error);
        }
    }

    fn filled_callback(self: &Arc<Self>) -> FilledBufferCallback {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |buffer: AudioBuffer| {
            if let Some(inner) = weak.upgrade() {
                inner.on_buffer_filled(buffer);
            }
        })
    }

    fn tick_callback(self: &Arc<Self>) -> impl FnMut() + Send + 'static {
        let weak: Weak<Self> = Arc::downgrade(self);
        move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_tick();
            }
        }
    }

    /// Route one filled buffer. Runs on the source's thread; never blocks on I/O.
    fn on_buffer_filled(&self, buffer: AudioBuffer) {
        let mut shared = self.shared.lock();
        let state = shared.state;
        let Shared {
            session, diagnostics, ..
        } = &mut *shared;

        let Some(session) = session.as_mut() else {
            log::trace!("Filled buffer arrived without a session, dropped");
            return;
        };
        if !session.pool.owns(&buffer) {
            log::debug!("Stale buffer from a previous session dropped");
            return;
        }
        diagnostics.fill_callbacks += 1;

        if !state.is_running() {
            diagnostics.buffers_dropped += 1;
            log::trace!("Buffer filled while {}, recycled without dispatch", state);
            session.recycle(buffer, state.is_active());
            return;
        }
        if buffer.is_empty() {
            session.recycle(buffer, true);
            return;
        }
        if session.leading_to_discard > 0 {
            session.leading_to_discard -= 1;
            diagnostics.leading_buffers_discarded += 1;
            session.recycle(buffer, true);
            return;
        }

        if let Err(e) = session.pool.begin_drain(&buffer) {
            log::warn!("Filled buffer rejected: {}", e);
            session.recycle(buffer, true);
            return;
        }
        let sequence = session.next_sequence;
        let Some(tx) = session.drain_tx.as_ref() else {
            session.recycle(buffer, false);
            return;
        };
        match tx.send(DrainJob { buffer, sequence }) {
            Ok(()) => {
                session.next_sequence += 1;
                diagnostics.buffers_dispatched += 1;
            }
            Err(mpsc::SendError(job)) => {
                log::warn!("Drain worker gone, buffer {} recycled", sequence);
                session.recycle(job.buffer, false);
            }
        }
    }

    fn on_tick(&self) {
        let elapsed = {
            let mut shared = self.shared.lock();
            if !shared.state.is_running() {
                return;
            }
            let Some(session) = shared.session.as_mut() else {
                return;
            };
            session.elapsed_secs += 1;
            session.elapsed_secs
        };
        if let Some(subscriber) = self.subscriber() {
            subscriber.on_duration(&DurationEvent::new(elapsed));
        }
    }

    fn wait_for_drains(&self, timeout: Duration) {
        let mut shared = self.shared.lock();
        let result = self.drained.wait_while_for(
            &mut shared,
            |s| s.session.as_ref().is_some_and(|s| s.pool.counts().draining > 0),
            timeout,
        );
        if result.timed_out() {
            log::warn!("Timed out after {:?} waiting for in-flight buffers", timeout);
        }
    }

    /// Stop the tracker and source, then drain and join the worker.
    fn shut_down_pipeline(&self, control: &mut Control<S>, source_started: bool) -> Result<SinkSummary, CaptureError> {
        control.tracker.stop();

        let leftovers = if source_started {
            control.source.stop().unwrap_or_else(|e| {
                log::warn!("Audio source failed to stop cleanly: {}", e);
                Vec::new()
            })
        } else {
            Vec::new()
        };

        let drain_tx = {
            let mut shared = self.shared.lock();
            match shared.session.as_mut() {
                Some(session) => {
                    let queued = session.queue.close();
                    for buffer in leftovers.into_iter().chain(queued) {
                        session.recycle(buffer, false);
                    }
                    session.drain_tx.take()
                }
                None => None,
            }
        };
        // Closing the channel lets the worker finish the backlog and finalize.
        drop(drain_tx);

        let Some(handle) = control.drain_handle.take() else {
            return Err(CaptureError::InvalidState("no drain worker for session".into()));
        };
        if handle.thread().id() == thread::current().id() {
            return Err(CaptureError::InvalidState("session stopped from its own drain worker".into()));
        }
        handle
            .join()
            .map_err(|_| CaptureError::Io("drain worker panicked".into()))?
    }

    fn abort_start(&self, control: &mut Control<S>, source_started: bool) {
        if let Err(e) = self.shut_down_pipeline(control, source_started) {
            log::debug!("Discarding aborted session output: {}", e);
        }
        let mut shared = self.shared.lock();
        if let Some(session) = shared.session.take() {
            remove_partial_output(&session.config);
        }
        shared.state = CaptureState::Idle;
    }

    /// Tear down the active session. Requires state `Stopping`.
    fn finish_session(&self, control: &mut Control<S>) -> Result<Option<RecordingResult>, CaptureError> {
        let summary = self.shut_down_pipeline(control, true);

        let (mut session, diagnostics) = {
            let mut shared = self.shared.lock();
            let Some(session) = shared.session.take() else {
                shared.state = CaptureState::Idle;
                return Ok(None);
            };
            shared.state = CaptureState::Stopped;
            (session, shared.diagnostics.clone())
        };

        let counts = session.pool.counts();
        if counts.free != session.pool.len() {
            log::warn!("Session {} ended with buffers outstanding: {:?}", session.id, counts);
        }
        log::debug!("Session {} diagnostics: {:?}", session.id, diagnostics);
        self.notify_state(CaptureState::Stopped);

        let outcome = match (session.fault.take(), summary) {
            (Some(fault), _) => Err(fault),
            (None, Err(e)) => {
                log::error!("Failed to finalize {}: {}", session.config.output_path.display(), e);
                self.shared.lock().last_error = Some(e.clone());
                self.notify_error(&e);
                Err(e)
            }
            (None, Ok(summary)) => {
                let result = build_result(&session, summary);
                log::info!(
                    "Capture session {} finished: {} bytes, {}",
                    session.id,
                    result.bytes_written,
                    result.duration_text
                );
                if let Some(subscriber) = self.subscriber() {
                    subscriber.on_capture_finished(&result);
                }
                Ok(Some(result))
            }
        };

        self.shared.lock().state = CaptureState::Idle;
        self.notify_state(CaptureState::Idle);
        outcome
    }

    /// Reaper entry point after a sink failure.
    fn tear_down_faulted(&self, session_id: Uuid) {
        let mut control = self.control.lock();
        let current = self.shared.lock().session.as_ref().map(|s| s.id);
        if current != Some(session_id) {
            // already stopped by the caller
            return;
        }
        if let Err(e) = self.finish_session(&mut control) {
            log::error!("Capture session {} terminated: {}", session_id, e);
        }
    }
}

impl<S: AudioSource + 'static> DrainHost for EngineInner<S> {
    fn drained(&self, buffer: AudioBuffer, outcome: DrainOutcome) {
        let mut shared = self.shared.lock();
        let requeue = shared.state.is_active();
        let Shared {
            session, diagnostics, ..
        } = &mut *shared;

        let packets = match outcome {
            DrainOutcome::Written { bytes, packets, emitted } => {
                diagnostics.bytes_written += bytes as u64;
                if emitted {
                    diagnostics.chunks_emitted += 1;
                }
                packets
            }
            DrainOutcome::EmitFailed { bytes, packets } => {
                diagnostics.bytes_written += bytes as u64;
                diagnostics.emit_failures += 1;
                packets
            }
            DrainOutcome::WriteFailed | DrainOutcome::Skipped => 0,
        };

        if let Some(session) = session.as_mut().filter(|s| s.pool.owns(&buffer)) {
            session.packet_position += packets;
            session.recycle(buffer, requeue);
        }
        drop(shared);
        self.drained.notify_all();
    }

    fn write_failed(self: Arc<Self>, error: CaptureError) {
        let (session_id, began_teardown) = {
            let mut shared = self.shared.lock();
            shared.last_error = Some(error.clone());
            let began_teardown = shared.state.is_active();
            if began_teardown {
                shared.state = CaptureState::Stopping;
            }
            let Some(session) = shared.session.as_mut() else {
                return;
            };
            session.fault = Some(error.clone());
            (session.id, began_teardown)
        };

        if began_teardown {
            self.notify_state(CaptureState::Stopping);
        }
        self.notify_error(&error);

        // The worker cannot join itself; teardown runs on its own thread.
        let inner = Arc::clone(&self);
        let spawned = thread::Builder::new()
            .name("capture-teardown".into())
            .spawn(move || inner.tear_down_faulted(session_id));
        if let Err(e) = spawned {
            log::error!("Failed to spawn teardown for session {}: {}", session_id, e);
        }
    }
}

fn build_result(session: &ActiveSession, summary: SinkSummary) -> RecordingResult {
    let config = &session.config;
    let metadata = RecordingMetadata::new(
        session.id,
        &summary.path.to_string_lossy(),
        config.format,
        config.container,
        summary.bytes_written,
        session.packet_position,
        session.elapsed_secs,
        &summary.checksum,
    );

    if config.write_metadata {
        match metadata::write_metadata(&metadata, &summary.path) {
            Ok(path) => log::debug!("Wrote metadata sidecar {}", path.display()),
            Err(e) => log::warn!("Failed to write metadata sidecar: {}", e),
        }
    }

    RecordingResult {
        file_path: summary.path,
        elapsed_secs: session.elapsed_secs,
        duration_text: format_duration(session.elapsed_secs),
        bytes_written: summary.bytes_written,
        packet_count: session.packet_position,
        audio_duration_secs: metadata.audio_duration_secs,
        checksum: summary.checksum,
        metadata,
    }
}

fn remove_partial_output(config: &CaptureConfiguration) {
    if let Err(e) = fs::remove_file(&config.output_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove {}: {}", config.output_path.display(), e);
        }
    }
}

impl<S: AudioSource + 'static> CaptureSession for CaptureEngine<S> {
    fn state(&self) -> CaptureState {
        CaptureEngine::state(self)
    }

    fn elapsed_seconds(&self) -> u64 {
        CaptureEngine::elapsed_seconds(self)
    }

    fn diagnostics(&self) -> CaptureDiagnostics {
        CaptureEngine::diagnostics(self)
    }

    fn start(&self, config: CaptureConfiguration) -> Result<(), CaptureError> {
        CaptureEngine::start(self, config)
    }

    fn pause(&self) -> Result<CaptureState, CaptureError> {
        CaptureEngine::pause(self)
    }

    fn resume(&self) -> Result<CaptureState, CaptureError> {
        CaptureEngine::resume(self)
    }

    fn stop(&self) -> Result<Option<RecordingResult>, CaptureError> {
        CaptureEngine::stop(self)
    }
}

impl<S: AudioSource + 'static> Drop for CaptureEngine<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Capture session ended with error on drop: {}", e);
        }
    }
}
