//! Drain worker: consumes dispatched buffers off the real-time path.
//!
//! Each buffer is written to the file sink first and then emitted, in
//! dispatch order, before being handed back to the engine for recycling.
//! The worker owns the sink and finalizes it once every sender is gone.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;

use crate::models::error::CaptureError;
use crate::processing::buffer_pool::AudioBuffer;
use crate::session::chunk_emitter::ChunkEmitter;
use crate::storage::file_sink::{FileSink, SinkSummary};

/// A filled buffer dispatched while running.
pub(crate) struct DrainJob {
    pub buffer: AudioBuffer,
    pub sequence: u64,
}

/// What happened to one drained buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrainOutcome {
    Written { bytes: usize, packets: u64, emitted: bool },
    EmitFailed { bytes: usize, packets: u64 },
    WriteFailed,
    /// Not written because an earlier write failed.
    Skipped,
}

/// Engine side of the drain worker.
pub(crate) trait DrainHost: Send + Sync {
    /// The buffer has been consumed and may be recycled.
    fn drained(&self, buffer: AudioBuffer, outcome: DrainOutcome);

    /// The sink failed; the session must be torn down.
    fn write_failed(self: Arc<Self>, error: CaptureError);
}

pub(crate) type DrainHandle = thread::JoinHandle<Result<SinkSummary, CaptureError>>;

pub(crate) fn spawn_worker(
    jobs: Receiver<DrainJob>,
    mut sink: Box<dyn FileSink>,
    emitter: ChunkEmitter,
    host: Arc<dyn DrainHost>,
) -> Result<DrainHandle, CaptureError> {
    thread::Builder::new()
        .name("capture-drain".into())
        .spawn(move || {
            let mut faulted = false;

            while let Ok(job) = jobs.recv() {
                let outcome = if faulted {
                    DrainOutcome::Skipped
                } else {
                    match drain_one(&job, sink.as_mut(), &emitter) {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            log::error!("Failed to write chunk {}: {}", job.sequence, e);
                            faulted = true;
                            Arc::clone(&host).write_failed(e);
                            DrainOutcome::WriteFailed
                        }
                    }
                };
                host.drained(job.buffer, outcome);
            }

            sink.finalize()
        })
        .map_err(|e| CaptureError::ResourceUnavailable(format!("failed to spawn drain worker: {}", e)))
}

fn drain_one(
    job: &DrainJob,
    sink: &mut dyn FileSink,
    emitter: &ChunkEmitter,
) -> Result<DrainOutcome, CaptureError> {
    let bytes = job.buffer.bytes();
    let packets = job.buffer.packet_count();

    sink.write(bytes)?;

    let outcome = match emitter.emit(bytes, job.sequence) {
        Ok(emitted) => DrainOutcome::Written {
            bytes: bytes.len(),
            packets,
            emitted,
        },
        Err(e) => {
            log::warn!("Dropped chunk {} notification: {}", job.sequence, e);
            DrainOutcome::EmitFailed {
                bytes: bytes.len(),
                packets,
            }
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc;

    use parking_lot::Mutex;

    use crate::processing::buffer_pool::BufferPool;
    use crate::traits::chunk_encoder::Base64Encoder;

    struct MemorySink {
        path: PathBuf,
        data: Arc<Mutex<Vec<u8>>>,
        fail_after: Option<usize>,
        writes: usize,
    }

    impl FileSink for MemorySink {
        fn write(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
            if self.fail_after == Some(self.writes) {
                return Err(CaptureError::Io("disk full".into()));
            }
            self.writes += 1;
            self.data.lock().extend_from_slice(bytes);
            Ok(())
        }

        fn finalize(&mut self) -> Result<SinkSummary, CaptureError> {
            Ok(SinkSummary {
                path: self.path.clone(),
                bytes_written: self.bytes_written(),
                checksum: String::new(),
            })
        }

        fn bytes_written(&self) -> u64 {
            self.data.lock().len() as u64
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    #[derive(Default)]
    struct RecordingHost {
        outcomes: Mutex<Vec<DrainOutcome>>,
        failures: Mutex<Vec<CaptureError>>,
    }

    impl DrainHost for RecordingHost {
        fn drained(&self, _buffer: AudioBuffer, outcome: DrainOutcome) {
            self.outcomes.lock().push(outcome);
        }

        fn write_failed(self: Arc<Self>, error: CaptureError) {
            self.failures.lock().push(error);
        }
    }

    fn run(fail_after: Option<usize>, chunks: &[&[u8]]) -> (Arc<RecordingHost>, Vec<u8>, SinkSummary) {
        let data = Arc::new(Mutex::new(Vec::new()));
        let sink = MemorySink {
            path: PathBuf::from("memory"),
            data: Arc::clone(&data),
            fail_after,
            writes: 0,
        };
        let host = Arc::new(RecordingHost::default());
        let (tx, rx) = mpsc::channel();
        let emitter = ChunkEmitter::new(Arc::new(Base64Encoder), None);
        let handle = spawn_worker(rx, Box::new(sink), emitter, host.clone()).unwrap();

        let mut pool = BufferPool::new(chunks.len(), 8, 2);
        for (sequence, chunk) in chunks.iter().enumerate() {
            let mut buffer = pool.acquire().unwrap();
            buffer.extend_from_slice(chunk);
            tx.send(DrainJob {
                buffer,
                sequence: sequence as u64,
            })
            .unwrap();
        }
        drop(tx);

        let summary = handle.join().unwrap().unwrap();
        let written = data.lock().clone();
        (host, written, summary)
    }

    #[test]
    fn drains_in_dispatch_order() {
        let (host, written, summary) = run(None, &[&[1, 2], &[3, 4, 5, 6]]);

        assert_eq!(written, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(summary.bytes_written, 6);
        assert_eq!(
            *host.outcomes.lock(),
            vec![
                DrainOutcome::Written {
                    bytes: 2,
                    packets: 1,
                    emitted: false
                },
                DrainOutcome::Written {
                    bytes: 4,
                    packets: 2,
                    emitted: false
                },
            ]
        );
        assert!(host.failures.lock().is_empty());
    }

    #[test]
    fn write_failure_skips_remaining_jobs() {
        let (host, written, _) = run(Some(1), &[&[1, 2], &[3, 4], &[5, 6]]);

        assert_eq!(written, vec![1, 2]);
        let outcomes = host.outcomes.lock();
        assert_eq!(outcomes[1], DrainOutcome::WriteFailed);
        assert_eq!(outcomes[2], DrainOutcome::Skipped);
        assert_eq!(host.failures.lock().len(), 1);
        assert!(host.failures.lock()[0].is_fatal());
    }
}
