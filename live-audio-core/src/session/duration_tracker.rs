use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::CaptureError;

/// Default tick interval.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic ticker driving the elapsed-seconds counter.
///
/// Ticks on a dedicated thread every `interval` while started. `stop` is
/// synchronous: it cancels and joins the thread, so no tick fires after it
/// returns (a tick already executing completes first). The partial interval
/// accrued at `stop` is carried into the next `start`, so the tick count
/// follows the sum of the started intervals rather than restarting each
/// second boundary on resume.
pub struct DurationTracker {
    interval: Duration,
    carried: Duration,
    cancel: Arc<Cancel>,
    handle: Option<thread::JoinHandle<Duration>>,
}

#[derive(Default)]
struct Cancel {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl DurationTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            carried: Duration::ZERO,
            cancel: Arc::new(Cancel::default()),
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Partial interval accrued before the last `stop`.
    pub fn carried(&self) -> Duration {
        self.carried
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start ticking. No-op if already running.
    pub fn start<F>(&mut self, mut on_tick: F) -> Result<(), CaptureError>
    where
        F: FnMut() + Send + 'static,
    {
        if self.handle.is_some() {
            return Ok(());
        }

        let cancel = Arc::new(Cancel::default());
        self.cancel = Arc::clone(&cancel);
        let interval = self.interval;
        let first_wait = interval.saturating_sub(self.carried);

        let handle = thread::Builder::new()
            .name("duration-tracker".into())
            .spawn(move || {
                let mut deadline = Instant::now() + first_wait;
                loop {
                    {
                        let mut cancelled = cancel.cancelled.lock();
                        while !*cancelled {
                            if cancel.wake.wait_until(&mut cancelled, deadline).timed_out() {
                                break;
                            }
                        }
                        if *cancelled {
                            let remaining = deadline.saturating_duration_since(Instant::now());
                            return interval.saturating_sub(remaining);
                        }
                    }
                    on_tick();
                    deadline += interval;
                }
            })
            .map_err(|e| {
                CaptureError::ResourceUnavailable(format!("failed to spawn duration tracker: {}", e))
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Cancel and join the ticking thread, keeping the partial interval.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        *self.cancel.cancelled.lock() = true;
        self.cancel.wake.notify_all();

        if handle.thread().id() == thread::current().id() {
            // Called from inside a tick; the loop observes the flag on return.
            log::warn!("duration tracker stopped from its own tick");
            return;
        }
        match handle.join() {
            Ok(partial) => self.carried = partial,
            Err(_) => {
                log::error!("duration tracker thread panicked");
                self.carried = Duration::ZERO;
            }
        }
    }

    /// Forget any carried partial interval. Used at session start.
    pub fn reset(&mut self) {
        self.carried = Duration::ZERO;
    }
}

impl Drop for DurationTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
