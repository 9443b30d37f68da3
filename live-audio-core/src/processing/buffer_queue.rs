use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::buffer_pool::AudioBuffer;

/// Queue of empty buffers handed to an audio source for filling.
///
/// Cloneable handle: the engine pushes recycled buffers, the source pops them
/// from its own thread. Once closed, pushes are refused and the remaining
/// buffers are returned to the caller of `close`.
#[derive(Debug, Clone, Default)]
pub struct BufferQueue {
    inner: Arc<QueueInner>,
}

#[derive(Debug, Default)]
struct QueueInner {
    state: Mutex<QueueState>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct QueueState {
    buffers: VecDeque<AudioBuffer>,
    closed: bool,
}

impl BufferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a buffer for filling. Hands the buffer back if the queue is closed.
    pub fn push(&self, buffer: AudioBuffer) -> Result<(), AudioBuffer> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(buffer);
        }
        state.buffers.push_back(buffer);
        drop(state);
        self.inner.available.notify_one();
        Ok(())
    }

    /// Take the next buffer without waiting. Suitable for real-time callbacks.
    pub fn try_pop(&self) -> Option<AudioBuffer> {
        self.inner.state.lock().buffers.pop_front()
    }

    /// Take the next buffer, waiting up to `timeout` for one to be queued.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<AudioBuffer> {
        let mut state = self.inner.state.lock();
        if state.buffers.is_empty() && !state.closed {
            self.inner
                .available
                .wait_while_for(&mut state, |s| s.buffers.is_empty() && !s.closed, timeout);
        }
        state.buffers.pop_front()
    }

    /// Refuse further pushes and take back every queued buffer.
    pub fn close(&self) -> Vec<AudioBuffer> {
        let mut state = self.inner.state.lock();
        state.closed = true;
        let drained = state.buffers.drain(..).collect();
        drop(state);
        self.inner.available.notify_all();
        drained
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::buffer_pool::BufferPool;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn fifo_order() {
        let mut pool = BufferPool::new(2, 4, 1);
        let queue = BufferQueue::new();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let (slot_a, slot_b) = (a.slot(), b.slot());

        queue.push(a).unwrap();
        queue.push(b).unwrap();

        assert_eq!(queue.try_pop().unwrap().slot(), slot_a);
        assert_eq!(queue.try_pop().unwrap().slot(), slot_b);
        assert!(queue.try_pop().is_none());
    }

    #[test]
    fn close_returns_buffers_and_refuses_pushes() {
        let mut pool = BufferPool::new(2, 4, 1);
        let queue = BufferQueue::new();
        queue.push(pool.acquire().unwrap()).unwrap();

        let returned = queue.close();
        assert_eq!(returned.len(), 1);
        assert!(queue.is_closed());

        let refused = queue.push(pool.acquire().unwrap());
        assert!(refused.is_err());
    }

    #[test]
    fn pop_timeout_wakes_on_push() {
        let mut pool = BufferPool::new(1, 4, 1);
        let queue = BufferQueue::new();
        let producer = queue.clone();
        let buffer = pool.acquire().unwrap();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push(buffer).unwrap();
        });

        let popped = queue.pop_timeout(Duration::from_secs(2));
        assert!(popped.is_some());
        handle.join().unwrap();
    }

    #[test]
    fn pop_timeout_returns_early_when_closed() {
        let queue = BufferQueue::new();
        let closer = queue.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.close();
        });

        let started = Instant::now();
        assert!(queue.pop_timeout(Duration::from_secs(5)).is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }
}
