use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::error::CaptureError;

/// Number of buffers cycled between the audio source and the consumers.
pub const POOL_SIZE: usize = 3;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Handle naming one slot of a `BufferPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId {
    pool: u64,
    index: usize,
}

impl SlotId {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Current owner of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferOwner {
    /// Idle in the pool, free to be handed out for filling.
    Free,
    /// Queued with or being filled by the audio source.
    WithSource,
    /// Filled and being drained to the file sink and chunk emitter.
    Draining,
}

/// Snapshot of slot ownership. `free + with_source + draining` always equals the pool size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolCounts {
    pub free: usize,
    pub with_source: usize,
    pub draining: usize,
}

impl PoolCounts {
    pub fn total(&self) -> usize {
        self.free + self.with_source + self.draining
    }
}

/// A fixed-capacity block of raw sample bytes.
///
/// Not `Clone`: whoever holds the value owns the slot.
#[derive(Debug)]
pub struct AudioBuffer {
    slot: SlotId,
    data: Box<[u8]>,
    len: usize,
    bytes_per_packet: usize,
}

impl AudioBuffer {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of filled bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    /// The filled portion of the buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Whole packets currently held.
    pub fn packet_count(&self) -> u64 {
        (self.len / self.bytes_per_packet.max(1)) as u64
    }

    /// Append as many of `bytes` as fit; returns how many were copied.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.remaining());
        self.data[self.len..self.len + count].copy_from_slice(&bytes[..count]);
        self.len += count;
        count
    }

    /// Mutable access to the whole backing storage, for sources that fill in place.
    /// Follow with `set_len`.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(self.data.len());
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Arena of `POOL_SIZE` reusable buffers addressed by `SlotId`.
///
/// Every slot carries an explicit owner tag. A buffer can only re-enter the
/// source through `acquire`, which only hands out `Free` slots, so a buffer
/// still being drained can never be queued for filling.
#[derive(Debug)]
pub struct BufferPool {
    id: u64,
    owners: Vec<BufferOwner>,
    idle: Vec<AudioBuffer>,
    buffer_size: usize,
}

impl BufferPool {
    pub fn new(count: usize, buffer_size: usize, bytes_per_packet: usize) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let idle = (0..count)
            .rev()
            .map(|index| AudioBuffer {
                slot: SlotId { pool: id, index },
                data: vec![0u8; buffer_size].into_boxed_slice(),
                len: 0,
                bytes_per_packet,
            })
            .collect();
        Self {
            id,
            owners: vec![BufferOwner::Free; count],
            idle,
            buffer_size,
        }
    }

    /// Take a free buffer for the audio source to fill.
    pub fn acquire(&mut self) -> Result<AudioBuffer, CaptureError> {
        let buffer = self
            .idle
            .pop()
            .ok_or_else(|| CaptureError::ResourceUnavailable("no free buffer in pool".into()))?;
        self.owners[buffer.slot.index] = BufferOwner::WithSource;
        Ok(buffer)
    }

    /// Move a filled buffer from the source to the consumers.
    pub fn begin_drain(&mut self, buffer: &AudioBuffer) -> Result<(), CaptureError> {
        self.check_owner(buffer, BufferOwner::WithSource)?;
        self.owners[buffer.slot.index] = BufferOwner::Draining;
        Ok(())
    }

    /// Return a buffer to the pool, from either the source or the consumers.
    ///
    /// Buffers from another pool (a previous session) are rejected.
    pub fn release(&mut self, mut buffer: AudioBuffer) -> Result<(), CaptureError> {
        if !self.owns(&buffer) {
            return Err(CaptureError::InvalidState(format!(
                "buffer slot {} does not belong to this pool",
                buffer.slot.index
            )));
        }
        if self.owners[buffer.slot.index] == BufferOwner::Free {
            return Err(CaptureError::InvalidState(format!(
                "buffer slot {} released twice",
                buffer.slot.index
            )));
        }
        buffer.clear();
        self.owners[buffer.slot.index] = BufferOwner::Free;
        self.idle.push(buffer);
        Ok(())
    }

    pub fn owns(&self, buffer: &AudioBuffer) -> bool {
        buffer.slot.pool == self.id && buffer.slot.index < self.owners.len()
    }

    pub fn owner(&self, slot: SlotId) -> Option<BufferOwner> {
        if slot.pool != self.id {
            return None;
        }
        self.owners.get(slot.index).copied()
    }

    pub fn counts(&self) -> PoolCounts {
        self.owners
            .iter()
            .fold(PoolCounts::default(), |mut counts, owner| {
                match owner {
                    BufferOwner::Free => counts.free += 1,
                    BufferOwner::WithSource => counts.with_source += 1,
                    BufferOwner::Draining => counts.draining += 1,
                }
                counts
            })
    }

    pub fn free_count(&self) -> usize {
        self.idle.len()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn check_owner(&self, buffer: &AudioBuffer, expected: BufferOwner) -> Result<(), CaptureError> {
        match self.owner(buffer.slot) {
            Some(owner) if owner == expected => Ok(()),
            Some(owner) => Err(CaptureError::InvalidState(format!(
                "buffer slot {} is {:?}, expected {:?}",
                buffer.slot.index, owner, expected
            ))),
            None => Err(CaptureError::InvalidState(format!(
                "buffer slot {} does not belong to this pool",
                buffer.slot.index
            ))),
        }
    }
}
