//! Pool of encode buffers.
//!
//! Each scrape checks out one `BytesMut` and gets it back in the pool when
//! the [`PooledBuffer`] guard drops, whether the scrape succeeded, failed or
//! unwound.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

const DEFAULT_MAX_POOLED: usize = 16;
const DEFAULT_MAX_RETAINED_CAPACITY: usize = 4 * 1024 * 1024;
const INITIAL_CAPACITY: usize = 8 * 1024;

/// Shared pool of reusable buffers.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<BytesMut>>,
    max_pooled: usize,
    max_retained_capacity: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_POOLED, DEFAULT_MAX_RETAINED_CAPACITY)
    }

    /// Creates a pool keeping at most `max_pooled` idle buffers, each no
    /// larger than `max_retained_capacity` bytes.
    pub fn with_limits(max_pooled: usize, max_retained_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            max_pooled,
            max_retained_capacity,
        }
    }

    /// Takes an empty buffer out of the pool.
    pub fn checkout(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(INITIAL_CAPACITY));
        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.buffers.lock().len()
    }

    fn give_back(&self, mut buf: BytesMut) {
        if buf.capacity() > self.max_retained_capacity {
            return;
        }
        buf.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_pooled {
            buffers.push(buf);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer checked out of a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    buf: BytesMut,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}
