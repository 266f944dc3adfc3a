//! Reusable text buffers for rendering.
//!
//! Checkout and checkin are safe from any thread; a checked-out buffer is
//! owned by its [`PooledBuffer`] guard until the guard drops.

use std::{
    mem,
    ops::{Deref, DerefMut},
    sync::{Mutex, OnceLock, PoisonError},
};

const DEFAULT_MAX_IDLE: usize = 64;

/// Buffers larger than this are dropped instead of returned.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<String>>,
    max_idle: usize,
}

impl BufferPool {
    pub fn new(max_idle: usize) -> Self {
        BufferPool {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Process-wide pool shared by all renders.
    pub fn global() -> &'static BufferPool {
        static POOL: OnceLock<BufferPool> = OnceLock::new();
        POOL.get_or_init(|| BufferPool::new(DEFAULT_MAX_IDLE))
    }

    /// Take an empty buffer, reusing an idle one when available.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let mut buf = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        buf.clear();
        PooledBuffer { pool: self, buf }
    }

    fn checkin(&self, buf: String) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(DEFAULT_MAX_IDLE)
    }
}

/// Exclusive handle on a pooled buffer; returns it to the pool on drop.
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buf: String,
}

impl PooledBuffer<'_> {
    /// Copy the contents out, leaving the buffer to be recycled.
    pub fn to_owned_string(&self) -> String {
        self.as_str().to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.checkin(mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_resets_buffer() {
        let pool = BufferPool::new(4);
        {
            let mut buf = pool.checkout();
            buf.push_str("SELECT 1");
        }
        assert_eq!(pool.idle_count(), 1);

        let buf = pool.checkout();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= "SELECT 1".len());
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_idle_list_is_bounded() {
        let pool = BufferPool::new(1);
        let a = pool.checkout();
        let b = pool.checkout();
        drop(a);
        drop(b);
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_concurrent_checkout() {
        let pool = BufferPool::new(8);
        std::thread::scope(|s| {
            for i in 0..8 {
                let pool = &pool;
                s.spawn(move || {
                    let mut buf = pool.checkout();
                    buf.push_str(&i.to_string());
                    assert_eq!(buf.as_str(), i.to_string());
                });
            }
        });
        assert!(pool.idle_count() <= 8);
    }
}
