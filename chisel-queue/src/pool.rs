//! Recycling pool for chunk mutation buffers.
//!
//! A large edit touches tens of thousands of chunks, and each chunk buffer
//! owns up to dozens of 4096-entry arrays. Recycling the buffers between
//! chunks keeps the allocator out of the hot path.

use crossbeam::queue::ArrayQueue;

/// A value that can be wiped back to its freshly-constructed state.
pub trait Reusable: Send {
    /// Clears all mutable state so the next checkout observes a fresh value.
    fn reset(&mut self);
}

/// A fixed-capacity recycling pool.
///
/// `poll` and `recycle` are individually atomic and safe to call from any
/// number of worker threads. A checked-out value is moved to the caller, so
/// exclusive ownership while checked out is enforced by the type system, not
/// by locking.
pub struct Pool<T: Reusable> {
    queue: ArrayQueue<T>,
    create: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Reusable> Pool<T> {
    /// Creates a pool that constructs instances with `T::default`.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self
    where
        T: Default + 'static,
    {
        Self::with_factory(capacity, T::default)
    }

    /// Creates a pool with a custom constructor for cache misses.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_factory(capacity: usize, create: impl Fn() -> T + Send + Sync + 'static) -> Self {
        assert!(capacity > 0, "pool capacity must be non-zero");
        Self {
            queue: ArrayQueue::new(capacity),
            create: Box::new(create),
        }
    }

    /// Checks an instance out, reusing a recycled one when available.
    #[must_use]
    pub fn poll(&self) -> T {
        self.queue.pop().unwrap_or_else(|| (self.create)())
    }

    /// Resets an instance and returns it to the pool. Instances offered
    /// beyond capacity are dropped.
    pub fn recycle(&self, mut value: T) {
        value.reset();
        if self.queue.push(value).is_err() {
            log::trace!("pool at capacity, dropping recycled instance");
        }
    }

    /// Number of instances currently parked in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no recycled instances are parked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
