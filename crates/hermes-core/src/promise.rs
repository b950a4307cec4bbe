//! One-shot promise primitive.
//!
//! A [`Promise`] is a single-assignment, thread-safe handoff cell used by the
//! asynchronous binders to publish a value produced on an I/O-driven task.
//! Completion is idempotent: a second completion attempt is a silent no-op,
//! never a race.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

/// A one-shot, idempotently completable value cell.
///
/// Cloning a promise yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use hermes_core::Promise;
///
/// let promise: Promise<u32> = Promise::new();
/// assert!(promise.try_get().is_none());
///
/// assert!(promise.complete(7));
/// assert!(!promise.complete(8)); // no-op
/// assert_eq!(promise.try_get(), Some(7));
/// ```
#[derive(Debug)]
pub struct Promise<T> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    value: Mutex<Option<T>>,
    notify: Notify,
}

impl<T: Clone> Promise<T> {
    /// Creates a new, incomplete promise.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Completes the promise with a value.
    ///
    /// Returns true if this call completed the promise; false if it was
    /// already complete (the value is discarded).
    pub fn complete(&self, value: T) -> bool {
        let mut slot = self.inner.value.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        drop(slot);
        self.inner.notify.notify_waiters();
        true
    }

    /// Returns true once the promise has been completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.inner.value.lock().is_some()
    }

    /// Returns the value if the promise has completed, without waiting.
    #[must_use]
    pub fn try_get(&self) -> Option<T> {
        self.inner.value.lock().clone()
    }

    /// Waits until the promise completes and returns the value.
    pub async fn resolved(&self) -> T {
        loop {
            // Register before checking so a completion between the check and
            // the await cannot be missed.
            let notified = self.inner.notify.notified();
            if let Some(value) = self.try_get() {
                return value;
            }
            notified.await;
        }
    }
}

impl<T: Clone> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_get_before_completion() {
        let promise: Promise<i32> = Promise::new();
        assert!(!promise.is_complete());
        assert!(promise.try_get().is_none());
    }

    #[test]
    fn test_double_complete_is_noop() {
        let promise = Promise::new();
        assert!(promise.complete("first"));
        assert!(!promise.complete("second"));
        assert_eq!(promise.try_get(), Some("first"));
    }

    #[test]
    fn test_clone_shares_cell() {
        let promise = Promise::new();
        let other = promise.clone();
        promise.complete(42);
        assert_eq!(other.try_get(), Some(42));
    }

    #[tokio::test]
    async fn test_resolved_waits_for_completion() {
        let promise: Promise<u8> = Promise::new();
        let waiter = promise.clone();

        let handle = tokio::spawn(async move { waiter.resolved().await });
        tokio::task::yield_now().await;
        promise.complete(9);

        assert_eq!(handle.await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_resolved_after_completion() {
        let promise = Promise::new();
        promise.complete(1u8);
        assert_eq!(promise.resolved().await, 1);
    }
}
