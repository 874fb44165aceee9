//! Cancellation signal handed to body producers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Registration = Box<dyn FnOnce() + Send>;

/// A cancellation signal that callbacks can be registered against.
///
/// Clones share state. [`cancel`](Self::cancel) is idempotent: registered
/// callbacks run once, on the thread that cancels. Registering after
/// cancellation runs the callback immediately on the registering thread.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    registrations: Mutex<Vec<Registration>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Run `callback` when the token is cancelled.
    pub fn register<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut registrations = self.registrations();
        if self.is_cancelled() {
            drop(registrations);
            callback();
            return;
        }
        registrations.push(Box::new(callback));
    }

    /// Cancel the token and run every registered callback.
    pub fn cancel(&self) {
        let pending = {
            let mut registrations = self.registrations();
            if self.inner.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *registrations)
        };
        for callback in pending {
            callback();
        }
    }

    fn registrations(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.inner
            .registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
