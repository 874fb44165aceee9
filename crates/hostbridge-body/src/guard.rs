//! Exactly-once completion callbacks.

use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicPtr, Ordering};

type Callback<A> = Box<dyn FnOnce(A) + Send>;

/// Wraps a completion callback so that only the first invocation runs it.
///
/// The callback sits in a single atomic slot. [`invoke`](Self::invoke)
/// swaps the slot with null and runs whatever it took out, so any number of
/// concurrent invokers race on one `swap` and exactly one of them observes
/// the callback. Later invocations find the slot empty and do nothing.
///
/// Zero-argument callbacks use `CompletionGuard<()>` and
/// [`fire`](CompletionGuard::fire).
pub struct CompletionGuard<A = ()> {
    slot: AtomicPtr<Callback<A>>,
}

impl<A> CompletionGuard<A> {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(A) + Send + 'static,
    {
        let boxed: Box<Callback<A>> = Box::new(Box::new(callback));
        Self {
            slot: AtomicPtr::new(Box::into_raw(boxed)),
        }
    }

    /// Run the wrapped callback with `arg` unless it already ran.
    ///
    /// Returns `true` for the one invocation that ran the callback.
    pub fn invoke(&self, arg: A) -> bool {
        let previous = self.slot.swap(ptr::null_mut(), Ordering::AcqRel);
        if previous.is_null() {
            return false;
        }
        // SAFETY: every non-null pointer stored in the slot comes from
        // `Box::into_raw` in `new`, and the swap hands it to one caller only.
        let callback = unsafe { Box::from_raw(previous) };
        (*callback)(arg);
        true
    }

    /// Whether the callback has already been taken.
    pub fn is_spent(&self) -> bool {
        self.slot.load(Ordering::Acquire).is_null()
    }
}

impl CompletionGuard<()> {
    pub fn fire(&self) -> bool {
        self.invoke(())
    }
}

impl<A> Drop for CompletionGuard<A> {
    fn drop(&mut self) {
        let remaining = *self.slot.get_mut();
        if !remaining.is_null() {
            // SAFETY: same provenance as in `invoke`; `&mut self` excludes
            // concurrent invokers.
            drop(unsafe { Box::from_raw(remaining) });
        }
    }
}

impl<A> std::fmt::Debug for CompletionGuard<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGuard")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Wrap a zero-argument callback into a cloneable function that runs it at
/// most once across all clones.
pub fn call_once<F>(callback: F) -> impl Fn() + Clone + Send + Sync + 'static
where
    F: FnOnce() + Send + 'static,
{
    let guard = Arc::new(CompletionGuard::new(move |()| callback()));
    move || {
        guard.fire();
    }
}

/// One-argument flavor of [`call_once`].
pub fn call_once_with<A, F>(callback: F) -> impl Fn(A) + Clone + Send + Sync + 'static
where
    A: 'static,
    F: FnOnce(A) + Send + 'static,
{
    let guard = Arc::new(CompletionGuard::new(callback));
    move |arg| {
        guard.invoke(arg);
    }
}
