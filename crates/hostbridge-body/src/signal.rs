//! One-shot continuation signal used to park a writer during backpressure.

use std::io;
use std::sync::mpsc::{self, Receiver};

use crate::producer::Continuation;

/// Blocks until the paired continuation runs.
pub(crate) struct Waiter(Receiver<()>);

impl Waiter {
    /// Returns an error if the continuation was dropped without being run,
    /// which would otherwise leave the writer parked forever.
    pub(crate) fn wait(self) -> io::Result<()> {
        self.0.recv().map_err(|_| {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                "continuation dropped without being invoked",
            )
        })
    }
}

/// A fresh continuation and the waiter it releases.
pub(crate) fn continuation() -> (Continuation, Waiter) {
    let (tx, rx) = mpsc::sync_channel(1);
    let continuation: Continuation = Box::new(move || {
        let _ = tx.send(());
    });
    (continuation, Waiter(rx))
}
