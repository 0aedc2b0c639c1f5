use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// One-shot stop flag shared by the reader, the registry walker and the
/// poll worker.
///
/// Every remote read checks this flag first; once triggered, reads fail
/// fast and [`wait`](Self::wait) returns immediately. It is never reset.
pub struct ShutdownSignal {
    raised: AtomicBool,
    wakeup: Condvar,
    lock: Mutex<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
            wakeup: Condvar::new(),
            lock: Mutex::new(()),
        }
    }

    /// Raise the flag and wake every waiter.
    pub fn trigger(&self) {
        // Stored under the lock so a waiter between its check and its
        // sleep cannot miss the wakeup.
        {
            let _guard = self.lock.lock();
            self.raised.store(true, Ordering::SeqCst);
        }
        self.wakeup.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Sleep for up to `duration`; returns `true` if shutdown cut it short
    /// (or had already been raised).
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_shutdown() {
            return true;
        }
        let mut guard = self.lock.lock();
        self.wakeup
            .wait_while_for(&mut guard, |_| !self.is_shutdown(), duration);
        self.is_shutdown()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
