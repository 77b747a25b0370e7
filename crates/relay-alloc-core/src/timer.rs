// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// A one-shot, stoppable wall-clock deadline.
///
/// [`Deadline::start`] spawns a thread that sleeps on a condition variable
/// with the given timeout. If the timeout elapses, the callback runs exactly
/// once; if [`Deadline::cancel`] is called first (or the value is dropped),
/// the thread is woken and joined and the callback never runs.
pub struct Deadline {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

impl Deadline {
    /// Starts the deadline; `callback` fires after `after` unless cancelled.
    pub fn start<F>(after: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            cancelled: Mutex::new(false),
            cv: Condvar::new(),
        });
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let guard = thread_shared
                .cancelled
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let (guard, _timeout) = thread_shared
                .cv
                .wait_timeout_while(guard, after, |cancelled| !*cancelled)
                .unwrap_or_else(|e| e.into_inner());
            let fired = !*guard;
            drop(guard);
            if fired {
                callback();
            }
        });
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Stops the deadline if it has not fired yet and joins its thread.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            {
                let mut cancelled = self
                    .shared
                    .cancelled
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                *cancelled = true;
            }
            self.shared.cv.notify_all();
            let _ = handle.join();
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::Deadline;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn test_fires_after_duration() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut deadline = Deadline::start(Duration::from_millis(20), move || {
            flag.store(true, Ordering::Relaxed);
        });
        std::thread::sleep(Duration::from_millis(200));
        assert!(fired.load(Ordering::Relaxed));
        deadline.cancel();
    }

    #[test]
    fn test_cancel_suppresses_callback() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut deadline = Deadline::start(Duration::from_secs(60), move || {
            flag.store(true, Ordering::Relaxed);
        });
        deadline.cancel();
        assert!(!fired.load(Ordering::Relaxed));
    }

    #[test]
    fn test_drop_cancels_without_firing() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        {
            let _deadline = Deadline::start(Duration::from_secs(60), move || {
                flag.store(true, Ordering::Relaxed);
            });
        }
        assert!(!fired.load(Ordering::Relaxed));
    }

    #[test]
    fn test_cancel_twice_is_noop() {
        let mut deadline = Deadline::start(Duration::from_secs(60), || {});
        deadline.cancel();
        deadline.cancel();
    }
}
