/**
 * Executes every submitted job directly on the caller's thread.
 *
 * This is the deterministic variant used in tests: because `submit` runs
 * the job to completion before returning, a test can assert on the
 * callback's effects immediately after `dispatch` returns, with no race
 * and no sleeping.
 *
 * There is no queue, so there is never in-flight work when a lifecycle
 * method runs synchronously:
 * - `shutdown` just flips the terminated flag (idempotent).
 * - `shutdown_now` has nothing to steal and returns an empty list.
 * - `await_termination` shuts down first, then reports terminated —
 *   it never waits, whatever timeout it is given.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{Executor, Job, Rejected};

// ---------------------------------------------------------------------------
// SameThreadExecutor
// ---------------------------------------------------------------------------

/**
 * Inline executor. A single atomic flag is the whole state: it only ever
 * transitions `false → true` and is observed from other threads, so an
 * `AtomicBool` is all the synchronization needed.
 */
#[derive(Debug, Default)]
pub struct SameThreadExecutor {
    /// Set once by `shutdown`; never cleared.
    terminated: AtomicBool,
}

impl SameThreadExecutor {
    /// Creates an executor in the running state.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for SameThreadExecutor {
    /**
     * Runs `job` synchronously to completion on the calling thread, unless
     * the executor has been shut down.
     */
    fn submit(&self, job: Job) -> Result<(), Rejected> {
        if self.terminated.load(Ordering::SeqCst) {
            return Err(Rejected);
        }
        job();
        Ok(())
    }

    fn shutdown(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }

    /// Nothing is ever queued, so there is nothing to return.
    fn shutdown_now(&self) -> Vec<Job> {
        self.shutdown();
        Vec::new()
    }

    fn is_shutdown(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Shutdown and termination coincide — no pending-task queue to drain.
    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /**
     * Shuts down, then reports terminated immediately. No work can be in
     * flight when this is invoked synchronously, so there is nothing to
     * wait for — the timeout (including zero) is irrelevant.
     */
    fn await_termination(&self, _timeout: Duration) -> bool {
        self.shutdown();
        self.terminated.load(Ordering::SeqCst)
    }
}
