/*!
 * Executor layer — decides *where* dispatched work runs.
 *
 * Two interchangeable variants behind one capability trait:
 * - `background` — worker-pool executor for production; `submit` only
 *   enqueues, jobs run concurrently with no cross-submission ordering.
 * - `same_thread` — runs every job inline on the caller's thread; makes
 *   asynchronous dispatch fully deterministic for tests.
 *
 * The variant is selected by configuration, never by inheritance — the
 * dispatcher holds an `Arc<dyn Executor>` and does not care which one it
 * got.
 */

pub mod background;
pub mod same_thread;

pub use background::BackgroundExecutor;
pub use same_thread::SameThreadExecutor;

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Job & Rejected
// ---------------------------------------------------------------------------

/// A unit of work submitted to an executor. Runs at most once.
pub type Job = Box<dyn FnOnce() + Send>;

/**
 * Rejection signal: the executor was already shut down when `submit` was
 * called. The job is dropped, but the dispatcher keeps its callback in a
 * shared slot, so the rejection is still converted into a failure outcome
 * — nothing is silently lost.
 */
#[derive(Debug, PartialEq, Eq)]
pub struct Rejected;

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("executor is shut down")
    }
}

impl std::error::Error for Rejected {}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/**
 * Work-submission capability shared by all requests issued through one
 * client configuration.
 *
 * Contract:
 * - `submit` never blocks the caller beyond trivial enqueue cost — except
 *   the same-thread variant, which runs the job to completion inline.
 * - After `shutdown`, `submit` fails with `Rejected`; the flag never
 *   transitions back.
 * - `await_termination` reports whether all work had finished within the
 *   timeout.
 */
pub trait Executor: Send + Sync {
    /**
     * Hands a job to the executor. Fails with `Rejected` once the executor
     * has been shut down.
     */
    fn submit(&self, job: Job) -> Result<(), Rejected>;

    /**
     * Initiates shutdown: no new jobs are accepted, already-queued jobs
     * still run. Idempotent.
     */
    fn shutdown(&self);

    /**
     * Shuts down and steals jobs that were queued but not yet started,
     * returning them un-run. The same-thread variant never queues, so it
     * always returns an empty list.
     */
    fn shutdown_now(&self) -> Vec<Job>;

    /// Whether `shutdown` (or `shutdown_now`) has been called.
    fn is_shutdown(&self) -> bool;

    /// Whether shutdown completed and no work remains in flight.
    fn is_terminated(&self) -> bool;

    /**
     * Blocks until the executor terminates or the timeout elapses.
     * Returns the terminated state at that point.
     */
    fn await_termination(&self, timeout: Duration) -> bool;
}
