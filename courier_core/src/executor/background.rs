/**
 * Worker-pool executor that runs dispatched transfers off the caller's
 * thread.
 *
 * Architecture overview:
 *
 * ```text
 *  ┌──────────────┐    unbounded channel    ┌──────────────────┐
 *  │  Dispatcher   │ ──────── Job ─────────► │  Worker threads   │
 *  │  (any thread) │                         │  (N, named)       │
 *  └──────────────┘                         └────────┬─────────┘
 *                                                    │
 *                                              job() → transfer → deliver
 * ```
 *
 * `submit` only enqueues — the channel is unbounded, so the caller never
 * blocks beyond the send itself. Jobs picked up by distinct workers run
 * concurrently; no ordering is guaranteed across submissions.
 *
 * Shutdown drops the sender: workers drain whatever is already queued,
 * then exit when the channel disconnects. Each worker decrements a shared
 * live count on exit; `await_termination` waits on that count with the
 * mutex + condvar pattern.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use super::{Executor, Job, Rejected};

// ---------------------------------------------------------------------------
// TerminationSignal — condvar-based wait for pool exit
// ---------------------------------------------------------------------------

/**
 * Tracks how many workers are still alive and lets `await_termination`
 * block until the count reaches zero.
 *
 * Uses a `Mutex<usize>` + `Condvar` pair: each worker decrements the
 * count and notifies as it exits; waiters use `wait_timeout_while` to
 * handle spurious wakeups.
 */
struct TerminationSignal {
    /// Number of worker threads that have not yet exited.
    live: Mutex<usize>,

    /// Condition variable waiters block on.
    condvar: Condvar,
}

impl TerminationSignal {
    fn new(workers: usize) -> Self {
        Self {
            live: Mutex::new(workers),
            condvar: Condvar::new(),
        }
    }

    /// Called by a worker thread as its last action.
    fn worker_exited(&self) {
        if let Ok(mut live) = self.live.lock() {
            *live = live.saturating_sub(1);
            self.condvar.notify_all();
        }
    }

    /// True once every worker has exited.
    fn drained(&self) -> bool {
        self.live.lock().map(|live| *live == 0).unwrap_or(true)
    }

    /**
     * Blocks until all workers have exited or `timeout` elapses.
     * Returns whether the pool drained in time.
     */
    fn wait(&self, timeout: Duration) -> bool {
        match self.live.lock() {
            Ok(guard) => {
                let result = self
                    .condvar
                    .wait_timeout_while(guard, timeout, |live| *live > 0);
                match result {
                    Ok((_, timeout_result)) => !timeout_result.timed_out(),
                    Err(_) => false, /* poisoned mutex — treat as timeout */
                }
            }
            Err(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// BackgroundExecutor
// ---------------------------------------------------------------------------

/**
 * The production executor: a fixed pool of named worker threads fed by an
 * unbounded channel.
 *
 * Shared state is deliberately minimal — one monotonic shutdown flag, the
 * sender slot, and the live-worker count. The receiver is kept so that
 * `shutdown_now` can steal still-queued jobs.
 */
pub struct BackgroundExecutor {
    /// Sender side of the job channel. Taken (dropped) on shutdown so the
    /// workers see a disconnect once the queue drains.
    sender: Mutex<Option<Sender<Job>>>,

    /// Receiver kept for `shutdown_now` to drain un-started jobs.
    receiver: Receiver<Job>,

    /// Monotonic shutdown flag, visible across threads.
    shutdown: AtomicBool,

    /// Worker exit tracking for `await_termination`.
    termination: Arc<TerminationSignal>,
}

impl BackgroundExecutor {
    /**
     * Spawns a pool with `workers` threads (at least one).
     *
     * Each thread is named `courier-worker-{n}` and loops on the channel
     * until it disconnects. A panicking job is isolated and logged; the
     * worker keeps serving.
     */
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let termination = Arc::new(TerminationSignal::new(workers));

        for n in 0..workers {
            let receiver = receiver.clone();
            let termination = termination.clone();
            let thread_termination = termination.clone();
            let spawned = thread::Builder::new()
                .name(format!("courier-worker-{n}"))
                .spawn(move || {
                    Self::run_loop(&receiver);
                    thread_termination.worker_exited();
                });
            if let Err(e) = spawned {
                /* An unspawnable worker still counts as exited, or
                 * await_termination would wait for it forever. */
                warn!(error = %e, "failed to spawn worker thread");
                termination.worker_exited();
            }
        }

        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            shutdown: AtomicBool::new(false),
            termination,
        }
    }

    /**
     * The worker loop: block on the next job, run it, repeat until the
     * channel disconnects (sender dropped on shutdown and queue drained).
     */
    fn run_loop(receiver: &Receiver<Job>) {
        while let Ok(job) = receiver.recv() {
            /*
             * A job is a full dispatch including the user callback, which
             * may panic. Isolate it so one bad callback cannot kill the
             * worker for every later dispatch.
             */
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
            if outcome.is_err() {
                warn!("dispatched job panicked — worker continues");
            }
        }
        debug!("worker exiting: channel disconnected");
    }
}

impl Executor for BackgroundExecutor {
    /**
     * Enqueues `job` for the pool. Never blocks beyond the enqueue itself.
     */
    fn submit(&self, job: Job) -> Result<(), Rejected> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(Rejected);
        }
        match self.sender.lock() {
            Ok(slot) => match slot.as_ref() {
                Some(sender) => sender.send(job).map_err(|_| Rejected),
                None => Err(Rejected),
            },
            Err(_) => Err(Rejected),
        }
    }

    /**
     * Stops accepting work and lets already-queued jobs finish: dropping
     * the sender disconnects the channel once the queue is empty, and the
     * workers exit. Idempotent.
     */
    fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Ok(mut slot) = self.sender.lock() {
            slot.take();
        }
    }

    /**
     * Shuts down and steals jobs that no worker has started yet.
     *
     * The returned jobs never ran — callers that still need their effects
     * must run them explicitly. Dispatch callbacks held in a slot are not
     * affected: the slot keeps the exactly-once contract per dispatch.
     */
    fn shutdown_now(&self) -> Vec<Job> {
        self.shutdown();
        self.receiver.try_iter().collect()
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn is_terminated(&self) -> bool {
        self.is_shutdown() && self.termination.drained()
    }

    /**
     * Blocks until every worker has exited or the timeout elapses.
     * Without a preceding `shutdown` the workers never exit, so this
     * simply times out — the `ExecutorService` contract.
     */
    fn await_termination(&self, timeout: Duration) -> bool {
        self.termination.wait(timeout) && self.is_terminated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /**
     * A submitted job runs on some worker thread, not the caller's.
     */
    #[test]
    fn submit_runs_job_on_worker() {
        let executor = BackgroundExecutor::new(2);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let caller = thread::current().id();
        executor
            .submit(Box::new(move || {
                let _ = done_tx.send(thread::current().id());
            }))
            .unwrap();

        let worker = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("job should run");
        assert_ne!(worker, caller);
    }

    /**
     * Shutdown lets queued work drain, then the pool terminates; new
     * submissions are rejected rather than silently dropped.
     */
    #[test]
    fn shutdown_drains_and_rejects() {
        let executor = BackgroundExecutor::new(1);
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let ran = ran.clone();
            executor
                .submit(Box::new(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        executor.shutdown();
        assert!(executor.is_shutdown());
        assert!(executor.submit(Box::new(|| {})).is_err());

        assert!(executor.await_termination(Duration::from_secs(5)));
        assert!(executor.is_terminated());
        assert_eq!(ran.load(Ordering::SeqCst), 4);
    }

    /**
     * `await_termination` without shutdown times out: the workers are
     * still alive and waiting for work.
     */
    #[test]
    fn await_without_shutdown_times_out() {
        let executor = BackgroundExecutor::new(1);
        assert!(!executor.await_termination(Duration::from_millis(50)));
        assert!(!executor.is_terminated());
        executor.shutdown();
        assert!(executor.await_termination(Duration::from_secs(5)));
    }

    /**
     * A panicking job does not take the worker down with it — later
     * submissions still run.
     */
    #[test]
    fn panicking_job_is_isolated() {
        let executor = BackgroundExecutor::new(1);
        executor
            .submit(Box::new(|| panic!("callback misbehaved")))
            .unwrap();

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        executor
            .submit(Box::new(move || {
                let _ = done_tx.send(());
            }))
            .unwrap();
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker should survive the panic");
    }

    /**
     * `shutdown_now` steals jobs no worker has started. A single worker is
     * parked on a gate job so the rest of the queue is guaranteed
     * un-started when the steal happens.
     */
    #[test]
    fn shutdown_now_steals_queued_jobs() {
        let executor = BackgroundExecutor::new(1);
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(1);
        let (parked_tx, parked_rx) = crossbeam_channel::bounded(1);

        executor
            .submit(Box::new(move || {
                let _ = parked_tx.send(());
                let _ = gate_rx.recv();
            }))
            .unwrap();
        parked_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("gate job should start");

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let ran = ran.clone();
            executor
                .submit(Box::new(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }

        let stolen = executor.shutdown_now();
        assert_eq!(stolen.len(), 3);
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        /* Release the gate so the pool can terminate. */
        let _ = gate_tx.send(());
        assert!(executor.await_termination(Duration::from_secs(5)));
    }
}
