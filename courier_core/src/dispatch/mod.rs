/*!
 * Dispatch layer — one request lifecycle from descriptor submission to
 * terminal callback invocation.
 *
 * Control flow per dispatch:
 *
 * ```text
 *  caller thread                      executor thread
 *  ─────────────                      ───────────────
 *  dispatch(request, ...)
 *    └─ submit(job) ───────────────►  resolve source/destination
 *         │                           transfer (external engine)
 *         │ Rejected?                 write download, wrap Outcome
 *         └─ deliver(Rejected) ◄──┐   deliver(outcome)
 *                                 └── (whichever path wins the slot)
 * ```
 *
 * The exactly-once guarantee is structural: the callback lives in a
 * take-once slot shared by the transfer path and the rejection fallback,
 * so no path can invoke it twice and every path that loses the race backs
 * off. Every failure is converted into a failure outcome before delivery
 * — nothing escapes the dispatcher as a panic or error.
 */

pub mod delivery;

pub use delivery::{deliver, Callback, DeliverySink, DeliveryTarget};

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::Error;
use crate::executor::Executor;
use crate::protocol::{Failure, Outcome, Reply, Request, Response};
use crate::transport::Transfer;

// ---------------------------------------------------------------------------
// Phase — per-dispatch state machine
// ---------------------------------------------------------------------------

/**
 * Lifecycle phases of one dispatch. Resolution strictly precedes the
 * transfer: no file is created and no byte moves before `Resolved`.
 *
 * `Pending → Resolving → Resolved → Transferring → Succeeded`
 * with terminal failure exits at `Resolving` (resolution failed) and
 * `Transferring` (transfer failed).
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pending,
    Resolving,
    Resolved,
    Transferring,
    Succeeded,
    TransferFailed,
    ResolutionFailed,
}

/**
 * Tracks the phase of one dispatch and logs every transition.
 */
struct PhaseTracker {
    url: url::Url,
    phase: Phase,
}

impl PhaseTracker {
    fn start(url: url::Url) -> Self {
        Self {
            url,
            phase: Phase::Pending,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug!(url = %self.url, from = ?self.phase, to = ?next, "dispatch phase");
        self.phase = next;
    }
}

// ---------------------------------------------------------------------------
// CallbackSlot — structural exactly-once
// ---------------------------------------------------------------------------

/**
 * Shared take-once cell holding the callback of one dispatch.
 *
 * Cloned into the submitted job while the dispatcher keeps its own
 * handle: if submission is rejected, the dispatcher reclaims the callback
 * and delivers the rejection failure itself. Whoever takes first wins;
 * the loser observes `None` and backs off.
 */
#[derive(Clone)]
struct CallbackSlot {
    inner: Arc<Mutex<Option<Callback>>>,
}

impl CallbackSlot {
    fn new(callback: Callback) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(callback))),
        }
    }

    /// Takes the callback out, exactly once across all clones.
    fn take(&self) -> Option<Callback> {
        match self.inner.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None, /* poisoned — the winning path already ran */
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/**
 * Submits request descriptors to the executor and guarantees exactly one
 * result delivery per dispatch.
 *
 * The dispatcher owns nothing request-specific — every dispatch carries
 * its own descriptor, transfer engine, delivery target, and callback, so
 * concurrent dispatches share only the executor.
 */
pub struct Dispatcher {
    executor: Arc<dyn Executor>,
}

impl Dispatcher {
    /// Creates a dispatcher over the given executor.
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// The executor all dispatches are submitted to.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /**
     * Dispatches one request: submits the resolution + transfer + delivery
     * unit to the executor, falling back to an inline `Rejected` failure
     * delivery if the executor no longer accepts work.
     *
     * The registered callback fires exactly once on every path.
     */
    pub fn dispatch(
        &self,
        request: Request,
        transfer: Arc<dyn Transfer>,
        target: DeliveryTarget,
        callback: Callback,
    ) {
        let slot = CallbackSlot::new(callback);

        let job_slot = slot.clone();
        let job_request = request.clone();
        let job_target = target.clone();
        let job = Box::new(move || {
            let Some(callback) = job_slot.take() else {
                return;
            };
            let outcome = run_lifecycle(job_request, transfer.as_ref());
            deliver(outcome, &job_target, callback);
        });

        if self.executor.submit(job).is_err() {
            /*
             * Rejection still terminates the dispatch with a delivered
             * failure — never a silent drop. The slot arbitrates against
             * the (dropped) job.
             */
            warn!(url = %request.url(), "executor rejected dispatch");
            if let Some(callback) = slot.take() {
                let failure = Failure {
                    request,
                    response: None,
                    error: Error::Rejected,
                };
                deliver(Outcome::Failure(failure), &target, callback);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle execution (runs on the executor thread)
// ---------------------------------------------------------------------------

/**
 * Runs resolution, transfer, and download write-through for one request,
 * producing the single outcome to deliver.
 */
fn run_lifecycle(request: Request, transfer: &dyn Transfer) -> Outcome {
    let mut phase = PhaseTracker::start(request.url().clone());

    /*
     * Resolution phase — strictly before any transfer work. Either
     * resolver failing (or resolving to an unusable location) aborts the
     * whole dispatch; the transfer function is never invoked.
     */
    phase.advance(Phase::Resolving);

    let resolved = resolve_source(&request)
        .and_then(|body| resolve_destination(&request).map(|dest| (body, dest)));
    let (body, destination) = match resolved {
        Ok(resolved) => resolved,
        Err(error) => {
            phase.advance(Phase::ResolutionFailed);
            return Outcome::Failure(Failure {
                request,
                response: None,
                error,
            });
        }
    };

    phase.advance(Phase::Resolved);

    /*
     * Transfer phase — the external engine moves the bytes.
     */
    phase.advance(Phase::Transferring);
    match transfer.perform(&request, body.as_deref()) {
        Ok((response, bytes)) => {
            /*
             * Download write-through happens inside the transfer phase: the
             * destination was resolved up front, so a write error here is a
             * transfer failure, not a resolution one.
             */
            if let Some(path) = destination {
                if let Err(e) = fs::write(&path, &bytes) {
                    phase.advance(Phase::TransferFailed);
                    return Outcome::Failure(Failure {
                        request,
                        response: Some(response),
                        error: Error::transfer(e),
                    });
                }
            }

            phase.advance(Phase::Succeeded);
            Outcome::Success(Reply {
                request,
                response,
                body: bytes,
            })
        }
        Err(failure) => {
            phase.advance(Phase::TransferFailed);
            Outcome::Failure(Failure {
                request,
                response: failure.response,
                error: Error::TransferFailed {
                    source: failure.cause,
                },
            })
        }
    }
}

/**
 * Resolves and reads the upload source, when the request carries one.
 * An unreadable source file is an unusable location — resolution failed.
 */
fn resolve_source(request: &Request) -> Result<Option<Vec<u8>>, Error> {
    let Some(resolver) = request.source() else {
        return Ok(None);
    };

    let path = resolver(request, request.url())
        .map_err(|e| Error::resolution("source resolver failed", e))?;
    let bytes = fs::read(&path).map_err(|e| {
        Error::resolution(format!("source {} is unreadable", path.display()), e)
    })?;
    Ok(Some(bytes))
}

/**
 * Resolves the download destination, when the request carries one. The
 * resolver sees the pending response — the transfer has not started.
 * A location whose parent directory does not exist is unusable.
 */
fn resolve_destination(request: &Request) -> Result<Option<PathBuf>, Error> {
    let Some(resolver) = request.destination() else {
        return Ok(None);
    };

    let pending = Response::pending(request.url().clone());
    let path = resolver(&pending, request.url())
        .map_err(|e| Error::resolution("destination resolver failed", e))?;

    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => Ok(Some(path)),
        Some(parent) => Err(Error::ResolutionFailed {
            message: format!("destination directory {} does not exist", parent.display()),
            source: None,
        }),
        None => Err(Error::ResolutionFailed {
            message: format!("destination {} is not a file path", path.display()),
            source: None,
        }),
    }
}
