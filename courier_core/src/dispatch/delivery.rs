/**
 * Result delivery — how the terminal outcome reaches the caller.
 *
 * Two independent axes:
 * - *shape*: the caller registers either a split success/failure handler
 *   pair or a single unified handler. Both are views over the same
 *   `Outcome`, so the two conventions cannot drift apart.
 * - *place*: the callback runs inline on the transfer thread, or is
 *   posted to a caller-supplied sink (a UI message queue, a test channel,
 *   any "run this closure over there" primitive).
 *
 * Whatever the combination, the callback fires exactly once per dispatch.
 */
use std::fmt;
use std::sync::Arc;

use crate::protocol::{Failure, Outcome, Reply};

// ---------------------------------------------------------------------------
// Callback — the two shapes
// ---------------------------------------------------------------------------

/**
 * The terminal callback of one dispatch. Consumed on invocation.
 */
pub enum Callback {
    /// Split pair: exactly one of the two closures runs.
    Split {
        /// Runs for the success arm.
        on_success: Box<dyn FnOnce(Reply) + Send>,
        /// Runs for the failure arm, with request/response context inside.
        on_failure: Box<dyn FnOnce(Failure) + Send>,
    },

    /// One closure receiving the tagged success-or-failure value.
    Unified(Box<dyn FnOnce(Outcome) + Send>),
}

impl Callback {
    /**
     * Builds the split shape from two closures.
     */
    pub fn split(
        on_success: impl FnOnce(Reply) + Send + 'static,
        on_failure: impl FnOnce(Failure) + Send + 'static,
    ) -> Self {
        Callback::Split {
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }

    /**
     * Builds the unified shape from one closure.
     */
    pub fn unified(handler: impl FnOnce(Outcome) + Send + 'static) -> Self {
        Callback::Unified(Box::new(handler))
    }

    /**
     * Feeds the outcome to whichever shape this is. Both shapes see the
     * same value with no information loss.
     */
    pub(crate) fn invoke(self, outcome: Outcome) {
        match self {
            Callback::Split {
                on_success,
                on_failure,
            } => match outcome {
                Outcome::Success(reply) => on_success(reply),
                Outcome::Failure(failure) => on_failure(failure),
            },
            Callback::Unified(handler) => handler(outcome),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Split { .. } => f.write_str("Callback::Split"),
            Callback::Unified(_) => f.write_str("Callback::Unified"),
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryTarget & DeliverySink
// ---------------------------------------------------------------------------

/**
 * Anything that can run a closure on some designated thread — an Android
 * main-thread handler, a GUI event loop, a test channel. The core depends
 * on the capability but never implements a concrete queue itself.
 */
pub trait DeliverySink: Send + Sync {
    /// Schedules `work` to run on the sink's thread. Must not block.
    fn post(&self, work: Box<dyn FnOnce() + Send>);
}

/**
 * Where the terminal callback must execute. Supplied by the caller at
 * dispatch time — the core never infers it.
 */
#[derive(Clone)]
pub enum DeliveryTarget {
    /// Invoke the callback inline on the thread that ran the transfer.
    TransferThread,

    /// Post the invocation to this sink and return immediately.
    Sink(Arc<dyn DeliverySink>),
}

impl fmt::Debug for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryTarget::TransferThread => f.write_str("DeliveryTarget::TransferThread"),
            DeliveryTarget::Sink(_) => f.write_str("DeliveryTarget::Sink"),
        }
    }
}

/**
 * Delivers `outcome` to `callback` on the requested target.
 *
 * Inline for `TransferThread`; for a sink, the invocation is posted and
 * this function returns immediately — the callback still fires exactly
 * once, just asynchronously relative to this return.
 */
pub fn deliver(outcome: Outcome, target: &DeliveryTarget, callback: Callback) {
    match target {
        DeliveryTarget::TransferThread => callback.invoke(outcome),
        DeliveryTarget::Sink(sink) => {
            sink.post(Box::new(move || callback.invoke(outcome)));
        }
    }
}
