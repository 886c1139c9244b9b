/*!
 * Transport layer — the actual byte-moving collaborator.
 *
 * The dispatcher is engine-agnostic: it calls anything implementing
 * `Transfer`. This module defines that seam plus the default blocking
 * HTTP engine:
 * - `http` — ureq-based engine with ordered query/form encoding and
 *   basic auth
 */

pub mod http;

pub use http::HttpTransport;

use std::fmt;

use crate::protocol::{Request, Response};

// ---------------------------------------------------------------------------
// TransferFailure
// ---------------------------------------------------------------------------

/**
 * Error reported by a transfer engine.
 *
 * Carries the response when the exchange got far enough to produce one
 * (e.g. a non-2xx status), so the failure arm of the outcome can hand the
 * caller the full request/response pair.
 */
#[derive(Debug)]
pub struct TransferFailure {
    /// The response, when one was received before the failure.
    pub response: Option<Response>,

    /// The engine-specific cause.
    pub cause: Box<dyn std::error::Error + Send + Sync>,
}

impl TransferFailure {
    /// A failure that never produced a response (connect error, timeout).
    pub fn new(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            response: None,
            cause: cause.into(),
        }
    }

    /// A failure carrying the response that triggered it.
    pub fn with_response(
        response: Response,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            response: Some(response),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/**
 * The externally supplied network operation, invoked by the dispatcher on
 * the executor thread.
 *
 * `body` is the already-resolved upload payload, when the request carried
 * a source resolver; the engine must use it verbatim instead of encoding
 * parameters into the body.
 */
pub trait Transfer: Send + Sync {
    /**
     * Performs one exchange and returns the response with its payload
     * bytes, or a `TransferFailure`.
     */
    fn perform(
        &self,
        request: &Request,
        body: Option<&[u8]>,
    ) -> Result<(Response, Vec<u8>), TransferFailure>;
}
