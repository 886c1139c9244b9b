/*!
 * Error taxonomy for the dispatch core.
 *
 * Every failure path of a dispatch collapses into one of these variants
 * before result delivery runs — the dispatcher never lets an error escape
 * its own boundary. The first four variants are the terminal categories a
 * callback can observe; the remaining ones are construction/lifecycle
 * errors reported before any dispatch exists.
 */

use std::io;

use thiserror::Error;

/// Result type alias for courier operations.
pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/**
 * All errors produced by the dispatch core.
 */
#[derive(Debug, Error)]
pub enum Error {
    /**
     * A source/destination resolver failed, or the location it returned is
     * unusable (missing parent directory, unreadable source file).
     *
     * The transfer is guaranteed not to have started when this is reported.
     */
    #[error("resolution failed: {message}")]
    ResolutionFailed {
        /// What went wrong, in resolver terms.
        message: String,

        /// The underlying I/O error, when one exists.
        #[source]
        source: Option<io::Error>,
    },

    /**
     * Work was submitted to an executor that has already been shut down.
     * The dispatch still completes — with this error as its failure.
     */
    #[error("rejected: executor is shut down")]
    Rejected,

    /**
     * The external transfer function reported an error. Wraps the
     * engine-specific cause (socket error, HTTP status, disk write, ...).
     */
    #[error("transfer failed: {source}")]
    TransferFailed {
        /// The underlying cause reported by the transfer engine.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /**
     * A success payload could not be decoded into the requested type.
     * The transfer itself completed — only the interpretation failed.
     */
    #[error("decode failed: {source}")]
    DecodeFailed {
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /**
     * An `Outcome` was accessed through the wrong arm — success read as
     * failure or vice versa. A programming error on the caller's side,
     * surfaced as a value instead of a panic.
     */
    #[error("result misuse: accessed as {expected} but it is {actual}")]
    ResultMisuse {
        /// The arm the caller asked for.
        expected: &'static str,
        /// The arm the outcome actually holds.
        actual: &'static str,
    },

    /// The target URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// `init()` was called while a client already exists.
    #[error("already initialized")]
    AlreadyInitialized,

    /// A dispatch was requested before `init()`.
    #[error("not initialized")]
    NotInitialized,
}

impl Error {
    /**
     * Builds a `ResolutionFailed` from an I/O error with context.
     */
    pub(crate) fn resolution(message: impl Into<String>, source: io::Error) -> Self {
        Error::ResolutionFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    /**
     * Builds a `TransferFailed` from any engine error.
     */
    pub(crate) fn transfer(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::TransferFailed {
            source: source.into(),
        }
    }
}
