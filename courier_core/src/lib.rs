/*!
 * courier_core — the dispatch engine.
 *
 * This crate provides the executor abstraction, the request/outcome
 * protocol types, the dispatcher with its exactly-once result delivery,
 * and the default blocking HTTP engine. End users should depend on the
 * `courier` facade crate instead, which re-exports everything and adds
 * the declarative verb entry points.
 *
 * # Module structure
 *
 * - `protocol/` — what a dispatch carries: request descriptor, response,
 *   outcome
 * - `executor/` — where work runs: background pool, same-thread variant
 * - `dispatch/` — one request lifecycle: resolution, transfer, delivery
 * - `transport/` — how bytes move: the `Transfer` seam, ureq engine
 * - `client` — lifecycle: init, global state, default wiring
 * - `guard` — RAII shutdown-on-drop
 */

pub mod client;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod guard;
pub mod protocol;
pub mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use client::{get_client, Client, Options};
pub use dispatch::{deliver, Callback, DeliverySink, DeliveryTarget, Dispatcher};
pub use error::{Error, Result};
pub use executor::{BackgroundExecutor, Executor, Job, Rejected, SameThreadExecutor};
pub use guard::Guard;
pub use protocol::{
    Credentials, DestinationResolver, Failure, Method, Outcome, ProgressHandler, Reply, Request,
    Response, SourceResolver,
};
pub use transport::{HttpTransport, Transfer, TransferFailure};

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/**
 * Initializes the global dispatch client with the given options.
 *
 * Returns `Ok(Guard)` on success. The `Guard` shuts the shared executor
 * down when dropped — keep it alive for the duration of your app, or
 * call [`shutdown`] explicitly.
 *
 * Returns `Err(Error::AlreadyInitialized)` on a second call.
 */
pub fn init(options: Options) -> Result<Guard> {
    client::Client::init(options)?;
    Ok(Guard::new())
}

/**
 * Explicitly tears the global client down: the shared executor stops
 * accepting work and in-flight transfers get a bounded drain window.
 * Later dispatches complete with `Rejected` failures.
 *
 * Returns `true` if everything terminated in time; `true` as well when
 * nothing was initialized (there is nothing to stop).
 */
pub fn shutdown() -> bool {
    match client::get_client() {
        Some(client) => client.shutdown(),
        None => true,
    }
}
