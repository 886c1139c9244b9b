/*!
 * The courier client — central orchestrator that owns the executor, the
 * default transfer engine, and the dispatcher.
 *
 * Lifecycle:
 * 1. User calls `init(options)` → creates a `Client` and stores it in a
 *    global `OnceLock`.
 * 2. The facade's verb functions read the global `Client` and dispatch
 *    descriptors through it.
 * 3. `init` returns a `Guard`; when the guard is dropped (or `shutdown`
 *    is called explicitly), the executor stops accepting work, drains,
 *    and later dispatches complete with `Rejected` failures.
 *
 * The client is intentionally **not** `Clone` — there is exactly one
 * instance per process, held in the `OnceLock`. The shared-executor
 * lifecycle is explicit: initialized by `init`, torn down by `shutdown`,
 * never by static-destructor order.
 */
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::info;

use crate::dispatch::{Callback, DeliveryTarget, Dispatcher};
use crate::error::Error;
use crate::executor::{BackgroundExecutor, Executor};
use crate::protocol::Request;
use crate::transport::{HttpTransport, Transfer};

// ---------------------------------------------------------------------------
// Global singleton
// ---------------------------------------------------------------------------

/**
 * Process-wide singleton holding the initialized `Client`.
 *
 * `OnceLock` ensures `init()` can only succeed once — subsequent calls
 * report `AlreadyInitialized`.
 */
static GLOBAL_CLIENT: OnceLock<Client> = OnceLock::new();

/**
 * Returns the global client, or `None` if `init()` has not been called.
 */
pub fn get_client() -> Option<&'static Client> {
    GLOBAL_CLIENT.get()
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Worker threads in the default background pool.
const DEFAULT_WORKERS: usize = 4;

/// Maximum time `shutdown()` waits for in-flight transfers to finish.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/**
 * Configuration for the dispatch client. All fields default sensibly;
 * the `executor` and `transfer` overrides exist so tests and embedders
 * can swap in the same-thread executor or a stub engine — variants are
 * selected by configuration, not by subtyping.
 */
#[derive(Clone)]
pub struct Options {
    /// Size of the background worker pool (ignored with an `executor` override).
    pub workers: usize,

    /// Connect timeout for the default HTTP engine.
    pub timeout_connect: Duration,

    /// Whole-request timeout for the default HTTP engine.
    pub timeout_global: Duration,

    /// Headers attached to every dispatched request, ahead of any headers
    /// the descriptor itself carries.
    pub headers: Vec<(String, String)>,

    /// Replaces the background pool, e.g. with `SameThreadExecutor` in tests.
    pub executor: Option<Arc<dyn Executor>>,

    /// Replaces the default HTTP engine, e.g. with a stub in tests.
    pub transfer: Option<Arc<dyn Transfer>>,

    /// Default delivery target for dispatches that don't override it.
    pub delivery: DeliveryTarget,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_connect: Duration::from_secs(10),
            timeout_global: Duration::from_secs(30),
            headers: Vec::new(),
            executor: None,
            transfer: None,
            delivery: DeliveryTarget::TransferThread,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/**
 * The dispatch client. Owns the dispatcher (and through it the shared
 * executor), the default transfer engine, and the default delivery
 * target.
 */
pub struct Client {
    dispatcher: Dispatcher,
    transfer: Arc<dyn Transfer>,
    delivery: DeliveryTarget,
    headers: Vec<(String, String)>,
}

impl Client {
    /**
     * Builds a `Client` from options and stores it in the global
     * `OnceLock`.
     *
     * # Steps
     * 1. Build the transfer engine (or take the override).
     * 2. Build the executor (or take the override).
     * 3. Wire the dispatcher and store the client globally.
     */
    pub fn init(options: Options) -> Result<(), Error> {
        /* Early guard: avoid spawning workers if already initialized. */
        if GLOBAL_CLIENT.get().is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let transfer: Arc<dyn Transfer> = match options.transfer {
            Some(transfer) => transfer,
            None => Arc::new(HttpTransport::new(
                options.timeout_connect,
                options.timeout_global,
            )),
        };

        let executor: Arc<dyn Executor> = match options.executor {
            Some(executor) => executor,
            None => Arc::new(BackgroundExecutor::new(options.workers)),
        };

        let client = Client {
            dispatcher: Dispatcher::new(executor),
            transfer,
            delivery: options.delivery,
            headers: options.headers,
        };

        GLOBAL_CLIENT
            .set(client)
            .map_err(|_| Error::AlreadyInitialized)?;

        info!("courier initialized");
        Ok(())
    }

    /**
     * Dispatches a descriptor on the configured default delivery target.
     */
    pub fn dispatch(&self, request: Request, callback: Callback) {
        self.dispatch_to(request, self.delivery.clone(), callback);
    }

    /**
     * Dispatches a descriptor with an explicit delivery target.
     */
    pub fn dispatch_to(&self, request: Request, target: DeliveryTarget, callback: Callback) {
        let request = apply_default_headers(&self.headers, request);
        self.dispatcher
            .dispatch(request, self.transfer.clone(), target, callback);
    }

    /// The shared executor, for lifecycle probes.
    pub fn executor(&self) -> &Arc<dyn Executor> {
        self.dispatcher.executor()
    }

    /**
     * Explicit teardown: stops accepting dispatches and waits (bounded)
     * for in-flight transfers to finish.
     *
     * # Returns
     * `true` if the executor terminated within the timeout.
     */
    pub fn shutdown(&self) -> bool {
        let executor = self.dispatcher.executor();
        executor.shutdown();
        executor.await_termination(SHUTDOWN_TIMEOUT)
    }
}

/**
 * Prepends the client-wide default headers to the descriptor's own, so a
 * per-request header can still follow (and thereby override) a default.
 */
fn apply_default_headers(defaults: &[(String, String)], request: Request) -> Request {
    if defaults.is_empty() {
        return request;
    }
    let mut merged = defaults.to_vec();
    merged.extend_from_slice(request.headers());
    request.with_headers(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Method;
    use url::Url;

    /**
     * Client defaults come first; the descriptor's own headers follow and
     * can shadow them.
     */
    #[test]
    fn default_headers_precede_request_headers() {
        let defaults = vec![("Device".to_string(), "Android".to_string())];
        let url = Url::parse("https://example.test/get").unwrap();
        let request = Request::new(Method::Get, url).with_header("Accept", "application/json");

        let merged = apply_default_headers(&defaults, request);
        let headers: Vec<_> = merged
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            headers,
            vec![("Device", "Android"), ("Accept", "application/json")]
        );
    }

    /**
     * With no defaults configured the descriptor passes through untouched.
     */
    #[test]
    fn no_defaults_leaves_request_alone() {
        let url = Url::parse("https://example.test/get").unwrap();
        let request = Request::new(Method::Get, url).with_header("Accept", "text/plain");
        let merged = apply_default_headers(&[], request);
        assert_eq!(merged.headers().len(), 1);
    }
}
