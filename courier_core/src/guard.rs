/*!
 * RAII guard returned by `init()`.
 *
 * The guard ensures the shared executor is torn down before the process
 * exits. It works via Rust's `Drop` trait:
 *
 * ```ignore
 * fn main() {
 *     let _guard = courier::init(Default::default()).unwrap();
 *
 *     // ... dispatch requests ...
 *
 * }   // <-- _guard is dropped here, triggering shutdown()
 * ```
 *
 * The guard does NOT own the `Client` — the client lives in a static
 * `OnceLock` and outlives the guard. The guard merely triggers the
 * shutdown on scope exit. Dispatches issued after that complete with
 * `Rejected` failures; their callbacks still fire.
 */
use tracing::warn;

use crate::client;

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/**
 * Shutdown-on-drop guard for the dispatch client.
 *
 * Created by `init()` and held alive for the duration of the
 * application. Dropping it shuts the shared executor down and waits
 * (bounded) for in-flight transfers to drain.
 */
pub struct Guard {
    /// Intentionally private and zero-sized — the guard is just a token
    /// whose only purpose is to trigger `Drop`.
    _private: (),
}

impl Guard {
    /**
     * Creates a new `Guard`. `pub(crate)` because only `init()` should
     * create guards.
     */
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Some(client) = client::get_client() {
            if !client.shutdown() {
                warn!("shutdown timed out — some transfers may not have finished");
            }
        }
    }
}
