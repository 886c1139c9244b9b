/*!
 * courier — declarative HTTP request dispatch.
 *
 * This is the main crate users should depend on. It re-exports the core
 * engine API and adds the verb-shaped entry points that build and
 * dispatch requests through the process-wide client.
 *
 * # Quick start
 *
 * ```ignore
 * fn main() {
 *     let _guard = courier::init(Default::default()).unwrap();
 *
 *     courier::get("https://httpbin.org/get", &[("foo1", "bar1"), ("foo2", "bar2")])
 *         .unwrap()
 *         .response_split(
 *             |reply| println!("{}", reply.text()),
 *             |failure| eprintln!("{}: {}", failure.request.url(), failure.error),
 *         );
 *
 *     // _guard is dropped here → executor shutdown, bounded drain
 * }
 * ```
 *
 * # Downloads and uploads
 *
 * ```ignore
 * courier::download("https://httpbin.org/bytes/1048", &[])
 *     .unwrap()
 *     .destination(|_response, _url| Ok("/tmp/test/test.tmp".into()))
 *     .response_unified(|outcome| println!("{outcome:?}"));
 *
 * courier::upload("https://httpbin.org/post", &[])
 *     .unwrap()
 *     .source(|_request, _url| Ok("/tmp/test/payload.bin".into()))
 *     .response_unified(|outcome| println!("{outcome:?}"));
 * ```
 *
 * # Deterministic tests
 *
 * Initialize with `executor: Some(Arc::new(SameThreadExecutor::new()))`
 * and a stub `Transfer`: every dispatch then completes — callback
 * included — before the dispatching call returns.
 */

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

// ---------------------------------------------------------------------------
// Re-exports from courier_core — the public surface area
// ---------------------------------------------------------------------------

pub use courier_core::{
    deliver, get_client, init, shutdown, BackgroundExecutor, Callback, Client, Credentials,
    DeliverySink, DeliveryTarget, DestinationResolver, Dispatcher, Error, Executor, Failure,
    Guard, HttpTransport, Job, Method, Options, Outcome, ProgressHandler, Rejected, Reply,
    Request, Response, Result, SameThreadExecutor, SourceResolver, Transfer, TransferFailure,
};

// ---------------------------------------------------------------------------
// Verb entry points
// ---------------------------------------------------------------------------

/**
 * Builds a GET dispatch for `url` with the given ordered parameters.
 */
pub fn get(url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    request(Method::Get, url, parameters)
}

/**
 * Builds a PUT dispatch.
 */
pub fn put(url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    request(Method::Put, url, parameters)
}

/**
 * Builds a POST dispatch.
 */
pub fn post(url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    request(Method::Post, url, parameters)
}

/**
 * Builds a DELETE dispatch.
 */
pub fn delete(url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    request(Method::Delete, url, parameters)
}

/**
 * Builds a download: a GET whose payload is also written to the location
 * computed by the `destination` resolver.
 */
pub fn download(url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    request(Method::Get, url, parameters)
}

/**
 * Builds an upload: a POST whose body is read from the location computed
 * by the `source` resolver.
 */
pub fn upload(url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    request(Method::Post, url, parameters)
}

/**
 * Builds a dispatch for any verb, including custom ones via
 * `Method::Other`.
 *
 * Fails only if `url` does not parse; everything later — including
 * dispatching before `init` — is reported through the callback, so the
 * exactly-once delivery contract starts here.
 */
pub fn request(method: Method, url: &str, parameters: &[(&str, &str)]) -> Result<Pending> {
    let url = Url::parse(url)?;
    let request =
        Request::new(method, url).with_parameters(parameters.iter().map(|(k, v)| (*k, *v)));
    Ok(Pending {
        request,
        target: None,
    })
}

// ---------------------------------------------------------------------------
// Pending — a built, not-yet-dispatched request
// ---------------------------------------------------------------------------

/**
 * A fully described call waiting for its callback. The terminal
 * `response*` methods hand it to the global client; everything before
 * that is plain descriptor building.
 */
pub struct Pending {
    request: Request,
    target: Option<DeliveryTarget>,
}

impl Pending {
    /// Attaches basic-auth credentials.
    pub fn authenticate(mut self, username: &str, password: &str) -> Self {
        self.request = self.request.with_credentials(username, password);
        self
    }

    /// Appends a request header, after any client-wide defaults.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request = self.request.with_header(name, value);
        self
    }

    /**
     * Attaches a progress handler, called with
     * `(transferred_bytes, total_bytes)` as the payload moves. The total
     * is `0` when the engine cannot know it up front.
     */
    pub fn progress(mut self, handler: impl Fn(u64, u64) + Send + Sync + 'static) -> Self {
        self.request = self.request.with_progress(Arc::new(handler));
        self
    }

    /**
     * Sets the upload source resolver: given the request and target URL,
     * compute the file whose bytes become the body.
     */
    pub fn source(
        mut self,
        resolver: impl Fn(&Request, &Url) -> io::Result<PathBuf> + Send + Sync + 'static,
    ) -> Self {
        self.request = self.request.with_source(Arc::new(resolver));
        self
    }

    /**
     * Sets the download destination resolver: given the pending response
     * and target URL, compute the file the payload is written to.
     */
    pub fn destination(
        mut self,
        resolver: impl Fn(&Response, &Url) -> io::Result<PathBuf> + Send + Sync + 'static,
    ) -> Self {
        self.request = self.request.with_destination(Arc::new(resolver));
        self
    }

    /**
     * Overrides the delivery target for this dispatch (e.g. a UI-thread
     * sink). Without this, the client's configured default applies.
     */
    pub fn deliver_to(mut self, target: DeliveryTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// The descriptor built so far.
    pub fn descriptor(&self) -> &Request {
        &self.request
    }

    /**
     * Dispatches with a split success/failure handler pair. Exactly one
     * of the two closures runs, exactly once.
     */
    pub fn response_split(
        self,
        on_success: impl FnOnce(Reply) + Send + 'static,
        on_failure: impl FnOnce(Failure) + Send + 'static,
    ) {
        self.response(Callback::split(on_success, on_failure));
    }

    /**
     * Dispatches with a unified handler receiving the tagged outcome.
     */
    pub fn response_unified(self, handler: impl FnOnce(Outcome) + Send + 'static) {
        self.response(Callback::unified(handler));
    }

    /**
     * Dispatches with an already-built callback of either shape.
     *
     * If `init` has not been called, the callback receives a failure
     * carrying `Error::NotInitialized` — the dispatch still terminates
     * exactly once instead of silently vanishing.
     */
    pub fn response(self, callback: Callback) {
        let target = self.target.clone();
        match get_client() {
            Some(client) => match target {
                Some(target) => client.dispatch_to(self.request, target, callback),
                None => client.dispatch(self.request, callback),
            },
            None => {
                let failure = Failure {
                    request: self.request,
                    response: None,
                    error: Error::NotInitialized,
                };
                let target = target.unwrap_or(DeliveryTarget::TransferThread);
                deliver(Outcome::Failure(failure), &target, callback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /**
     * Stub engine echoing the ordered parameter list.
     */
    struct EchoTransfer;

    impl Transfer for EchoTransfer {
        fn perform(
            &self,
            request: &Request,
            _body: Option<&[u8]>,
        ) -> std::result::Result<(Response, Vec<u8>), TransferFailure> {
            let mut response = Response::pending(request.url().clone());
            response.status = 200;
            let payload = request
                .parameters()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            Ok((response, payload.into_bytes()))
        }
    }

    /**
     * Builder methods land on the descriptor without touching the global
     * client: headers append in order and the progress handler sticks.
     */
    #[test]
    fn builder_populates_descriptor() {
        let pending = get("https://httpbin.org/get", &[("foo1", "bar1")])
            .unwrap()
            .header("Device", "Android")
            .progress(|_read, _total| {});

        let descriptor = pending.descriptor();
        assert_eq!(descriptor.parameters().len(), 1);
        assert_eq!(
            descriptor.headers(),
            &[("Device".to_string(), "Android".to_string())]
        );
        assert!(descriptor.progress().is_some());
    }

    /*
     * The global client is process-wide state, so the whole facade
     * lifecycle lives in a single test: not-initialized delivery, init
     * with deterministic overrides, inline dispatch, double init, and
     * teardown semantics, in that order.
     */
    #[test]
    fn facade_lifecycle() {
        let invocations = Arc::new(AtomicUsize::new(0));

        /* Before init: the dispatch still terminates, with NotInitialized. */
        let counter = invocations.clone();
        get("https://httpbin.org/get", &[])
            .unwrap()
            .response_unified(move |outcome| {
                counter.fetch_add(1, Ordering::SeqCst);
                let failure = outcome.failure().unwrap();
                assert!(matches!(failure.error, Error::NotInitialized));
            });
        assert_eq!(invocations.load(Ordering::SeqCst), 1);

        /* Deterministic wiring: same-thread executor + stub engine. */
        let _guard = init(Options {
            executor: Some(Arc::new(SameThreadExecutor::new())),
            transfer: Some(Arc::new(EchoTransfer)),
            ..Default::default()
        })
        .unwrap();

        /* Synchronous dispatch: the callback has fired by the next line. */
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();
        get(
            "https://httpbin.org/get",
            &[("foo1", "bar1"), ("foo2", "bar2")],
        )
        .unwrap()
        .authenticate("user", "passwd")
        .response_split(
            move |reply| seen.lock().unwrap().push(reply.text()),
            |failure| panic!("unexpected failure: {}", failure.error),
        );
        assert_eq!(*log.lock().unwrap(), vec!["foo1=bar1&foo2=bar2"]);

        /* A second init is refused. */
        assert!(matches!(
            init(Options::default()),
            Err(Error::AlreadyInitialized)
        ));

        /* Bad URLs fail at build time. */
        assert!(get("not a url", &[]).is_err());

        /* Explicit teardown: later dispatches complete with Rejected. */
        assert!(shutdown());
        let counter = invocations.clone();
        get("https://httpbin.org/get", &[])
            .unwrap()
            .response_unified(move |outcome| {
                counter.fetch_add(1, Ordering::SeqCst);
                let failure = outcome.failure().unwrap();
                assert!(matches!(failure.error, Error::Rejected));
            });
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
    }
}
