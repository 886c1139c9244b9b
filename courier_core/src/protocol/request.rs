/**
 * The request descriptor — an immutable value describing one HTTP call.
 *
 * A `Request` is built once, then handed to the dispatcher. It never
 * changes afterwards, which makes it safe to clone into the failure arm
 * of an outcome and safe to re-dispatch as-is (each dispatch is an
 * independent lifecycle).
 *
 * Parameters are an *ordered* key/value list: duplicate keys are allowed
 * and insertion order is preserved, because query-string encoding and
 * request signing both depend on it.
 */
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use url::Url;

use crate::protocol::response::Response;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/**
 * HTTP method of a request. The common verbs plus an escape hatch for
 * anything else (PATCH, HEAD, WebDAV verbs, ...).
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP PUT.
    Put,
    /// HTTP POST.
    Post,
    /// HTTP DELETE.
    Delete,
    /// Any other verb, stored verbatim.
    Other(String),
}

impl Method {
    /**
     * Returns the wire representation of the verb.
     */
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Other(verb) => verb.as_str(),
        }
    }

    /**
     * Whether parameters belong in the request body rather than the query
     * string when no explicit body is supplied.
     */
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/**
 * Basic-auth credentials attached to a request. The transport turns these
 * into an `Authorization` header; the core only carries them.
 */
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password, kept out of `Debug` output.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/**
 * Computes the file to upload from, given the request about to run and its
 * target URL. Invoked on the executing thread, strictly before the
 * transfer begins.
 */
pub type SourceResolver = Arc<dyn Fn(&Request, &Url) -> io::Result<PathBuf> + Send + Sync>;

/**
 * Computes the file to download into, given the pending response and the
 * target URL. Invoked on the executing thread, strictly before any byte
 * is read — the response it sees is `Response::pending`.
 */
pub type DestinationResolver = Arc<dyn Fn(&Response, &Url) -> io::Result<PathBuf> + Send + Sync>;

/**
 * Observes transfer progress as `(transferred_bytes, total_bytes)`.
 * Invoked by the transfer engine on the executing thread, possibly many
 * times per dispatch; `total_bytes` is `0` when the engine cannot know
 * the final size up front.
 */
pub type ProgressHandler = Arc<dyn Fn(u64, u64) + Send + Sync>;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/**
 * One declarative HTTP call: verb, target URL, ordered parameters and
 * headers, optional credentials, optional body source / destination
 * resolvers, optional progress handler.
 *
 * Construction is the only mutation point — the `with_*` builders consume
 * and return the value. Cloning is cheap: resolvers sit behind `Arc`.
 */
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    parameters: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    credentials: Option<Credentials>,
    source: Option<SourceResolver>,
    destination: Option<DestinationResolver>,
    progress: Option<ProgressHandler>,
}

impl Request {
    /**
     * Creates a descriptor for `method` against `url` with no parameters.
     */
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            parameters: Vec::new(),
            headers: Vec::new(),
            credentials: None,
            source: None,
            destination: None,
            progress: None,
        }
    }

    /**
     * Replaces the parameter list. Order is preserved exactly as given;
     * duplicate keys are kept.
     */
    pub fn with_parameters<K, V>(mut self, parameters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /**
     * Replaces the header list. Order is preserved; duplicate names are
     * kept as separate entries.
     */
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /**
     * Appends one header, keeping anything already set.
     */
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /**
     * Attaches basic-auth credentials.
     */
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /**
     * Attaches a source resolver — marks this request as an upload whose
     * body is read from the resolved file.
     */
    pub fn with_source(mut self, resolver: SourceResolver) -> Self {
        self.source = Some(resolver);
        self
    }

    /**
     * Attaches a destination resolver — marks this request as a download
     * whose body is written to the resolved file.
     */
    pub fn with_destination(mut self, resolver: DestinationResolver) -> Self {
        self.destination = Some(resolver);
        self
    }

    /**
     * Attaches a progress handler, called by the transfer engine with
     * `(transferred_bytes, total_bytes)` as the payload moves.
     */
    pub fn with_progress(mut self, handler: ProgressHandler) -> Self {
        self.progress = Some(handler);
        self
    }

    /// The request verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target URL, before query parameters are appended.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The ordered key/value parameter list.
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// The ordered header list.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Basic-auth credentials, when attached.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The upload source resolver, when attached.
    pub fn source(&self) -> Option<&SourceResolver> {
        self.source.as_ref()
    }

    /// The download destination resolver, when attached.
    pub fn destination(&self) -> Option<&DestinationResolver> {
        self.destination.as_ref()
    }

    /// The progress handler, when attached.
    pub fn progress(&self) -> Option<&ProgressHandler> {
        self.progress.as_ref()
    }
}

/*
 * Manual Debug: resolver closures have no Debug of their own, and
 * credentials already redact themselves.
 */
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("parameters", &self.parameters)
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("source", &self.source.as_ref().map(|_| ".."))
            .field("destination", &self.destination.as_ref().map(|_| ".."))
            .field("progress", &self.progress.as_ref().map(|_| ".."))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * Parameter order and duplicate keys must survive construction intact —
     * encoding and signing depend on it.
     */
    #[test]
    fn parameters_keep_order_and_duplicates() {
        let url = Url::parse("https://example.test/get").unwrap();
        let request = Request::new(Method::Get, url).with_parameters([
            ("foo", "bar"),
            ("foo", "baz"),
            ("qux", "1"),
        ]);

        let params: Vec<_> = request
            .parameters()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(params, vec![("foo", "bar"), ("foo", "baz"), ("qux", "1")]);
    }

    /**
     * Headers behave like parameters: insertion order and appended
     * entries survive intact for the transport to apply verbatim.
     */
    #[test]
    fn headers_keep_order_and_appends() {
        let url = Url::parse("https://example.test/get").unwrap();
        let request = Request::new(Method::Get, url)
            .with_headers([("Device", "Android"), ("Accept", "application/json")])
            .with_header("Device", "again");

        let headers: Vec<_> = request
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            headers,
            vec![
                ("Device", "Android"),
                ("Accept", "application/json"),
                ("Device", "again"),
            ]
        );
    }

    /**
     * A cloned descriptor is independent but identical — the re-dispatch
     * contract.
     */
    #[test]
    fn clone_preserves_descriptor() {
        let url = Url::parse("https://example.test/get").unwrap();
        let request = Request::new(Method::Post, url)
            .with_parameters([("a", "b")])
            .with_credentials("user", "pass");

        let copy = request.clone();
        assert_eq!(copy.method(), &Method::Post);
        assert_eq!(copy.parameters(), request.parameters());
        assert_eq!(copy.credentials(), request.credentials());
    }

    /**
     * Debug output must never leak the password.
     */
    #[test]
    fn debug_redacts_password() {
        let url = Url::parse("https://example.test/").unwrap();
        let request = Request::new(Method::Get, url).with_credentials("user", "s3cret");
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("user"));
    }
}
