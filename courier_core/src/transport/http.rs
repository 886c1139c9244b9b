/*!
 * Default HTTP engine built on `ureq` — a pure-Rust blocking client with
 * no async runtime.
 *
 * Blocking is the right shape here: transfers already run on a dedicated
 * executor thread, so there is nothing to yield to.
 *
 * Behavior:
 * - Parameters are appended to the query string in insertion order with
 *   duplicate keys preserved — except for POST/PUT without an upload
 *   body, where they are form-urlencoded as the body instead.
 * - An upload body (from a source resolver) is sent verbatim as
 *   `application/octet-stream`; parameters then stay in the query string.
 * - Credentials become a basic-auth `Authorization` header.
 * - Non-2xx statuses are reported as transfer failures carrying the
 *   response, so the caller's failure handler sees the full exchange.
 */

use std::fmt;
use std::io::Read;
use std::time::Duration;

use base64::Engine;
use tracing::debug;
use ureq::Agent;
use url::Url;

use crate::protocol::{Method, ProgressHandler, Request, Response};
use crate::transport::{Transfer, TransferFailure};

/// Default connect timeout, matching a patient interactive client.
const DEFAULT_TIMEOUT_CONNECT: Duration = Duration::from_secs(10);

/// Default whole-request timeout.
const DEFAULT_TIMEOUT_GLOBAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// HttpStatus — non-2xx as a typed cause
// ---------------------------------------------------------------------------

/**
 * Cause attached to transfer failures triggered by a non-2xx status.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatus(pub u16);

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http status {}", self.0)
    }
}

impl std::error::Error for HttpStatus {}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/**
 * Thin wrapper around `ureq::Agent` implementing the `Transfer` seam.
 *
 * One instance is created per client configuration and shared by every
 * dispatch; the agent handles connection reuse internally.
 */
pub struct HttpTransport {
    agent: Agent,
}

impl HttpTransport {
    /**
     * Creates a transport with the given timeouts. Status codes are not
     * turned into `ureq` errors — this layer decides what a failure is.
     */
    pub fn new(timeout_connect: Duration, timeout_global: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_connect(Some(timeout_connect))
            .timeout_global(Some(timeout_global))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_CONNECT, DEFAULT_TIMEOUT_GLOBAL)
    }
}

impl Transfer for HttpTransport {
    fn perform(
        &self,
        request: &Request,
        body: Option<&[u8]>,
    ) -> Result<(Response, Vec<u8>), TransferFailure> {
        /*
         * Parameters form the body only for POST/PUT without an explicit
         * upload payload; everything else keeps them in the query string.
         */
        let form = if request.method().carries_body() && body.is_none() {
            Some(encode_form(request.parameters()))
        } else {
            None
        };
        let url = build_url(request, form.is_none());

        /* Upload bytes win over form encoding; each carries its own type. */
        let payload: Option<(&str, &[u8])> = match (body, form.as_deref()) {
            (Some(bytes), _) => Some(("application/octet-stream", bytes)),
            (None, Some(encoded)) if !encoded.is_empty() => {
                Some(("application/x-www-form-urlencoded", encoded.as_bytes()))
            }
            _ => None,
        };

        let auth = request
            .credentials()
            .map(|c| basic_auth(&c.username, &c.password));

        debug!(method = %request.method(), url = %url, "performing transfer");

        let exchanged = match request.method() {
            Method::Get | Method::Delete => {
                if payload.is_some() {
                    return Err(TransferFailure::new(format!(
                        "method {} cannot carry an upload body",
                        request.method()
                    )));
                }
                let mut builder = match request.method() {
                    Method::Get => self.agent.get(url.as_str()),
                    _ => self.agent.delete(url.as_str()),
                };
                for (name, value) in request.headers() {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                if let Some(auth) = &auth {
                    builder = builder.header("Authorization", auth.as_str());
                }
                builder.call()
            }
            Method::Post | Method::Put => {
                let mut builder = match request.method() {
                    Method::Post => self.agent.post(url.as_str()),
                    _ => self.agent.put(url.as_str()),
                };
                for (name, value) in request.headers() {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                if let Some(auth) = &auth {
                    builder = builder.header("Authorization", auth.as_str());
                }
                match payload {
                    Some((content_type, bytes)) => {
                        builder.content_type(content_type).send(bytes)
                    }
                    None => builder.send_empty(),
                }
            }
            Method::Other(verb) => {
                /*
                 * Custom verbs go through a prepared http::Request run on
                 * the same agent.
                 */
                let method = http_method(verb)?;
                let mut builder = ureq::http::Request::builder()
                    .method(method)
                    .uri(url.as_str());
                for (name, value) in request.headers() {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                if let Some(auth) = &auth {
                    builder = builder.header("Authorization", auth.as_str());
                }
                match payload {
                    Some((content_type, bytes)) => {
                        let prepared = builder
                            .header("Content-Type", content_type)
                            .body(bytes)
                            .map_err(TransferFailure::new)?;
                        self.agent.run(prepared)
                    }
                    None => {
                        let prepared = builder
                            .body(&b""[..])
                            .map_err(TransferFailure::new)?;
                        self.agent.run(prepared)
                    }
                }
            }
        };

        let mut exchanged = exchanged.map_err(TransferFailure::new)?;

        let response = Response {
            url,
            status: exchanged.status().as_u16(),
            headers: exchanged
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        };

        /*
         * With a progress handler the body is drained chunk by chunk so
         * the handler sees the transfer advance; the total comes from
         * Content-Length when the server sent one.
         */
        let bytes = match request.progress() {
            Some(progress) => {
                let total = response
                    .header("content-length")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);
                read_with_progress(&mut exchanged.body_mut().as_reader(), total, progress)
                    .map_err(|e| TransferFailure::with_response(response.clone(), e))?
            }
            None => exchanged
                .body_mut()
                .read_to_vec()
                .map_err(|e| TransferFailure::with_response(response.clone(), e))?,
        };

        if !response.is_success() {
            let status = HttpStatus(response.status);
            return Err(TransferFailure::with_response(response, status));
        }

        Ok((response, bytes))
    }
}

// ---------------------------------------------------------------------------
// Pure helpers — unit tested without touching the network
// ---------------------------------------------------------------------------

/**
 * Validates a custom verb and maps it onto the wire method.
 */
fn http_method(verb: &str) -> Result<ureq::http::Method, TransferFailure> {
    ureq::http::Method::from_bytes(verb.as_bytes()).map_err(TransferFailure::new)
}

/**
 * Builds the effective URL: the descriptor's URL, plus the parameter list
 * appended to the query string (insertion order, duplicates kept) when
 * `with_parameters` is true.
 */
fn build_url(request: &Request, with_parameters: bool) -> Url {
    let mut url = request.url().clone();
    if with_parameters && !request.parameters().is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in request.parameters() {
            pairs.append_pair(key, value);
        }
        drop(pairs);
    }
    url
}

/**
 * Form-urlencodes the parameter list in order.
 */
fn encode_form(parameters: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in parameters {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/**
 * Drains `reader` in chunks, reporting `(read_so_far, total)` to the
 * handler after each chunk. `total` is `0` when the size is unknown.
 */
fn read_with_progress(
    reader: &mut impl Read,
    total: u64,
    progress: &ProgressHandler,
) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut chunk = [0u8; 8 * 1024];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress(bytes.len() as u64, total);
    }
    Ok(bytes)
}

/**
 * Basic-auth header value: `Basic base64(username:password)`.
 */
fn basic_auth(username: &str, password: &str) -> String {
    let raw = format!("{username}:{password}");
    let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
    format!("Basic {encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(method: Method) -> Request {
        Request::new(method, Url::parse("https://example.test/get").unwrap())
    }

    /**
     * Query parameters keep insertion order and duplicate keys.
     */
    #[test]
    fn build_url_preserves_order_and_duplicates() {
        let request = descriptor(Method::Get).with_parameters([
            ("foo1", "bar1"),
            ("foo2", "bar2"),
            ("foo1", "again"),
        ]);
        let url = build_url(&request, true);
        assert_eq!(
            url.as_str(),
            "https://example.test/get?foo1=bar1&foo2=bar2&foo1=again"
        );
    }

    /**
     * Existing query parameters on the target URL survive the append.
     */
    #[test]
    fn build_url_keeps_existing_query() {
        let url = Url::parse("https://example.test/get?fixed=1").unwrap();
        let request = Request::new(Method::Get, url).with_parameters([("foo", "bar")]);
        let built = build_url(&request, true);
        assert_eq!(built.as_str(), "https://example.test/get?fixed=1&foo=bar");
    }

    /**
     * Form encoding is ordered and escapes reserved characters.
     */
    #[test]
    fn encode_form_is_ordered_and_escaped() {
        let encoded = encode_form(&[
            ("a".into(), "1 2".into()),
            ("b".into(), "x&y".into()),
        ]);
        assert_eq!(encoded, "a=1+2&b=x%26y");
    }

    /**
     * The basic-auth header matches the RFC 7617 form for a known pair.
     */
    #[test]
    fn basic_auth_matches_known_value() {
        // base64("user:passwd") per the RFC example style
        assert_eq!(basic_auth("user", "passwd"), "Basic dXNlcjpwYXNzd2Q=");
    }

    /**
     * Progress reads report cumulative counts against the known total
     * and return the complete payload.
     */
    #[test]
    fn progress_read_reports_cumulative_counts() {
        use std::sync::{Arc, Mutex};

        let payload = vec![7u8; 20 * 1024];
        let seen = Arc::new(Mutex::new(Vec::new()));

        let reported = seen.clone();
        let progress: ProgressHandler = Arc::new(move |read, total| {
            reported.lock().unwrap().push((read, total));
        });

        let mut reader = std::io::Cursor::new(payload.clone());
        let bytes =
            read_with_progress(&mut reader, payload.len() as u64, &progress).unwrap();
        assert_eq!(bytes, payload);

        let events = seen.lock().unwrap();
        assert!(!events.is_empty());
        // Counts grow monotonically and end at the full size.
        assert!(events.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert_eq!(events.last(), Some(&(payload.len() as u64, payload.len() as u64)));
    }

    /**
     * Custom verbs are validated; garbage is a transfer failure, not a
     * panic.
     */
    #[test]
    fn custom_verbs_are_validated() {
        assert!(http_method("PATCH").is_ok());
        assert!(http_method("NOT A VERB").is_err());
    }
}
