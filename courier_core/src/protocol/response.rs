/**
 * Response metadata for a completed (or pending) transfer.
 *
 * The body does not live here — a successful dispatch carries its payload
 * in `Reply`, and a download streams it into the resolved destination
 * file. Keeping `Response` body-free lets the failure arm of an outcome
 * carry the triggering response without duplicating payload bytes.
 */
use url::Url;

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/**
 * Status line and headers of an HTTP exchange.
 *
 * Header order is preserved as received; duplicate header names are kept
 * as separate entries.
 */
#[derive(Clone, Debug)]
pub struct Response {
    /// The URL the exchange actually ran against (query string included).
    pub url: Url,

    /// HTTP status code. `0` for a pending response that never hit the wire.
    pub status: u16,

    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
}

impl Response {
    /**
     * The placeholder handed to destination resolvers before the transfer
     * starts. Resolution strictly precedes the wire exchange, so there is
     * no status and there are no headers yet.
     */
    pub fn pending(url: Url) -> Self {
        Self {
            url,
            status: 0,
            headers: Vec::new(),
        }
    }

    /// Whether this response is the pre-transfer placeholder.
    pub fn is_pending(&self) -> bool {
        self.status == 0
    }

    /// Whether the status code is in the 2xx success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /**
     * First header value with the given name, compared case-insensitively.
     */
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_has_no_status_or_headers() {
        let response = Response::pending(Url::parse("https://example.test/file").unwrap());
        assert!(response.is_pending());
        assert!(!response.is_success());
        assert!(response.headers.is_empty());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut response = Response::pending(Url::parse("https://example.test/").unwrap());
        response.status = 200;
        response.headers = vec![("Content-Type".into(), "text/plain".into())];
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.header("x-missing"), None);
    }
}
