/**
 * The outcome of a dispatch — a single tagged success-or-failure value.
 *
 * Exactly one `Outcome` exists per dispatch. It is created once on the
 * executor thread, delivered once, and never mutated. Both callback
 * shapes (split success/failure pair, unified tagged handler) are thin
 * views over this one value, so the two API styles can never diverge.
 *
 * The failure arm always carries the originating request and, when the
 * exchange got far enough to produce one, the response — enough for a
 * caller to render a diagnostic without poking at dispatcher internals.
 */
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::protocol::request::Request;
use crate::protocol::response::Response;

// ---------------------------------------------------------------------------
// Reply — the success arm
// ---------------------------------------------------------------------------

/**
 * A completed, successful exchange: the request that ran, the response
 * metadata, and the payload bytes.
 *
 * For downloads the payload has also been written to the resolved
 * destination file by the time the callback sees this value.
 */
#[derive(Debug)]
pub struct Reply {
    /// The descriptor this dispatch ran.
    pub request: Request,

    /// Status line and headers of the exchange.
    pub response: Response,

    /// Raw payload bytes.
    pub body: Vec<u8>,
}

impl Reply {
    /**
     * The payload interpreted as UTF-8 text, lossily.
     */
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /**
     * Decodes the payload as JSON into `T`. A payload that does not
     * decode is `Error::DecodeFailed` — the transfer itself succeeded.
     */
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::DecodeFailed { source: e })
    }
}

// ---------------------------------------------------------------------------
// Failure — the failure arm
// ---------------------------------------------------------------------------

/**
 * A dispatch that terminated unsuccessfully, on any path: resolver error,
 * executor rejection, or transfer error.
 */
#[derive(Debug)]
pub struct Failure {
    /// The descriptor this dispatch ran.
    pub request: Request,

    /// The response, when the exchange got far enough to produce one.
    pub response: Option<Response>,

    /// The error category and underlying cause.
    pub error: Error,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/**
 * The terminal result of one dispatch. Exactly one variant is ever
 * populated; it is delivered to exactly one callback.
 */
#[derive(Debug)]
pub enum Outcome {
    /// The transfer completed and the payload is available.
    Success(Reply),
    /// The dispatch terminated with an error.
    Failure(Failure),
}

impl Outcome {
    /// Whether this outcome holds the success arm.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether this outcome holds the failure arm.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /**
     * Consumes the outcome as a success. Accessing a failure this way is a
     * programming error and yields `Error::ResultMisuse` instead of the
     * reply.
     */
    pub fn success(self) -> Result<Reply, Error> {
        match self {
            Outcome::Success(reply) => Ok(reply),
            Outcome::Failure(_) => Err(Error::ResultMisuse {
                expected: "success",
                actual: "failure",
            }),
        }
    }

    /**
     * Consumes the outcome as a failure. Accessing a success this way
     * yields `Error::ResultMisuse`.
     */
    pub fn failure(self) -> Result<Failure, Error> {
        match self {
            Outcome::Failure(failure) => Ok(failure),
            Outcome::Success(_) => Err(Error::ResultMisuse {
                expected: "failure",
                actual: "success",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::request::Method;
    use url::Url;

    fn sample_reply() -> Reply {
        let url = Url::parse("https://example.test/get").unwrap();
        let mut response = Response::pending(url.clone());
        response.status = 200;
        Reply {
            request: Request::new(Method::Get, url),
            response,
            body: br#"{"answer":42}"#.to_vec(),
        }
    }

    /**
     * Wrong-arm access reports `ResultMisuse` rather than panicking.
     */
    #[test]
    fn wrong_arm_access_is_result_misuse() {
        let outcome = Outcome::Success(sample_reply());
        assert!(outcome.is_success());
        match outcome.failure() {
            Err(Error::ResultMisuse { expected, actual }) => {
                assert_eq!(expected, "failure");
                assert_eq!(actual, "success");
            }
            other => panic!("expected ResultMisuse, got {other:?}"),
        }
    }

    /**
     * Right-arm access hands the reply over intact.
     */
    #[test]
    fn success_arm_yields_reply() {
        let reply = Outcome::Success(sample_reply()).success().unwrap();
        assert_eq!(reply.response.status, 200);
        assert_eq!(reply.text(), r#"{"answer":42}"#);
    }

    /**
     * `json()` decodes the payload through serde.
     */
    #[test]
    fn json_decodes_payload() {
        #[derive(serde::Deserialize)]
        struct Answer {
            answer: u32,
        }

        let reply = sample_reply();
        let decoded: Answer = reply.json().unwrap();
        assert_eq!(decoded.answer, 42);
    }

    /**
     * A payload that fails to decode is reported as `DecodeFailed`, not
     * as a transfer failure — the exchange itself completed.
     */
    #[test]
    fn undecodable_payload_is_decode_failure() {
        #[derive(serde::Deserialize)]
        struct Answer {
            #[allow(dead_code)]
            answer: u32,
        }

        let mut reply = sample_reply();
        reply.body = b"not json".to_vec();
        let decoded: Result<Answer, Error> = reply.json();
        assert!(matches!(decoded, Err(Error::DecodeFailed { .. })));
    }
}
