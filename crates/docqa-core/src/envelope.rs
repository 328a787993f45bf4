//! Uniform wrapper around a raw backend response.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// The only status code the backend uses for success.
pub const STATUS_OK: u16 = 200;

/// A received backend response: status code, reason phrase and raw body.
///
/// Envelopes are immutable once received. The text and JSON views are
/// decoded from the stored body on every call.
///
/// Any status other than 200 is an error, including other 2xx codes and
/// redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    status: u16,
    reason: String,
    body: Bytes,
}

impl Envelope {
    /// Creates a new envelope.
    pub fn new(status: u16, reason: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Creates a `200 OK` envelope with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(STATUS_OK, "OK", body)
    }

    /// Creates a `200 OK` envelope whose body is the JSON encoding of `value`.
    pub fn ok_json(value: &serde_json::Value) -> Self {
        Self::ok(value.to_string())
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the protocol status phrase.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` for any status other than 200.
    pub fn is_error(&self) -> bool {
        self.status != STATUS_OK
    }

    /// Decodes the body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        let text = std::str::from_utf8(&self.body)?;
        Ok(text.to_owned())
    }

    /// Decodes the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            Error::from(e).with_message(format!(
                "Body did not decode as {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Converts an error envelope into an [`ErrorKind::Http`] error.
    ///
    /// [`ErrorKind::Http`]: crate::ErrorKind::Http
    pub fn into_result(self) -> Result<Self> {
        if self.is_error() {
            Err(Error::http(self.status, self.reason))
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_only_200_is_success() {
        assert!(!Envelope::new(200, "OK", "").is_error());

        for status in [201, 204, 302, 304, 400, 404, 500, 503] {
            assert!(Envelope::new(status, "", "").is_error(), "status {status}");
        }
    }

    #[test]
    fn test_reason_is_exposed() {
        let envelope = Envelope::new(404, "Not Found", "missing");
        assert_eq!(envelope.reason(), "Not Found");
        assert_eq!(envelope.status(), 404);
    }

    #[test]
    fn test_text_reads_fresh_each_time() {
        let envelope = Envelope::ok("\"answer\"");
        assert_eq!(envelope.text().unwrap(), "\"answer\"");
        assert_eq!(envelope.text().unwrap(), "\"answer\"");
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let envelope = Envelope::ok(vec![0xff, 0xfe]);
        let error = envelope.text().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Decode);
    }

    #[test]
    fn test_json_shape_mismatch_is_decode_error() {
        let envelope = Envelope::ok(r#"{"not": "a list"}"#);
        let error = envelope.json::<Vec<String>>().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Decode);

        let names: serde_json::Value = envelope.json().unwrap();
        assert_eq!(names["not"], "a list");
    }

    #[test]
    fn test_into_result() {
        assert!(Envelope::ok("[]").into_result().is_ok());

        let error = Envelope::new(302, "Found", "").into_result().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Http);
        assert_eq!(error.status(), Some(302));
        assert_eq!(error.reason(), Some("Found"));
    }
}
