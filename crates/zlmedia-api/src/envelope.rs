//! Uniform `{code, msg, data}` response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Response envelope returned by every ZLMediaKit API endpoint.
///
/// `data` is left untyped because the server publishes no per-endpoint
/// schema. Some endpoints answer with top-level fields next to `code`
/// (`port` from `openRtpServer`, `sdp` from `webrtc`, ...); those land in
/// [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Result code, `0` on success.
    pub code: i64,
    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Optional endpoint-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Any other top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Decodes a raw response body.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if the body is not a JSON envelope.
    /// - [`Error::Api`] if `code != 0`; the error still carries the decoded
    ///   envelope.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let envelope = Self::decode_unchecked(body)?;
        if envelope.code != 0 {
            return Err(Error::Api(Box::new(envelope)));
        }
        Ok(envelope)
    }

    /// Decodes a raw response body without inspecting `code`.
    pub(crate) fn decode_unchecked(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(Error::Decode)
    }

    /// Returns `true` when `code == 0`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Returns the message, or an empty string when absent.
    #[must_use]
    pub fn message(&self) -> &str {
        self.msg.as_deref().unwrap_or_default()
    }

    /// Returns `data` when it is a JSON object.
    #[must_use]
    pub fn data_object(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref().and_then(Value::as_object)
    }

    /// Looks up a named field in the `data` object, then among the
    /// top-level extra fields.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data_object()
            .and_then(|data| data.get(name))
            .or_else(|| self.extra.get(name))
    }

    /// Decodes `data` into a caller-chosen type.
    ///
    /// A missing `data` is decoded as JSON `null`, so `Option<T>` targets
    /// accept it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `data` does not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(Error::Decode)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_decode_success_with_data_object() {
        // Arrange
        let body = br#"{"code":0,"data":{"x":1}}"#;

        // Act
        let envelope = Envelope::decode(body).unwrap();

        // Assert
        assert!(envelope.is_success());
        assert_eq!(envelope.data_object().unwrap().get("x"), Some(&Value::from(1)));
        assert!(envelope.msg.is_none());
    }

    #[test]
    fn test_decode_nonzero_code_keeps_envelope() {
        // Arrange
        let body = br#"{"code":1,"msg":"bad secret"}"#;

        // Act
        let err = Envelope::decode(body).unwrap_err();

        // Assert
        let envelope = err.envelope().unwrap();
        assert_eq!(envelope.code, 1);
        assert_eq!(envelope.msg.as_deref(), Some("bad secret"));
        let text = err.to_string();
        assert!(text.contains("code=1"));
        assert!(text.contains("bad secret"));
    }

    #[test]
    fn test_decode_non_json_is_decode_error() {
        // Arrange
        let body = b"<html>502 Bad Gateway</html>";

        // Act
        let err = Envelope::decode(body).unwrap_err();

        // Assert
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_missing_code_is_decode_error() {
        // Arrange & Act
        let err = Envelope::decode(br#"{"msg":"no code"}"#).unwrap_err();

        // Assert
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_array_data_and_top_level_fields() {
        // Arrange
        let body = br#"{"code":0,"data":[{"app":"live"}],"port":30000}"#;

        // Act
        let envelope = Envelope::decode(body).unwrap();

        // Assert
        assert!(envelope.data_object().is_none());
        assert_eq!(envelope.data.as_ref().unwrap().as_array().unwrap().len(), 1);
        assert_eq!(envelope.field("port"), Some(&Value::from(30000)));
    }

    #[test]
    fn test_field_prefers_data_object() {
        // Arrange
        let envelope =
            Envelope::decode(br#"{"code":0,"data":{"key":"inner"},"key":"outer"}"#).unwrap();

        // Act
        let value = envelope.field("key");

        // Assert
        assert_eq!(value, Some(&Value::from("inner")));
    }

    #[test]
    fn test_data_as_typed() {
        // Arrange
        #[derive(Debug, Deserialize)]
        struct ProxyKey {
            key: String,
        }
        let envelope =
            Envelope::decode(br#"{"code":0,"data":{"key":"__defaultVhost__/live/test"}}"#)
                .unwrap();

        // Act
        let parsed: ProxyKey = envelope.data_as().unwrap();

        // Assert
        assert_eq!(parsed.key, "__defaultVhost__/live/test");
    }

    #[test]
    fn test_data_as_missing_data_into_option() {
        // Arrange
        let envelope = Envelope::decode(br#"{"code":0}"#).unwrap();

        // Act
        let parsed: Option<Vec<u32>> = envelope.data_as().unwrap();

        // Assert
        assert!(parsed.is_none());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        // Arrange
        let envelope = Envelope::decode(br#"{"code":0}"#).unwrap();

        // Act
        let json = serde_json::to_string(&envelope).unwrap();

        // Assert
        assert_eq!(json, r#"{"code":0}"#);
    }
}
