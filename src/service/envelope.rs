//! Response envelope adapter.
//!
//! The service answers either with a plain JSON payload or with a tool-result
//! envelope `{content: [{type, text}], isError}` whose `text` holds the
//! serialized payload. Both shapes are resolved here, once, so callers only
//! ever see a decoded payload or a `ServiceError`.

use super::error::{ServiceError, ServiceResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// A raw service response before decoding
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    /// The body is the payload
    Direct(Value),
    /// The payload is serialized in `text`; `is_error` marks `text` as an error message
    Enveloped { text: Option<String>, is_error: bool },
}

impl ServiceResponse {
    /// Classify a response body by shape.
    pub fn classify(body: Value) -> Self {
        let is_envelope = body
            .as_object()
            .map(|obj| obj.get("content").is_some_and(Value::is_array))
            .unwrap_or(false);
        if !is_envelope {
            return Self::Direct(body);
        }

        let is_error = body.get("isError").and_then(Value::as_bool).unwrap_or(false);
        let text = body
            .get("content")
            .and_then(Value::as_array)
            .and_then(|items| {
                items
                    .iter()
                    .find_map(|item| item.get("text").and_then(Value::as_str))
            })
            .map(str::to_string);

        Self::Enveloped { text, is_error }
    }

    /// Resolve to the payload value, `None` when there is nothing to decode.
    pub fn into_payload(self) -> ServiceResult<Option<Value>> {
        match self {
            Self::Direct(Value::Null) => Ok(None),
            Self::Direct(value) => Ok(Some(value)),
            Self::Enveloped { text, is_error: true } => Err(ServiceError::Remote(
                text.unwrap_or_else(|| "unknown service error".to_string()),
            )),
            Self::Enveloped { text: None, .. } => Ok(None),
            Self::Enveloped { text: Some(text), .. } => match serde_json::from_str(&text) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(error = %e, "enveloped payload is not JSON; treating as empty");
                    Ok(None)
                }
            },
        }
    }
}

/// Decode a raw response into `T`.
///
/// A missing or malformed payload yields `T::default()`; only an explicit
/// error envelope becomes `Err`.
pub fn decode<T>(response: ServiceResponse) -> ServiceResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(value) = response.into_payload()? else {
        return Ok(T::default());
    };
    match serde_json::from_value(value) {
        Ok(payload) => Ok(payload),
        Err(e) => {
            warn!(error = %e, payload = std::any::type_name::<T>(), "malformed payload; treating as empty");
            Ok(T::default())
        }
    }
}
