use serde::{Deserialize, Serialize};

/// Error produced while unwrapping an [`ApiEnvelope`].
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The server reported an application-level failure. This is
    /// independent of the HTTP status, which may still be 200.
    #[error("api error {code}: {message} (trace {trace_id})")]
    Api {
        code: i32,
        message: String,
        trace_id: String,
    },

    #[error("response envelope carried no data")]
    MissingData,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Envelope wrapping every Shelf API response.
///
/// The `data` field uses `serde_json::value::RawValue` to defer
/// deserialization until the caller knows the concrete payload type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<serde_json::value::RawValue>>,
    #[serde(rename = "x-traceID", default)]
    pub trace_id: String,
}

impl ApiEnvelope {
    /// Unwraps the payload, treating a nonzero `code` as a failure
    /// regardless of transport status.
    pub fn into_data<T: for<'de> Deserialize<'de>>(self) -> Result<T, EnvelopeError> {
        if self.code != 0 {
            return Err(EnvelopeError::Api {
                code: self.code,
                message: self.message,
                trace_id: self.trace_id,
            });
        }
        match self.data {
            Some(raw) => Ok(serde_json::from_str(raw.get())?),
            None => Err(EnvelopeError::MissingData),
        }
    }
}
