use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Classification for operation errors flowing through the callback error
/// channel or a future rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Canceled,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Canceled => "canceled",
            ErrorCode::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// Error produced by a wrapped operation.
///
/// Delivered through exactly one channel per call: the first callback
/// argument on the callback path, or the rejection of the returned future on
/// the promise path. Serializable so consumers can carry it across process
/// boundaries if they choose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl OpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        OpError {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: Value) -> Self {
        OpError {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Canceled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for OpError {}

impl From<serde_json::Error> for OpError {
    fn from(err: serde_json::Error) -> Self {
        OpError::bad_request(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OpError::new(ErrorCode::BadRequest, "Invalid input");
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.message, "Invalid input");
        assert_eq!(err.data, None);
    }

    #[test]
    fn test_error_with_data() {
        let data = serde_json::json!({"field": "value"});
        let err = OpError::with_data(ErrorCode::Internal, "Server error", data.clone());
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Server error");
        assert_eq!(err.data, Some(data));
    }

    #[test]
    fn test_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::NotFound).expect("serialize code");
        assert_eq!(json, "\"not_found\"");
        let err = OpError::canceled("gone");
        let round: OpError =
            serde_json::from_str(&serde_json::to_string(&err).expect("serialize error"))
                .expect("deserialize error");
        assert_eq!(round, err);
    }

    #[test]
    fn test_display() {
        let err = OpError::not_found("no such op");
        assert_eq!(err.to_string(), "not_found: no such op");
    }
}
