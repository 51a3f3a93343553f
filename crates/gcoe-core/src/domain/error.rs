//! Request validation errors.
//!
//! These are the only errors that cross the engine boundary. Provider
//! failures never show up here; they are folded into the report as data.

/// Errors produced while validating an assessment request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("invalid request: jurisdiction list must not be empty")]
    EmptyJurisdictions,

    #[error("invalid request: jurisdiction at position {position} is blank")]
    BlankJurisdiction { position: usize },

    #[error("invalid request: jurisdiction {jurisdiction} requested more than once")]
    DuplicateJurisdiction { jurisdiction: String },

    #[error("invalid request: missing required profile field: {field}")]
    MissingField { field: String },

    #[error("invalid request: profile field {field} is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Result type for request validation.
pub type RequestResult<T> = std::result::Result<T, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_display() {
        let err = RequestError::EmptyJurisdictions;
        assert!(err.to_string().contains("must not be empty"));

        let err = RequestError::DuplicateJurisdiction {
            jurisdiction: "uk".to_string(),
        };
        assert!(err.to_string().contains("uk"));
    }

    #[test]
    fn test_invalid_field_names_field_and_reason() {
        let err = RequestError::InvalidField {
            field: "revenue".to_string(),
            reason: "must be finite".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("revenue"));
        assert!(msg.contains("must be finite"));
    }
}
