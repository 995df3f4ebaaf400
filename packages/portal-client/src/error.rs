//! Error type for portal API calls.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PortalError>;

/// Error returned by [`PortalClient`](crate::PortalClient) operations.
///
/// `Transport` covers connection/TLS/timeout failures before a response
/// arrives; `Api` covers non-2xx responses with the body preserved for
/// diagnosis; `MissingField` means the server answered 2xx but the payload
/// violates the portal contract (e.g. a version object without a version
/// string).
#[derive(Debug, Error)]
pub enum PortalError {
    /// HTTP transport failure (connect, timeout, TLS, body read).
    #[error("portal request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Portal returned a non-success status code.
    #[error("portal API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Portal response is missing a field the caller requires.
    #[error("portal response for {object} is missing required field `{field}`")]
    MissingField {
        object: &'static str,
        field: &'static str,
    },
}

impl PortalError {
    /// True for `Api` errors with a 404 status.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortalError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status_and_body() {
        let err = PortalError::Api {
            status: 422,
            message: "duplicate name".into(),
        };
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("duplicate name"));
    }

    #[test]
    fn test_is_not_found() {
        let missing = PortalError::Api {
            status: 404,
            message: String::new(),
        };
        let server = PortalError::Api {
            status: 500,
            message: String::new(),
        };
        assert!(missing.is_not_found());
        assert!(!server.is_not_found());
    }
}
