//! Error types for component authorization operations

/// Errors from token acquisition and authorization calls.
///
/// Nothing here is retried internally; callers treat any error as fatal to
/// the single operation and may retry at their discretion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote response lacked a required field. Carries the raw payload.
    #[error("refresh failed: {0}")]
    Refresh(String),

    #[error("transport error: {0}")]
    Transport(#[from] transport::Error),

    #[error("cache error: {0}")]
    Cache(#[from] cache_store::Error),

    /// No verify ticket has been pushed for this platform yet.
    #[error("no component verify ticket stored for {0}")]
    MissingVerifyTicket(String),
}

/// Result alias for component operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_convert_unchanged() {
        let err: Error = transport::Error::Http("connection reset".into()).into();
        match err {
            Error::Transport(transport::Error::Http(msg)) => assert_eq!(msg, "connection reset"),
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn missing_ticket_names_the_platform() {
        let err = Error::MissingVerifyTicket("wx_component".into());
        assert_eq!(
            err.to_string(),
            "no component verify ticket stored for wx_component"
        );
    }
}
