/// Failure taxonomy for the upload and status endpoints.
///
/// Every variant is handled at the boundary where it occurs (the
/// submitter or the poller) and turned into a user-visible message; none
/// of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The request never reached the server or never came back.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx status, or a body that is not JSON.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A well-formed response carrying an explicit `error` field.
    #[error("Rejected by server: {0}")]
    ServerRejected(String),

    /// A well-formed response missing a required field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ImportError {
    /// The message without the variant prefix.
    pub fn detail(&self) -> &str {
        match self {
            ImportError::Network(msg)
            | ImportError::Transport(msg)
            | ImportError::ServerRejected(msg)
            | ImportError::MalformedResponse(msg) => msg,
        }
    }
}
