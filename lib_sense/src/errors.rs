use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// # Endpoint Error
///
/// Every failure the endpoint can observe. None of them is fatal: the
/// connection manager logs connect, transport and close failures and carries
/// on. Only `Transform` is handed back to the caller of a message delivery.
pub enum EndpointError {
    /// The connect attempt to the server failed.
    #[error("Error connecting to {address}: {reason}")]
    Connect {
        /// The server address that was dialled.
        address: String,
        /// What the transport reported.
        reason: String,
    },

    /// The transport reported an error on an established session.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Closing a session failed.
    #[error("Error closing session: {0}")]
    Close(String),

    /// The message transform rejected a payload.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// A pending reconnect was interrupted before it could run.
    #[error("Retry interrupted")]
    RetryInterrupted,

    /// The endpoint configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
