/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to a TrackBack server
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Failed to send message: {0}")]
    Send(String),

    #[error("Outbound channel closed")]
    ChannelClosed,

    #[error("Malformed server message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Admin { status: u16, message: String },
}
