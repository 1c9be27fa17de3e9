//! Error types for the presence engine

/// Result type alias for presence engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside the engine.
///
/// None of these are fatal: the public contracts turn them into defaults or
/// no-ops and log them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request to the host bridge failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid bridge URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Host bridge answered with a non-success status
    #[error("Host bridge returned {status} for {url}")]
    BridgeStatus { status: u16, url: String },

    /// Discord SDK reported an error
    #[error("Discord error: {0}")]
    Discord(String),

    /// Presence service did not complete its handshake
    #[error("Presence handshake failed: {0}")]
    Handshake(String),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection to the presence service is already closed
    #[error("Presence transport closed")]
    TransportClosed,
}
