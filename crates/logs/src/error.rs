use thiserror::Error;

/// Errors from the one-shot endpoints of the log service (token, blob).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("log service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode log payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors terminating a live log stream.
///
/// A stream error is not authoritative: the blob fetch that follows it is,
/// so consumers generally swallow these and fall back.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The service sent an `error` event with a non-EOF payload.
    #[error("log stream failed: {0}")]
    Remote(String),
    /// The connection itself failed mid-stream.
    #[error("log stream transport error: {0}")]
    Transport(String),
    #[error("failed to decode stream payload: {0}")]
    Decode(#[from] serde_json::Error),
}
