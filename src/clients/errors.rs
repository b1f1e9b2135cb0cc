use rspotify::ClientError;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidMood(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("No song at position {index}, the board has {len} songs")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("None of the songs on the board can be saved to a playlist")]
    NothingToSave,

    #[error("Spotify authorization required, open {url}")]
    AuthorizationRequired { url: String },

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Recommendation service returned {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Spotify error: {0}")]
    SpotifyError(#[from] ClientError),

    #[error("Deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}

impl Error {
    /// Whether the failure happened while talking to a remote service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::UnexpectedResponse { .. } | Error::SpotifyError(_)
        )
    }
}
