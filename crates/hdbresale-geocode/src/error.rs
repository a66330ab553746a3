use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(String),
}
