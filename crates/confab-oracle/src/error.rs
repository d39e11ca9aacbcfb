use thiserror::Error;

/// Errors produced by the oracle layer.
#[derive(Error, Debug)]
pub enum OracleError {
    /// Transport failure talking to the completion endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with something other than a completion.
    #[error("Bad completion response: {0}")]
    BadResponse(String),

    /// A scripted oracle was told to simulate an outage.
    #[error("Oracle unavailable")]
    Unavailable,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OracleError>;
