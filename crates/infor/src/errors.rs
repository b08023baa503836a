//! Error types for the Infor IDO client.

use thiserror::Error;

/// Errors that can occur while talking to the Infor CloudSuite API.
#[derive(Error, Debug)]
pub enum InforError {
    /// The configuration name points at a production environment.
    /// Constructing a client against it is forbidden.
    #[error(
        "Using production config is forbidden: '{0}'. \
         Use a Test or Demo configuration only."
    )]
    ForbiddenConfig(String),

    /// Token acquisition failed or the token was missing from the response.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A network-level error from the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("Infor API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have any of the known shapes.
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// The requested document or row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}
