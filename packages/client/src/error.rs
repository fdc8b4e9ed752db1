//! Error types for the Spyfall client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// A display element the view depends on is not mounted
    #[error("Could not find the {0} element")]
    ElementNotFound(String),

    /// Transport-level failure while connecting or streaming
    #[error("Connection error: {0}")]
    Connection(String),

    /// The event endpoint answered with a non-success status
    #[error("Unexpected HTTP status {0} from event stream")]
    UnexpectedStatus(u16),

    /// The event endpoint answered with something other than `text/event-stream`
    #[error("Unexpected content type '{0}' from event stream")]
    UnexpectedContentType(String),

    /// The server ended the event stream
    #[error("Event stream ended by server")]
    StreamEnded,

    /// A server or navigation URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A lobby code is not a four-digit number
    #[error("Invalid lobby code '{0}'")]
    InvalidLobbyCode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Connection(error.to_string())
    }
}
