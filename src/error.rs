//! Error types for the Active List client

/// Errors returned by every client operation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No resource_id and default list_id has been provided")]
    MissingResourceId,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Entry {row} is missing column '{column}'")]
    MissingColumn { row: usize, column: String },

    #[error("Entry {row} has column '{column}' not present in the first entry")]
    UnexpectedColumn { row: usize, column: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unable to connect to ArcSight ({url}): {message}")]
    Transport { url: String, message: String },

    #[error("ArcSight error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("ArcSight error ({status}) with unrecognized error page")]
    UnparseableRemote { status: u16, body: String },

    #[error("Unexpected response: {status} {reason} {body}")]
    UnexpectedResponse {
        status: u16,
        reason: String,
        body: String,
    },
}

impl Error {
    /// Raised before any request was sent because the inputs were incomplete
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::MissingResourceId)
    }

    /// The server answered, but with an error page or unexpected status
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Remote { .. } | Error::UnparseableRemote { .. } | Error::UnexpectedResponse { .. }
        )
    }

    /// Transport and server failures; the CLI exits on these
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Transport { .. }) || self.is_remote()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
