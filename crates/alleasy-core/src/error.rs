use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Closed classification of every failure the library can surface.
/// Callers match on this instead of digging through error internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received (connect failure, timeout)
    Network,
    /// 400/401 from a credential endpoint, or 401 from any call
    AuthRejected,
    /// 404
    NotFound,
    /// Any other non-2xx, or a 2xx body that did not parse
    Server,
    /// Persistent store read/write/remove failure
    Storage,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Stored session is not valid JSON: {0}")]
    CorruptSession(#[source] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api(e) => e.kind(),
            Error::Storage(_) | Error::CorruptSession(_) => ErrorKind::Storage,
        }
    }

    /// Text suitable for showing to the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(e) => e.user_message(),
            Error::Storage(_) => "Could not access local storage".to_string(),
            Error::CorruptSession(_) => "Saved session is damaged. Please sign in again.".to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
