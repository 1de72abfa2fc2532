use std::io;

use thiserror::Error;

/// Persisted overlay text could not be decoded.
#[derive(Debug, Error)]
#[error("malformed action overlay: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// The local store could not be read or written.
///
/// Never fatal: the in-memory state stays authoritative for the session
/// and the next mutation retries the write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("persisted overlay is corrupt: {0}")]
    Corrupt(#[from] ParseError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
