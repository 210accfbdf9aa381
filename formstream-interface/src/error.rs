//! Error types for formstream operations.

use std::{borrow::Cow, io};

use thiserror::Error;

/// Common error types that can occur while building or reading a stream.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument does not satisfy the capability the operation requires.
    #[error("Invalid input: {0}")]
    InvalidInput(Cow<'static, str>),
    /// The stream does not accept writes.
    #[error("Stream is not writable")]
    WriteRejected,
    /// The stream does not support seeking.
    #[error("Stream is not seekable")]
    NotSeekable,
    /// The requested position lies beyond the end of the stream.
    #[error("Cannot seek to offset {0}")]
    SeekOutOfBounds(u64),
    /// The underlying resource has been detached or closed.
    #[error("Stream is detached")]
    Detached,
    /// An underlying I/O error occurred.
    #[error("IO Error")]
    Io(#[from] io::Error),
}

/// Result type for formstream operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::InvalidInput(_) | Error::SeekOutOfBounds(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            Error::WriteRejected | Error::NotSeekable => {
                io::Error::new(io::ErrorKind::Unsupported, e)
            }
            Error::Detached => io::Error::new(io::ErrorKind::NotConnected, e),
        }
    }
}
