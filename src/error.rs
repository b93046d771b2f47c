//! Error types for the order index.
//!
//! Placement itself cannot fail and packet decoding is total, so the only
//! runtime failure is the packet stream's own I/O error. Everything else
//! here concerns configuration.

use thiserror::Error;

/// Error type for book construction and loading.
#[derive(Debug, Error)]
pub enum Error {
    /// Read failure from the packet stream, passed on as is.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A read chunk must hold at least one byte.
    #[error("invalid read size {size}: must be at least 1 byte")]
    InvalidReadSize { size: usize },
}

/// Result alias over [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
