//! Server errors.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Fatal server failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The HTTP server stopped with an error
    #[error("server error: {0}")]
    Serve(#[from] io::Error),

    /// Database could not be opened or initialized
    #[error("storage error: {0}")]
    Storage(String),
}
