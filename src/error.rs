//! Error types for the server binary and library entry points.

use thiserror::Error;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The Harvest client could not be configured
    #[error("Harvest error: {0}")]
    Harvest(#[from] crate::harvest::HarvestError),

    /// Reading or writing the message stream failed
    #[error("Transport error: {0}")]
    Transport(#[from] tokio_util::codec::LinesCodecError),

    /// The writer task panicked or was cancelled
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
