//! Error types for the chat server
//!
//! Defines session-level errors and queue send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// All of these are fatal to the session that raised them. Recoverable
/// conditions (name collision, unknown user) are reported to the client
/// as protocol lines instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Line framing error (oversized line or IO failure while decoding)
    #[error("Line codec error: {0}")]
    Lines(#[from] LinesCodecError),

    /// Channel send error (coordinator gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Client sent nothing within the configured idle timeout
    #[error("Idle timeout")]
    IdleTimeout,

    /// Writer task panicked or was cancelled
    #[error("Writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Listener could not bind (process-fatal)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Message send errors
///
/// Occurs when enqueueing onto an outgoing queue whose writer has stopped.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
