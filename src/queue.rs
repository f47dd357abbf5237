//! Outgoing queue
//!
//! Per-session FIFO of rendered lines waiting for the client writer.
//! The producer end, `Outgoing`, is a single non-cloneable owner: the
//! session holds it while registering and hands it to the coordinator on
//! a successful claim. Whoever holds it may enqueue; only the holder may
//! close it, and closing consumes it.

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::SendError;
use crate::message::Message;

/// Producer end of an outgoing queue
#[derive(Debug)]
pub struct Outgoing {
    sender: mpsc::UnboundedSender<String>,
}

/// Consumer end of an outgoing queue, drained by the client writer
#[derive(Debug)]
pub struct QueueReceiver {
    receiver: mpsc::UnboundedReceiver<String>,
}

/// Create a new outgoing queue
///
/// Unbounded so that enqueueing never waits on a slow client.
pub fn channel() -> (Outgoing, QueueReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Outgoing { sender }, QueueReceiver { receiver })
}

impl Outgoing {
    /// Enqueue one line
    ///
    /// Returns an error if the writer has already stopped.
    pub fn send(&self, msg: impl Into<String>) -> Result<(), SendError> {
        self.sender
            .send(msg.into())
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Enqueue a protocol message
    pub fn deliver(&self, msg: &Message) -> Result<(), SendError> {
        self.send(msg.to_string())
    }

    /// Close the queue; the writer drains what is already queued, then stops.
    pub fn close(self) {
        trace!("Outgoing queue closed");
        drop(self.sender);
    }

}

impl QueueReceiver {
    /// Next queued line, or None once the queue is closed and drained
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }
}
