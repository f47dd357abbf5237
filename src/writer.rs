//! Client writer
//!
//! One per session. Drains the session's outgoing queue into the socket
//! in FIFO order, so lines from different producers never interleave.

use futures_util::{Sink, SinkExt};
use tokio_util::codec::LinesCodecError;
use tracing::debug;

use crate::error::AppError;
use crate::queue::QueueReceiver;

/// Run the writer until the queue closes or a write fails
///
/// On queue close the sink is flushed and closed, which shuts down the
/// write half of the connection.
pub async fn run<S>(mut sink: S, mut queue: QueueReceiver) -> Result<(), AppError>
where
    S: Sink<String, Error = LinesCodecError> + Unpin,
{
    while let Some(line) = queue.recv().await {
        if let Err(e) = sink.send(line).await {
            debug!("Write failed, ending writer: {}", e);
            return Err(e.into());
        }
    }

    debug!("Outgoing queue closed, shutting down writer");
    sink.close().await?;
    Ok(())
}
