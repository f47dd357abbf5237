//! Accept loop
//!
//! Starts the coordinator actor and spawns a session task per accepted
//! connection, bounded by `max_connections`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::codec::{FramedWrite, LinesCodec};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::AppError;
use crate::message::{self, Message};
use crate::session::handle_connection;

/// Channel buffer size for coordinator events
const EVENT_BUFFER_SIZE: usize = 256;

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Bind the configured address
pub async fn bind(config: &Config) -> Result<TcpListener, AppError> {
    let addr = config.bind_addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind { addr, source })
}

/// Serve connections on `listener` forever
pub async fn serve(listener: TcpListener, config: Config) -> Result<(), AppError> {
    let config = Arc::new(config);

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
    tokio::spawn(Coordinator::new(events_rx).run());

    let permits = Arc::new(Semaphore::new(config.max_connections));

    info!("{} Ready for receiving new clients", message::SERVER_TAG);

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };

        let Ok(permit) = permits.clone().try_acquire_owned() else {
            warn!("Connection limit reached, rejecting {}", addr);
            tokio::spawn(reject(stream));
            continue;
        };

        let events_tx = events_tx.clone();
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr.to_string(), events_tx, config).await {
                error!("Connection handler error ({}): {}", addr, e);
            }
            drop(permit);
        });
    }
}

/// Tell a client the server is full and close the connection
async fn reject(stream: TcpStream) {
    let mut sink = FramedWrite::new(stream, LinesCodec::new());
    if let Err(e) = sink.send(Message::notice(message::SERVER_FULL).to_string()).await {
        warn!("Failed to send rejection: {}", e);
    }
    let _ = SinkExt::<String>::close(&mut sink).await;
}
