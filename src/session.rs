//! Connection handler
//!
//! Handles one client connection: line framing, the registration phase,
//! forwarding commands to the coordinator, and the departure sequence.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

use crate::command::{self, Command};
use crate::config::Config;
use crate::coordinator::{ClaimReply, Event};
use crate::error::AppError;
use crate::message::{self, Message};
use crate::queue::{self, Outgoing};
use crate::types::SessionId;
use crate::writer;

/// How long a departing session waits for its writer to flush
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a session is in its lifecycle
///
/// `Connected` precedes the read loop and `Closed` follows it; neither
/// needs a value.
#[derive(Debug)]
enum SessionState {
    /// Waiting for a free username; the session still owns its queue
    Registering(Outgoing),
    /// Registered under the given name; the coordinator owns the queue
    Active(String),
    /// Read loop finished or failed mid-transition
    Leaving,
}

struct Session {
    id: SessionId,
    addr: String,
    state: SessionState,
    events: mpsc::Sender<Event>,
    idle_timeout: Option<Duration>,
}

/// Handle a new connection
///
/// Runs until the client disconnects, a read or write fails, or the idle
/// timeout elapses. Always performs the departure sequence before
/// returning.
pub async fn handle_connection<S>(
    stream: S,
    peer_addr: String,
    events: mpsc::Sender<Event>,
    config: Arc<Config>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut lines = FramedRead::new(
        read_half,
        LinesCodec::new_with_max_length(config.max_line_length),
    );
    let sink = FramedWrite::new(write_half, LinesCodec::new());

    let (outgoing, queue_rx) = queue::channel();
    let mut writer_task = tokio::spawn(writer::run(sink, queue_rx));
    let mut writer_done = false;

    let id = SessionId::new();
    info!("Session {} connected from {}", id, peer_addr);

    let mut session = Session {
        id,
        addr: peer_addr,
        state: SessionState::Registering(outgoing),
        events: events.clone(),
        idle_timeout: config.idle_timeout(),
    };

    let result = if events.send(Event::Connect { session_id: id }).await.is_err() {
        Err(AppError::ChannelSend)
    } else {
        tokio::select! {
            res = session.read_loop(&mut lines) => res,
            res = &mut writer_task => {
                writer_done = true;
                match res {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e),
                    Err(e) => Err(e.into()),
                }
            }
        }
    };

    match &result {
        Ok(()) => debug!("Read loop ended for {}", id),
        Err(e) => warn!("Session {} ending: {}", id, e),
    }

    // Leaving: the coordinator releases the name and closes the queue.
    let _ = events.send(Event::Leave { session_id: id }).await;
    drop(session);
    drop(lines);

    if !writer_done {
        match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task).await {
            Ok(Ok(Err(e))) => debug!("Writer for {} failed while draining: {}", id, e),
            Ok(_) => {}
            Err(_) => {
                warn!("Writer for {} did not drain in time", id);
                writer_task.abort();
            }
        }
    }

    info!("Session {} closed", id);

    match result {
        Err(AppError::IdleTimeout) => Ok(()),
        other => other,
    }
}

impl Session {
    async fn read_loop<R>(&mut self, lines: &mut FramedRead<R, LinesCodec>) -> Result<(), AppError>
    where
        R: AsyncRead + Unpin,
    {
        while let Some(line) = self.next_line(lines).await? {
            self.state = match std::mem::replace(&mut self.state, SessionState::Leaving) {
                SessionState::Registering(queue) => self.register(&line, queue).await?,
                SessionState::Active(username) => {
                    self.dispatch(&line).await?;
                    SessionState::Active(username)
                }
                SessionState::Leaving => return Ok(()),
            };
        }
        Ok(())
    }

    async fn next_line<R>(
        &self,
        lines: &mut FramedRead<R, LinesCodec>,
    ) -> Result<Option<String>, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let next = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, lines.next())
                .await
                .map_err(|_| AppError::IdleTimeout)?,
            None => lines.next().await,
        };
        next.transpose().map_err(AppError::from)
    }

    /// Registering → Active on a free name, Registering otherwise
    async fn register(&self, line: &str, queue: Outgoing) -> Result<SessionState, AppError> {
        let Some(username) = command::proposed_username(line) else {
            let _ = queue.deliver(&Message::notice(message::USERNAME_EMPTY));
            return Ok(SessionState::Registering(queue));
        };

        let (reply, reply_rx) = oneshot::channel();
        self.events
            .send(Event::Claim {
                session_id: self.id,
                username: username.to_string(),
                addr: self.addr.clone(),
                queue,
                reply,
            })
            .await
            .map_err(|_| AppError::ChannelSend)?;

        match reply_rx.await.map_err(|_| AppError::ChannelSend)? {
            ClaimReply::Accepted => {
                debug!("Session {} registered as '{}'", self.id, username);
                Ok(SessionState::Active(username.to_string()))
            }
            ClaimReply::Taken(queue) => Ok(SessionState::Registering(queue)),
        }
    }

    async fn dispatch(&self, line: &str) -> Result<(), AppError> {
        self.events
            .send(Event::Command {
                session_id: self.id,
                command: Command::parse(line),
            })
            .await
            .map_err(|_| AppError::ChannelSend)
    }
}
