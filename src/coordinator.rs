//! Broadcast coordinator actor
//!
//! The central actor that owns the user registry and with it the set of
//! broadcast members. Every registration, departure, directed message and
//! broadcast passes through here one event at a time, so the registry and
//! the membership set can never disagree.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::command::Command;
use crate::message::{self, Message};
use crate::queue::Outgoing;
use crate::registry::UserRegistry;
use crate::types::SessionId;

/// Events sent from sessions to the coordinator
#[derive(Debug)]
pub enum Event {
    /// New connection accepted
    Connect { session_id: SessionId },
    /// Claim a username and join the broadcast set
    Claim {
        session_id: SessionId,
        username: String,
        addr: String,
        queue: Outgoing,
        reply: oneshot::Sender<ClaimReply>,
    },
    /// Command from an active session
    Command {
        session_id: SessionId,
        command: Command,
    },
    /// Session ended
    Leave { session_id: SessionId },
}

/// Outcome of `Event::Claim`
#[derive(Debug)]
pub enum ClaimReply {
    /// Username registered; the coordinator now owns the queue
    Accepted,
    /// Username in use; the queue is handed back for a retry
    Taken(Outgoing),
}

pub struct Coordinator {
    registry: UserRegistry,
    receiver: mpsc::Receiver<Event>,
}

impl Coordinator {
    pub fn new(receiver: mpsc::Receiver<Event>) -> Self {
        Self {
            registry: UserRegistry::new(),
            receiver,
        }
    }

    /// Run the coordinator event loop
    ///
    /// Processes events until all senders are dropped.
    pub async fn run(mut self) {
        info!("Coordinator started");

        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }

        info!("Coordinator shutting down");
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connect { session_id } => {
                self.registry.open(session_id);
                debug!(
                    "Pending: {}, Active: {}",
                    self.registry.pending_count(),
                    self.registry.active_count()
                );
            }
            Event::Claim {
                session_id,
                username,
                addr,
                queue,
                reply,
            } => {
                let outcome = self.handle_claim(session_id, username, addr, queue);
                if reply.send(outcome).is_err() {
                    // Session vanished mid-claim; its Leave is already queued.
                    debug!("Claim reply for {} dropped", session_id);
                }
            }
            Event::Command {
                session_id,
                command,
            } => {
                self.handle_command(session_id, command);
            }
            Event::Leave { session_id } => {
                self.handle_leave(session_id);
            }
        }
    }

    fn handle_claim(
        &mut self,
        session_id: SessionId,
        username: String,
        addr: String,
        queue: Outgoing,
    ) -> ClaimReply {
        if let Err(queue) = self.registry.claim(session_id, &username, addr, queue) {
            debug!("Session {} rejected username '{}'", session_id, username);
            deliver(&queue, &Message::notice(message::USERNAME_TAKEN));
            return ClaimReply::Taken(queue);
        }

        info!("New connected user [{}]", username);

        if let Some(member) = self.registry.lookup(&username) {
            for line in Message::welcome(&username) {
                deliver(&member.queue, &line);
            }
        }
        self.broadcast(&Message::arrived(&username));

        ClaimReply::Accepted
    }

    fn handle_command(&mut self, session_id: SessionId, command: Command) {
        let Some(sender) = self.registry.member_of(session_id) else {
            debug!("Ignoring command from unregistered session {}", session_id);
            return;
        };
        let Some(from) = self.registry.username_of(session_id) else {
            return;
        };

        match command {
            Command::Users => {
                for name in self.registry.usernames() {
                    deliver(&sender.queue, &Message::notice(name));
                }
            }
            Command::Msg { target, text } => match self.registry.lookup(&target) {
                Some(recipient) => {
                    deliver(&recipient.queue, &Message::direct(from, &text));
                }
                None => {
                    deliver(&sender.queue, &Message::notice(message::NO_SUCH_USER));
                }
            },
            Command::Time => {
                deliver(&sender.queue, &Message::time_now());
            }
            Command::User { name } => {
                let addr = self
                    .registry
                    .lookup(&name)
                    .map(|m| m.addr.as_str())
                    .unwrap_or(message::UNKNOWN_ADDR);
                deliver(&sender.queue, &Message::notice(format!("User: {name}")));
                deliver(&sender.queue, &Message::notice(format!("IP address: {addr}")));
            }
            Command::Chat { line } => {
                let msg = Message::chat(from, &line);
                self.broadcast(&msg);
            }
        }
    }

    fn handle_leave(&mut self, session_id: SessionId) {
        let Some((username, member)) = self.registry.release(session_id) else {
            debug!("Unregistered session {} left", session_id);
            return;
        };

        member.queue.close();
        info!("[{}] left", username);
        self.broadcast(&Message::left(&username));

        debug!(
            "Pending: {}, Active: {}",
            self.registry.pending_count(),
            self.registry.active_count()
        );
    }

    /// Copy a message onto every member's queue, the sender's included
    fn broadcast(&self, msg: &Message) {
        let line = msg.to_string();
        for member in self.registry.members() {
            if member.queue.send(line.clone()).is_err() {
                debug!("Broadcast to session {} dropped", member.session_id);
            }
        }
    }
}

/// Enqueue onto one queue; a writer that already stopped just misses it
fn deliver(queue: &Outgoing, msg: &Message) {
    if let Err(e) = queue.deliver(msg) {
        debug!("Delivery dropped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{self, QueueReceiver};

    struct Harness {
        coordinator: Coordinator,
        _tx: mpsc::Sender<Event>,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = mpsc::channel(16);
            Self {
                coordinator: Coordinator::new(rx),
                _tx: tx,
            }
        }

        fn join(&mut self, username: &str) -> (SessionId, QueueReceiver) {
            let session_id = SessionId::new();
            let (queue, rx) = queue::channel();
            self.coordinator.handle_event(Event::Connect { session_id });
            let reply = self.claim(session_id, username, queue);
            assert!(matches!(reply, ClaimReply::Accepted));
            (session_id, rx)
        }

        fn claim(&mut self, session_id: SessionId, username: &str, queue: Outgoing) -> ClaimReply {
            let (reply, mut reply_rx) = oneshot::channel();
            self.coordinator.handle_event(Event::Claim {
                session_id,
                username: username.to_string(),
                addr: format!("127.0.0.1:{}", username.len()),
                queue,
                reply,
            });
            reply_rx.try_recv().unwrap()
        }

        fn command(&mut self, session_id: SessionId, line: &str) {
            self.coordinator.handle_event(Event::Command {
                session_id,
                command: Command::parse(line),
            });
        }
    }

    async fn drain(rx: &mut QueueReceiver) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(Some(line)) =
            tokio::time::timeout(std::time::Duration::from_millis(10), rx.recv()).await
        {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_claim_welcomes_and_announces() {
        let mut h = Harness::new();
        let (_alice, mut alice_rx) = h.join("alice");
        let (_bob, mut bob_rx) = h.join("bob");

        let alice_lines = drain(&mut alice_rx).await;
        assert_eq!(alice_lines.len(), 4);
        assert_eq!(alice_lines[2], "irc-server > alice has arrived");
        assert_eq!(alice_lines[3], "irc-server > bob has arrived");

        let bob_lines = drain(&mut bob_rx).await;
        assert_eq!(bob_lines.len(), 3);
        assert!(bob_lines[0].contains("Welcome"));
        assert_eq!(bob_lines[2], "irc-server > bob has arrived");
    }

    #[tokio::test]
    async fn test_collision_hands_queue_back() {
        let mut h = Harness::new();
        let (_alice, mut alice_rx) = h.join("alice");
        drain(&mut alice_rx).await;

        let carol = SessionId::new();
        h.coordinator.handle_event(Event::Connect { session_id: carol });
        let (queue, mut carol_rx) = queue::channel();

        let ClaimReply::Taken(queue) = h.claim(carol, "alice", queue) else {
            panic!("collision accepted");
        };
        assert_eq!(
            drain(&mut carol_rx).await,
            vec![format!("irc-server > {}", message::USERNAME_TAKEN)]
        );

        assert!(matches!(h.claim(carol, "carol", queue), ClaimReply::Accepted));
        assert_eq!(
            drain(&mut alice_rx).await,
            vec!["irc-server > carol has arrived"]
        );
    }

    #[tokio::test]
    async fn test_chat_is_echoed_to_sender() {
        let mut h = Harness::new();
        let (alice, mut alice_rx) = h.join("alice");
        let (_bob, mut bob_rx) = h.join("bob");
        drain(&mut alice_rx).await;
        drain(&mut bob_rx).await;

        h.command(alice, "hello room");
        h.command(alice, "second");

        let expected = vec!["alice > hello room", "alice > second"];
        assert_eq!(drain(&mut alice_rx).await, expected);
        assert_eq!(drain(&mut bob_rx).await, expected);
    }

    #[tokio::test]
    async fn test_broadcast_order_is_identical_for_all_members() {
        let mut h = Harness::new();
        let (alice, mut alice_rx) = h.join("alice");
        let (bob, mut bob_rx) = h.join("bob");
        let (_carol, mut carol_rx) = h.join("carol");
        drain(&mut alice_rx).await;
        drain(&mut bob_rx).await;
        drain(&mut carol_rx).await;

        h.command(alice, "one");
        h.command(bob, "two");
        h.command(alice, "three");

        let expected = vec!["alice > one", "bob > two", "alice > three"];
        assert_eq!(drain(&mut alice_rx).await, expected);
        assert_eq!(drain(&mut bob_rx).await, expected);
        assert_eq!(drain(&mut carol_rx).await, expected);
    }

    #[tokio::test]
    async fn test_direct_message_reaches_only_target() {
        let mut h = Harness::new();
        let (alice, mut alice_rx) = h.join("alice");
        let (_bob, mut bob_rx) = h.join("bob");
        let (_carol, mut carol_rx) = h.join("carol");
        drain(&mut alice_rx).await;
        drain(&mut bob_rx).await;
        drain(&mut carol_rx).await;

        h.command(alice, "/msg bob secret text");

        assert!(drain(&mut alice_rx).await.is_empty());
        assert!(drain(&mut carol_rx).await.is_empty());
        assert_eq!(drain(&mut bob_rx).await, vec!["alice: secret text "]);
    }

    #[tokio::test]
    async fn test_queries_answer_caller_only() {
        let mut h = Harness::new();
        let (alice, mut alice_rx) = h.join("alice");
        let (_bob, mut bob_rx) = h.join("bob");
        drain(&mut alice_rx).await;
        drain(&mut bob_rx).await;

        h.command(alice, "/users");
        h.command(alice, "/user bob");
        h.command(alice, "/user nobody");

        assert_eq!(
            drain(&mut alice_rx).await,
            vec![
                "irc-server > alice",
                "irc-server > bob",
                "irc-server > User: bob",
                "irc-server > IP address: 127.0.0.1:3",
                "irc-server > User: nobody",
                "irc-server > IP address: unknown",
            ]
        );
        assert!(drain(&mut bob_rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_closes_queue_and_frees_name() {
        let mut h = Harness::new();
        let (alice, mut alice_rx) = h.join("alice");
        let (bob, mut bob_rx) = h.join("bob");
        drain(&mut alice_rx).await;

        h.coordinator.handle_event(Event::Leave { session_id: bob });

        // Bob's queue drains then reports closed
        drain(&mut bob_rx).await;
        assert_eq!(bob_rx.recv().await, None);

        h.command(alice, "/msg bob hi");
        assert_eq!(
            drain(&mut alice_rx).await,
            vec![
                "irc-server > bob has left".to_string(),
                format!("irc-server > {}", message::NO_SUCH_USER),
            ]
        );

        let (_again, _rx) = h.join("bob");
    }

    #[tokio::test]
    async fn test_commands_from_pending_session_ignored() {
        let mut h = Harness::new();
        let (_alice, mut alice_rx) = h.join("alice");
        drain(&mut alice_rx).await;

        let stranger = SessionId::new();
        h.coordinator.handle_event(Event::Connect { session_id: stranger });
        h.command(stranger, "sneaky broadcast");
        h.coordinator.handle_event(Event::Leave { session_id: stranger });

        assert!(drain(&mut alice_rx).await.is_empty());
    }
}
