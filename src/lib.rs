//! Simple IRC-style Chat Server Library
//!
//! A line-oriented TCP chat server built on tokio using the Actor pattern
//! for state management.
//!
//! # Features
//! - Username registration with collision retry
//! - Broadcast chat (delivered to the sender too)
//! - Directed messages with `/msg <user> <text>`
//! - Queries: `/users`, `/time`, `/user <name>`
//! - Arrival and departure notices
//! - Connection cap and optional idle timeout
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Coordinator` is the central actor owning the user registry and the
//!   broadcast membership set
//! - Each connection has a `session` task forwarding parsed commands to it
//!   and a `writer` task draining its outgoing queue to the socket
//! - No locks needed - all shared state goes through message passing
//!
//! # Example
//! ```ignore
//! use irc_server::{server, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), irc_server::AppError> {
//!     let config = Config::default();
//!     let listener = server::bind(&config).await?;
//!     server::serve(listener, config).await
//! }
//! ```

pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod queue;
pub mod registry;
pub mod server;
pub mod session;
pub mod types;
pub mod writer;

// Re-export main types for convenience
pub use command::Command;
pub use config::Config;
pub use coordinator::{ClaimReply, Coordinator, Event};
pub use error::{AppError, SendError};
pub use message::{Message, SERVER_TAG};
pub use queue::{Outgoing, QueueReceiver};
pub use registry::{Member, UserRegistry};
pub use session::handle_connection;
pub use types::SessionId;
