//! Message protocol definitions
//!
//! Every line the server writes is one rendered `Message`. System notices
//! carry the fixed server tag; chat and direct messages carry the sender.

use std::fmt;

/// Prefix of every server-originated line
pub const SERVER_TAG: &str = "irc-server >";

/// Format used by `/time` (DD/MM/YYYY HH:MM:SS)
pub const TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub const WELCOME: &str = "Welcome to the Simple IRC Server";
pub const USERNAME_TAKEN: &str = "Username is already in use, please enter another username:";
pub const USERNAME_EMPTY: &str = "Username cannot be empty, please enter another username:";
pub const NO_SUCH_USER: &str = "There is no user with that name.";
pub const SERVER_FULL: &str = "Server is full, please try again later.";
pub const UNKNOWN_ADDR: &str = "unknown";

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// System notice, rendered with `SERVER_TAG`
    Notice(String),
    /// Broadcast chat line
    Chat { from: String, body: String },
    /// Directed `/msg` delivery
    Direct { from: String, body: String },
}

impl Message {
    pub fn notice(text: impl Into<String>) -> Self {
        Message::Notice(text.into())
    }

    pub fn chat(from: &str, body: &str) -> Self {
        Message::Chat {
            from: from.to_string(),
            body: body.to_string(),
        }
    }

    pub fn direct(from: &str, body: &str) -> Self {
        Message::Direct {
            from: from.to_string(),
            body: body.to_string(),
        }
    }

    /// The two lines a newly registered user receives
    pub fn welcome(username: &str) -> [Message; 2] {
        [
            Message::notice(format!("{WELCOME}, {username}")),
            Message::notice(format!("Your user [{username}] is successfully logged")),
        ]
    }

    pub fn arrived(username: &str) -> Self {
        Message::notice(format!("{username} has arrived"))
    }

    pub fn left(username: &str) -> Self {
        Message::notice(format!("{username} has left"))
    }

    /// Current local time as a notice
    pub fn time_now() -> Self {
        Message::notice(chrono::Local::now().format(TIME_FORMAT).to_string())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Notice(text) => write!(f, "{SERVER_TAG} {text}"),
            Message::Chat { from, body } => write!(f, "{from} > {body}"),
            Message::Direct { from, body } => write!(f, "{from}: {body}"),
        }
    }
}
