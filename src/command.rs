//! Command parsing
//!
//! Turns one input line from an active session into a `Command`. Parsing
//! is purely syntactic; the coordinator decides what each command does.

/// Token used in place of an empty line's first field
pub const PLACEHOLDER: &str = "-";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/users`
    Users,
    /// `/msg <target> <words...>`
    Msg { target: String, text: String },
    /// `/time`
    Time,
    /// `/user <name>`
    User { name: String },
    /// Free-form chat line, kept verbatim
    Chat { line: String },
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let fields = fields(line);

        match fields.as_slice() {
            ["/users", ..] => Command::Users,
            ["/msg", target, words @ ..] if !words.is_empty() => Command::Msg {
                target: (*target).to_string(),
                text: words.iter().map(|w| format!("{w} ")).collect(),
            },
            ["/time", ..] => Command::Time,
            ["/user", name] => Command::User {
                name: (*name).to_string(),
            },
            _ => Command::Chat {
                line: line.to_string(),
            },
        }
    }
}

/// Whitespace-split fields; an empty or blank line yields the placeholder.
pub fn fields(line: &str) -> Vec<&str> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        vec![PLACEHOLDER]
    } else {
        fields
    }
}

/// Username proposed by a registration line, if usable
pub fn proposed_username(line: &str) -> Option<&str> {
    match fields(line).first() {
        Some(&name) if name != PLACEHOLDER => Some(name),
        _ => None,
    }
}
