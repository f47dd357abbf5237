//! Basic type definitions for the chat server
//!
//! Provides the `SessionId` newtype used to address a connection
//! before (and after) it has claimed a username.

use uuid::Uuid;

/// Identifies one connection from accept to close
///
/// Assigned before the client has chosen a username, so the coordinator
/// can track registering sessions and tell apart two sessions that held
/// the same name at different times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Random ID for a freshly accepted connection
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_session_gets_distinct_id() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }
}
