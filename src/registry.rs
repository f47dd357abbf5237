//! User registry
//!
//! Maps usernames to the sessions holding them. The registry also owns
//! every registered session's outgoing queue, so the set of broadcast
//! members is exactly the set of registry entries. Owned and mutated only
//! by the coordinator task.

use std::collections::HashMap;

use crate::queue::Outgoing;
use crate::types::SessionId;

/// A registered user
#[derive(Debug)]
pub struct Member {
    /// Session holding the username
    pub session_id: SessionId,
    /// Remote address at registration time
    pub addr: String,
    /// The session's outgoing queue
    pub queue: Outgoing,
}

/// Registration state of a connected session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Connected, still choosing a username
    Pending,
    /// Holds the given username
    Active(String),
}

#[derive(Debug, Default)]
pub struct UserRegistry {
    /// Username -> member
    members: HashMap<String, Member>,
    /// Every connected session, registered or not
    slots: HashMap<SessionId, Slot>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a pending slot for a newly connected session
    pub fn open(&mut self, session_id: SessionId) {
        self.slots.entry(session_id).or_insert(Slot::Pending);
    }

    /// Claim `username` for a session
    ///
    /// On collision (or when the session already holds a name) the queue
    /// is handed back untouched.
    pub fn claim(
        &mut self,
        session_id: SessionId,
        username: &str,
        addr: String,
        queue: Outgoing,
    ) -> Result<(), Outgoing> {
        if self.members.contains_key(username) || self.username_of(session_id).is_some() {
            return Err(queue);
        }

        self.members.insert(
            username.to_string(),
            Member {
                session_id,
                addr,
                queue,
            },
        );
        self.slots
            .insert(session_id, Slot::Active(username.to_string()));
        Ok(())
    }

    pub fn lookup(&self, username: &str) -> Option<&Member> {
        self.members.get(username)
    }

    pub fn username_of(&self, session_id: SessionId) -> Option<&str> {
        match self.slots.get(&session_id) {
            Some(Slot::Active(name)) => Some(name),
            _ => None,
        }
    }

    /// Member entry of a registered session
    pub fn member_of(&self, session_id: SessionId) -> Option<&Member> {
        self.username_of(session_id)
            .and_then(|name| self.members.get(name))
    }

    /// Forget a session
    ///
    /// Returns the username and member entry if the session was registered.
    pub fn release(&mut self, session_id: SessionId) -> Option<(String, Member)> {
        match self.slots.remove(&session_id)? {
            Slot::Pending => None,
            Slot::Active(name) => {
                let member = self.members.remove(&name)?;
                Some((name, member))
            }
        }
    }

    /// Registered usernames, sorted; pending slots are not listed
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.members.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All broadcast members
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn pending_count(&self) -> usize {
        self.slots.len() - self.members.len()
    }

    pub fn active_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue;

    fn connect(registry: &mut UserRegistry) -> SessionId {
        let id = SessionId::new();
        registry.open(id);
        id
    }

    #[test]
    fn test_claim_is_unique() {
        let mut registry = UserRegistry::new();
        let alice = connect(&mut registry);
        let other = connect(&mut registry);

        let (q1, _rx1) = queue::channel();
        let (q2, _rx2) = queue::channel();
        assert!(registry.claim(alice, "alice", "10.0.0.1:5000".into(), q1).is_ok());
        assert!(registry.claim(other, "alice", "10.0.0.2:5000".into(), q2).is_err());

        assert_eq!(registry.usernames(), vec!["alice"]);
        assert_eq!(registry.lookup("alice").unwrap().session_id, alice);
        assert_eq!(registry.username_of(other), None);
    }

    #[test]
    fn test_pending_slots_are_not_listed() {
        let mut registry = UserRegistry::new();
        let bob = connect(&mut registry);
        connect(&mut registry);

        let (q, _rx) = queue::channel();
        registry.claim(bob, "bob", "addr".into(), q).unwrap();

        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(registry.usernames(), vec!["bob"]);
        assert_eq!(registry.members().count(), 1);
    }

    #[test]
    fn test_release_frees_username() {
        let mut registry = UserRegistry::new();
        let bob = connect(&mut registry);
        let (q, _rx) = queue::channel();
        registry.claim(bob, "bob", "1.2.3.4:9".into(), q).unwrap();

        let (name, member) = registry.release(bob).unwrap();
        assert_eq!(name, "bob");
        assert_eq!(member.addr, "1.2.3.4:9");
        assert!(registry.lookup("bob").is_none());
        assert!(registry.member_of(bob).is_none());

        let again = connect(&mut registry);
        let (q, _rx) = queue::channel();
        assert!(registry.claim(again, "bob", "addr".into(), q).is_ok());
    }

    #[test]
    fn test_release_pending_returns_nothing() {
        let mut registry = UserRegistry::new();
        let id = connect(&mut registry);

        assert!(registry.release(id).is_none());
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_second_claim_by_same_session_rejected() {
        let mut registry = UserRegistry::new();
        let id = connect(&mut registry);
        let (q1, _rx1) = queue::channel();
        let (q2, _rx2) = queue::channel();

        registry.claim(id, "alice", "addr".into(), q1).unwrap();
        assert!(registry.claim(id, "alice2", "addr".into(), q2).is_err());
        assert_eq!(registry.usernames(), vec!["alice"]);
    }
}
