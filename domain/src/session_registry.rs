//! Membership of currently connected clients.

use events::ClientHandle;
use std::collections::HashSet;

/// The set of live client handles. Its size is the connected-user count the
/// server advertises.
///
/// All operations are total: admitting a handle twice or removing one that
/// is already gone simply reports the current count.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    clients: HashSet<ClientHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `client` and returns the new total.
    pub fn admit(&mut self, client: ClientHandle) -> usize {
        self.clients.insert(client);
        self.clients.len()
    }

    /// Removes `client` if present and returns the new total.
    pub fn remove(&mut self, client: &ClientHandle) -> usize {
        self.clients.remove(client);
        self.clients.len()
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn contains(&self, client: &ClientHandle) -> bool {
        self.clients.contains(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_and_remove_report_the_new_total() {
        let mut registry = SessionRegistry::new();
        let a = ClientHandle::new();
        let b = ClientHandle::new();

        assert_eq!(registry.admit(a), 1);
        assert_eq!(registry.admit(b), 2);
        assert_eq!(registry.remove(&a), 1);
        assert!(!registry.contains(&a));
        assert!(registry.contains(&b));
    }

    #[test]
    fn stale_remove_is_a_no_op() {
        let mut registry = SessionRegistry::new();
        let a = ClientHandle::new();
        registry.admit(a);
        registry.remove(&a);

        assert_eq!(registry.remove(&a), 0);
        assert_eq!(registry.remove(&ClientHandle::new()), 0);
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn readmitting_a_handle_does_not_double_count() {
        let mut registry = SessionRegistry::new();
        let a = ClientHandle::new();
        registry.admit(a);
        assert_eq!(registry.admit(a), 1);
    }
}
