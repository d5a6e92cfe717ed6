//! Registry implementation

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use super::entry::OnlineEntry;
use super::error::RegistryError;
use crate::error::Result;
use crate::session::Session;

#[derive(Default)]
struct Inner {
    /// Display name → session
    sessions: HashMap<String, Arc<Session>>,
    /// Session ID → display name
    names: HashMap<u64, String>,
}

/// Central registry of online sessions
///
/// Thread-safe via a single `tokio::sync::Mutex`. The mutex is async-aware
/// because fan-out may wait on bounded inboxes while holding it.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its default name
    ///
    /// Never overwrites an existing entry: if the default name is in use
    /// (someone renamed to it) the join fails with `NameTaken`.
    pub async fn join(&self, session: Arc<Session>) -> std::result::Result<String, RegistryError> {
        let mut inner = self.inner.lock().await;
        let name = session.default_name();

        if inner.names.contains_key(&session.id()) {
            return Err(RegistryError::AlreadyOnline(session.id()));
        }
        if inner.sessions.contains_key(&name) {
            return Err(RegistryError::NameTaken(name));
        }

        inner.names.insert(session.id(), name.clone());
        inner.sessions.insert(name.clone(), session);

        tracing::debug!(name = %name, online = inner.sessions.len(), "Session joined");
        Ok(name)
    }

    /// Remove the session registered under `name` and close its inbox
    ///
    /// No-op if the name is not registered.
    pub async fn leave(&self, name: &str) -> Option<Arc<Session>> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.remove(name)?;
        inner.names.remove(&session.id());
        session.close_inbox();

        tracing::debug!(name = %name, online = inner.sessions.len(), "Session left");
        Some(session)
    }

    /// Remove `session` under whatever name it currently holds and close its
    /// inbox
    ///
    /// A `farewell` line is queued after the entry is gone and before the
    /// inbox closes, so no fan-out can follow it. It is dropped if a bounded
    /// inbox is full. Returns the name the session was registered under, or
    /// `None` if it was not online.
    pub async fn remove_session(&self, session: &Session, farewell: Option<Bytes>) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let name = inner.names.remove(&session.id())?;
        inner.sessions.remove(&name);

        if let Some(line) = farewell {
            match session.inbox().try_push(line) {
                Ok(true) => {}
                Ok(false) => tracing::debug!(name = %name, "Farewell dropped: inbox full"),
                Err(e) => tracing::debug!(name = %name, error = %e, "Farewell not sent"),
            }
        }
        session.close_inbox();

        tracing::debug!(name = %name, online = inner.sessions.len(), "Session removed");
        Some(name)
    }

    /// Change the display name of an online session
    ///
    /// The old key is removed, the new key inserted and the recorded name
    /// updated within one lock acquisition.
    pub async fn rename(&self, session: &Session, new_name: &str) -> std::result::Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;

        let old_name = inner
            .names
            .get(&session.id())
            .cloned()
            .ok_or(RegistryError::NotOnline(session.id()))?;

        if old_name == new_name {
            return Ok(());
        }
        if inner.sessions.contains_key(new_name) {
            return Err(RegistryError::NameTaken(new_name.to_string()));
        }

        let Some(entry) = inner.sessions.remove(&old_name) else {
            return Err(RegistryError::NotOnline(session.id()));
        };
        inner.sessions.insert(new_name.to_string(), entry);
        inner.names.insert(session.id(), new_name.to_string());

        tracing::info!(
            session_id = session.id(),
            from = %old_name,
            to = %new_name,
            "Session renamed"
        );
        Ok(())
    }

    /// Find an online session by name
    pub async fn lookup(&self, name: &str) -> Option<Arc<Session>> {
        self.inner.lock().await.sessions.get(name).cloned()
    }

    /// Current display name of `session`, read under the lock
    ///
    /// The returned string is a copy: a rename that happens after this call
    /// returns is not reflected in it.
    pub async fn name_of(&self, session: &Session) -> Option<String> {
        self.inner.lock().await.names.get(&session.id()).cloned()
    }

    /// Every online session; order is unspecified
    pub async fn snapshot(&self) -> Vec<OnlineEntry> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .iter()
            .map(|(name, session)| OnlineEntry {
                session_id: session.id(),
                peer_addr: session.peer_addr(),
                name: name.clone(),
            })
            .collect()
    }

    /// Queue a line on the inbox of the session named `name`
    ///
    /// The push happens while the lock is held, so it can never race with
    /// the recipient leaving and closing its inbox.
    pub async fn send_to(&self, name: &str, line: impl Into<Bytes>) -> Result<()> {
        let inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        session.inbox().push(line.into()).await
    }

    /// Queue `line` on every online session's inbox
    ///
    /// The lock is held for the whole iteration so joins, leaves and renames
    /// cannot interleave with a fan-out. With bounded inboxes a full inbox
    /// blocks here, and with it every other registry operation, until its
    /// writer drains. Returns the number of sessions reached.
    pub async fn fan_out(&self, line: Bytes) -> usize {
        let inner = self.inner.lock().await;
        let mut delivered = 0;

        for (name, session) in inner.sessions.iter() {
            match session.inbox().push(line.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "Fan-out push failed");
                }
            }
        }

        delivered
    }

    /// Number of online sessions
    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;
    use crate::session::InboxReceiver;

    fn session(id: u64, addr: &str) -> (Arc<Session>, InboxReceiver) {
        Session::new(id, addr.parse().unwrap(), 0)
    }

    async fn assert_consistent(registry: &Registry) {
        let inner = registry.inner.lock().await;
        assert_eq!(inner.sessions.len(), inner.names.len());
        for (name, session) in inner.sessions.iter() {
            assert_eq!(inner.names.get(&session.id()), Some(name));
        }
    }

    #[tokio::test]
    async fn test_join_and_lookup() {
        let registry = Registry::new();
        let (a, _rx) = session(1, "1.2.3.4:5");

        let name = registry.join(Arc::clone(&a)).await.unwrap();
        assert_eq!(name, "1.2.3.4:5");
        assert_eq!(registry.lookup("1.2.3.4:5").await.unwrap().id(), 1);
        assert_eq!(registry.len().await, 1);

        // Same session twice
        assert_eq!(
            registry.join(a).await,
            Err(RegistryError::AlreadyOnline(1))
        );
        assert_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_join_never_overwrites() {
        let registry = Registry::new();
        let (a, _rx_a) = session(1, "1.2.3.4:5");
        let (b, _rx_b) = session(2, "1.2.3.4:6");
        registry.join(Arc::clone(&a)).await.unwrap();
        registry.rename(&a, "1.2.3.4:6").await.unwrap();

        assert_eq!(
            registry.join(b).await,
            Err(RegistryError::NameTaken("1.2.3.4:6".into()))
        );
        assert_eq!(registry.lookup("1.2.3.4:6").await.unwrap().id(), 1);
        assert_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_leave_closes_inbox() {
        let registry = Registry::new();
        let (a, _rx) = session(1, "1.2.3.4:5");
        registry.join(Arc::clone(&a)).await.unwrap();

        let removed = registry.leave("1.2.3.4:5").await.unwrap();
        assert_eq!(removed.id(), 1);
        assert!(a.inbox().is_closed());
        assert!(registry.is_empty().await);

        // Second leave is a no-op
        assert!(registry.leave("1.2.3.4:5").await.is_none());
        assert_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_remove_session_uses_current_name() {
        let registry = Registry::new();
        let (a, _rx) = session(1, "1.2.3.4:5");
        registry.join(Arc::clone(&a)).await.unwrap();
        registry.rename(&a, "alice").await.unwrap();

        assert_eq!(registry.remove_session(&a, None).await.as_deref(), Some("alice"));
        assert!(registry.remove_session(&a, None).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_farewell_is_last_line_delivered() {
        let registry = Registry::new();
        let (a, mut rx_a) = session(1, "1.2.3.4:5");
        let (b, mut rx_b) = session(2, "1.2.3.4:6");
        registry.join(Arc::clone(&a)).await.unwrap();
        registry.join(Arc::clone(&b)).await.unwrap();

        registry.fan_out(Bytes::from_static(b"before")).await;
        let farewell = Bytes::from_static(b"bye");
        assert_eq!(
            registry.remove_session(&a, Some(farewell)).await.as_deref(),
            Some("1.2.3.4:5")
        );
        assert_eq!(registry.fan_out(Bytes::from_static(b"after")).await, 1);

        assert_eq!(rx_a.recv().await.unwrap(), "before");
        assert_eq!(rx_a.recv().await.unwrap(), "bye");
        assert!(rx_a.recv().await.is_none());

        assert_eq!(rx_b.recv().await.unwrap(), "before");
        assert_eq!(rx_b.recv().await.unwrap(), "after");
    }

    #[tokio::test]
    async fn test_rename_taken_leaves_state_unchanged() {
        let registry = Registry::new();
        let (a, _rx_a) = session(1, "1.2.3.4:5");
        let (b, _rx_b) = session(2, "1.2.3.4:6");
        registry.join(Arc::clone(&a)).await.unwrap();
        registry.join(Arc::clone(&b)).await.unwrap();
        registry.rename(&b, "bob").await.unwrap();

        let result = registry.rename(&a, "bob").await;
        assert_eq!(result, Err(RegistryError::NameTaken("bob".into())));

        assert_eq!(registry.name_of(&a).await.as_deref(), Some("1.2.3.4:5"));
        assert_eq!(registry.lookup("1.2.3.4:5").await.unwrap().id(), 1);
        assert_eq!(registry.lookup("bob").await.unwrap().id(), 2);
        assert_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_rename_free_changes_one_key() {
        let registry = Registry::new();
        let (a, _rx_a) = session(1, "1.2.3.4:5");
        let (b, _rx_b) = session(2, "1.2.3.4:6");
        registry.join(Arc::clone(&a)).await.unwrap();
        registry.join(Arc::clone(&b)).await.unwrap();

        registry.rename(&a, "alice").await.unwrap();

        let names: HashSet<String> = registry.snapshot().await.into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            HashSet::from(["alice".to_string(), "1.2.3.4:6".to_string()])
        );
        assert!(Arc::ptr_eq(&registry.lookup("alice").await.unwrap(), &a));

        // Renaming to the current name is a no-op
        registry.rename(&a, "alice").await.unwrap();
        assert_eq!(registry.len().await, 2);
        assert_consistent(&registry).await;
    }

    #[tokio::test]
    async fn test_rename_offline_session() {
        let registry = Registry::new();
        let (a, _rx) = session(1, "1.2.3.4:5");

        assert_eq!(
            registry.rename(&a, "alice").await,
            Err(RegistryError::NotOnline(1))
        );
    }

    #[tokio::test]
    async fn test_send_to() {
        let registry = Registry::new();
        let (a, mut rx) = session(1, "1.2.3.4:5");
        registry.join(a).await.unwrap();

        registry.send_to("1.2.3.4:5", "bob: hi").await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), "bob: hi");

        let err = registry.send_to("ghost", "hi").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Registry(RegistryError::NotFound(ref name)) if name == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_fan_out_reaches_each_session_once_in_order() {
        let registry = Registry::new();
        let mut receivers = Vec::new();
        for (id, addr) in [(1, "1.2.3.4:5"), (2, "1.2.3.4:6"), (3, "1.2.3.4:7")] {
            let (s, rx) = session(id, addr);
            registry.join(s).await.unwrap();
            receivers.push(rx);
        }

        assert_eq!(registry.fan_out(Bytes::from_static(b"first")).await, 3);
        assert_eq!(registry.fan_out(Bytes::from_static(b"second")).await, 3);

        for rx in receivers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), "first");
            assert_eq!(rx.try_recv().unwrap(), "second");
            assert!(rx.try_recv().is_none());
        }
    }

    #[tokio::test]
    async fn test_fan_out_stalls_on_full_bounded_inbox() {
        let registry = Registry::new();
        let (slow, mut rx) = Session::new(1, "1.2.3.4:5".parse().unwrap(), 1);
        registry.join(slow).await.unwrap();

        assert_eq!(registry.fan_out(Bytes::from_static(b"a")).await, 1);

        // The inbox is full: fan-out blocks and holds the registry lock
        let stalled =
            tokio::time::timeout(Duration::from_millis(50), registry.fan_out(Bytes::from_static(b"b")))
                .await;
        assert!(stalled.is_err());

        // Once the writer drains, fan-out proceeds
        assert_eq!(rx.recv().await.unwrap(), "a");
        assert_eq!(registry.fan_out(Bytes::from_static(b"c")).await, 1);
        assert_eq!(rx.recv().await.unwrap(), "c");
    }

    #[tokio::test]
    async fn test_concurrent_renames_keep_names_unique() {
        let registry = Arc::new(Registry::new());
        let mut sessions = Vec::new();
        for id in 0..16u64 {
            let (s, rx) = Session::new(id, format!("10.0.0.1:{}", 1000 + id).parse().unwrap(), 0);
            registry.join(Arc::clone(&s)).await.unwrap();
            sessions.push((s, rx));
        }

        let mut handles = Vec::new();
        for (s, _) in sessions.iter() {
            let registry = Arc::clone(&registry);
            let s = Arc::clone(s);
            handles.push(tokio::spawn(async move {
                registry.rename(&s, "contested").await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(registry.len().await, 16);
        assert_consistent(&registry).await;
    }
}
