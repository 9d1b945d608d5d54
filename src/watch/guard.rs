use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Per-record mutual exclusion: a filename can be claimed by at most one
/// handler at a time. Inbox and Approved handling each use their own set, so
/// the same name may legitimately be in flight in both scopes.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

/// Proof of a successful claim. Releasing happens on drop, which makes the
/// release exactly-once on every exit path, panics included.
#[derive(Debug)]
pub struct ClaimTicket {
    set: Arc<Mutex<HashSet<String>>>,
    name: String,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means another handler already holds this name; the caller must
    /// drop the event.
    pub fn try_claim(&self, name: &str) -> Option<ClaimTicket> {
        let mut held = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        if !held.insert(name.to_string()) {
            return None;
        }
        Some(ClaimTicket {
            set: Arc::clone(&self.inner),
            name: name.to_string(),
        })
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .contains(name)
    }
}

impl Drop for ClaimTicket {
    fn drop(&mut self) {
        let mut held = self.set.lock().unwrap_or_else(|err| err.into_inner());
        held.remove(&self.name);
    }
}
