use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tower_cookies::Cookies;

use crate::Session;

/// A session shared between every lookup of the same name in one request.
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Per-request memo of resolved sessions, keyed by session name.
///
/// Inserted into the request extensions by [`SessionLayer`](crate::SessionLayer).
/// Cloning is cheap; clones share the same cookies and sessions.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

struct Inner {
    cookies: Cookies,
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl Registry {
    pub fn new(cookies: Cookies) -> Self {
        Self {
            inner: Arc::new(Inner {
                cookies,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The cookies of the request this registry belongs to.
    pub fn cookies(&self) -> &Cookies {
        &self.inner.cookies
    }

    pub(crate) fn cached(&self, name: &str) -> Option<SharedSession> {
        self.inner.sessions.lock().get(name).cloned()
    }

    /// Records `session` under `name`, unless a concurrent lookup got there
    /// first, in which case that session wins and `session` is discarded.
    ///
    /// The flag is `true` when `session` was the one recorded.
    pub(crate) fn memoize(&self, name: &str, session: Session) -> (SharedSession, bool) {
        match self.inner.sessions.lock().entry(name.to_owned()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let shared = Arc::new(tokio::sync::Mutex::new(session));
                (entry.insert(shared).clone(), true)
            }
        }
    }

    /// Every session resolved so far, in no particular order.
    pub fn sessions(&self) -> Vec<SharedSession> {
        self.inner.sessions.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sessions = self.inner.sessions.lock();
        f.debug_struct("Registry")
            .field("sessions", &sessions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
