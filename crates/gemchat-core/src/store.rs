//! Session-keyed conversation storage.
//!
//! [`ConversationStore`] is the seam handlers depend on; [`MemoryStore`] is
//! the in-process implementation. All trait methods use `impl Future` in
//! their signatures so an out-of-process store can be dropped in later
//! without touching the handlers.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::conversation::Conversation;

/// A conversation shared between concurrent requests of the same session.
///
/// Holders lock it for the whole exchange so a double-submitted message is
/// serialized instead of interleaving history writes.
pub type SharedConversation = Arc<tokio::sync::Mutex<Conversation>>;

/// Opaque, server-generated session token (32 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-supplied token only if it has the generated shape.
    ///
    /// The id ends up in upload file names, so anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == 32
            && raw.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of [`ConversationStore::get_or_create`].
#[derive(Debug)]
pub struct Acquired {
    pub conversation: SharedConversation,
    /// Sessions dropped to make room or because they idled out. Callers own
    /// any per-session resources outside the store (uploaded files).
    pub evicted: Vec<SessionId>,
}

/// Storage interface for per-session conversations.
pub trait ConversationStore: Send + Sync + 'static {
    /// Return the session's conversation, creating an empty one if needed.
    fn get_or_create(&self, id: &SessionId) -> impl Future<Output = Acquired> + Send;

    /// Return the session's conversation without creating one.
    fn get(&self, id: &SessionId) -> impl Future<Output = Option<SharedConversation>> + Send;

    /// Drop the session's conversation. Returns `true` if one existed.
    fn remove(&self, id: &SessionId) -> impl Future<Output = bool> + Send;

    /// Number of live sessions.
    fn len(&self) -> impl Future<Output = usize> + Send;
}

struct Entry {
    conversation: SharedConversation,
    last_access: Instant,
}

impl Entry {
    /// A request still holds a handle to this conversation.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.conversation) > 1
    }
}

/// Bounded in-memory store.
///
/// Entries idle for longer than `ttl` are pruned whenever a conversation is
/// acquired, and the least recently used entry is evicted once `capacity`
/// sessions exist. An entry whose conversation is still held by a request is
/// never removed; the store grows past `capacity` rather than orphan it.
/// Nothing is persisted; a restart forgets every conversation.
pub struct MemoryStore {
    entries: Mutex<HashMap<SessionId, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.entries.lock().map(|m| m.len()).unwrap_or(0);
        write!(f, "MemoryStore({count} sessions, ttl={:?}, capacity={})", self.ttl, self.capacity)
    }
}

impl MemoryStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_access) >= self.ttl
    }

    fn prune_expired(&self, map: &mut HashMap<SessionId, Entry>, now: Instant) -> Vec<SessionId> {
        let expired: Vec<SessionId> = map
            .iter()
            .filter(|(_, e)| !e.in_use() && self.is_expired(e, now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            map.remove(id);
        }
        if !expired.is_empty() {
            debug!(pruned = expired.len(), remaining = map.len(), "pruned idle sessions");
        }
        expired
    }

    /// Remove the least recently used idle entry, if any.
    fn evict_lru(map: &mut HashMap<SessionId, Entry>) -> Option<SessionId> {
        let oldest = map
            .iter()
            .filter(|(_, e)| !e.in_use())
            .min_by_key(|(_, e)| e.last_access)
            .map(|(id, _)| id.clone())?;
        map.remove(&oldest);
        info!(session = %oldest, "evicted least recently used session");
        Some(oldest)
    }
}

impl ConversationStore for MemoryStore {
    async fn get_or_create(&self, id: &SessionId) -> Acquired {
        let now = Instant::now();
        let mut map = self.lock();
        let mut evicted = self.prune_expired(&mut map, now);

        if let Some(entry) = map.get_mut(id) {
            entry.last_access = now;
            return Acquired { conversation: Arc::clone(&entry.conversation), evicted };
        }

        while map.len() >= self.capacity {
            match Self::evict_lru(&mut map) {
                Some(dropped) => evicted.push(dropped),
                None => {
                    warn!(sessions = map.len(), capacity = self.capacity, "all sessions busy; exceeding capacity");
                    break;
                }
            }
        }

        let conversation: SharedConversation = Arc::default();
        map.insert(
            id.clone(),
            Entry { conversation: Arc::clone(&conversation), last_access: now },
        );
        debug!(session = %id, sessions = map.len(), "conversation created");
        Acquired { conversation, evicted }
    }

    async fn get(&self, id: &SessionId) -> Option<SharedConversation> {
        let now = Instant::now();
        let mut map = self.lock();
        let entry = map.get_mut(id)?;
        // Expired entries are left for `get_or_create` to prune and report.
        if !entry.in_use() && self.is_expired(entry, now) {
            return None;
        }
        entry.last_access = now;
        Some(Arc::clone(&entry.conversation))
    }

    async fn remove(&self, id: &SessionId) -> bool {
        self.lock().remove(id).is_some()
    }

    async fn len(&self) -> usize {
        self.lock().len()
    }
}
