//! Session registry: checkpoint id → per-session memory and thread config.
//!
//! The registry map sits behind a synchronous mutex that is only held for
//! lookups and inserts. Each session has its own async mutex, which a turn
//! holds for its whole run so turns on one checkpoint are serialized while
//! different checkpoints proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::memory::{SummarizingMemory, DEFAULT_RETAINED_TURNS, DEFAULT_TOKEN_LIMIT};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Thread-scoped settings carried with a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadConfig {
    pub thread_id: String,
    /// Completed turns on this thread.
    pub turns: u64,
}

#[derive(Debug)]
pub struct Session {
    pub checkpoint_id: String,
    pub thread: ThreadConfig,
    pub memory: SummarizingMemory,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn new(checkpoint_id: String, memory: SummarizingMemory) -> Self {
        Self {
            thread: ThreadConfig {
                thread_id: checkpoint_id.clone(),
                turns: 0,
            },
            checkpoint_id,
            memory,
            created_at: Utc::now(),
        }
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// Outcome of [`SessionRegistry::resolve_or_create`].
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub checkpoint_id: String,
    /// True only when the id was minted by this call.
    pub is_new: bool,
    pub session: SessionHandle,
}

#[derive(Debug)]
struct Entry {
    session: SessionHandle,
    last_used: Instant,
}

impl Entry {
    /// A handle held outside the registry means a turn resolved this session
    /// and may still be running on it.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.session) > 1
    }
}

/// Sizing and retention settings for the registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub ttl: Duration,
    pub max_sessions: usize,
    pub memory_token_limit: usize,
    pub memory_retained_turns: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_SESSION_TTL,
            max_sessions: DEFAULT_MAX_SESSIONS,
            memory_token_limit: DEFAULT_TOKEN_LIMIT,
            memory_retained_turns: DEFAULT_RETAINED_TURNS,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    settings: RegistrySettings,
}

impl SessionRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            settings,
        }
    }

    /// Look up a session by checkpoint id, creating one when needed.
    ///
    /// - no id (or a blank one): mint a UUID v4, `is_new = true`
    /// - known id: the existing session, last-used refreshed
    /// - unknown id: fresh memory registered under that id, `is_new = false`
    pub fn resolve_or_create(&self, checkpoint_id: Option<&str>) -> ResolvedSession {
        let supplied = checkpoint_id.map(str::trim).filter(|id| !id.is_empty());
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        self.evict_expired(&mut entries, now);

        if let Some(id) = supplied {
            if let Some(entry) = entries.get_mut(id) {
                entry.last_used = now;
                return ResolvedSession {
                    checkpoint_id: id.to_string(),
                    is_new: false,
                    session: Arc::clone(&entry.session),
                };
            }
            tracing::debug!(checkpoint_id = %id, "unknown checkpoint, starting fresh memory");
        }

        let (checkpoint_id, is_new) = match supplied {
            Some(id) => (id.to_string(), false),
            None => (uuid::Uuid::new_v4().to_string(), true),
        };

        self.evict_for_capacity(&mut entries);
        let memory = SummarizingMemory::new(
            self.settings.memory_token_limit,
            self.settings.memory_retained_turns,
        );
        let session: SessionHandle =
            Arc::new(tokio::sync::Mutex::new(Session::new(checkpoint_id.clone(), memory)));
        entries.insert(
            checkpoint_id.clone(),
            Entry {
                session: Arc::clone(&session),
                last_used: now,
            },
        );

        ResolvedSession {
            checkpoint_id,
            is_new,
            session,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, checkpoint_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(checkpoint_id)
    }

    /// Remove a session explicitly.
    pub fn remove(&self, checkpoint_id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(checkpoint_id)
            .is_some()
    }

    fn evict_expired(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        let ttl = self.settings.ttl;
        let before = entries.len();
        entries.retain(|_, entry| entry.in_use() || now.duration_since(entry.last_used) <= ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle sessions");
        }
    }

    /// Sessions in use are never victims, so the map may briefly exceed
    /// capacity while every entry has a turn in flight.
    fn evict_for_capacity(&self, entries: &mut HashMap<String, Entry>) {
        let capacity = self.settings.max_sessions.max(1);
        while entries.len() >= capacity {
            let Some(oldest) = entries
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone())
            else {
                tracing::debug!(sessions = entries.len(), "all sessions in use, over capacity");
                break;
            };
            tracing::debug!(checkpoint_id = %oldest, "evicting least recently used session");
            entries.remove(&oldest);
        }
    }
}
