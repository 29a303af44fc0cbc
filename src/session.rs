use crate::models::{GeneratedImage, GenerationParameters};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Everything one browser session has generated, newest batch first.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    entries: Vec<GeneratedImage>,
    last_params: GenerationParameters,
    last_prompt: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the batch as one contiguous block in front of all earlier entries.
    pub fn prepend_batch(&mut self, batch: Vec<GeneratedImage>) {
        self.entries.splice(0..0, batch);
    }

    pub fn entries(&self) -> &[GeneratedImage] {
        &self.entries
    }

    pub fn captions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.caption.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_params(&self) -> &GenerationParameters {
        &self.last_params
    }

    pub fn last_prompt(&self) -> &str {
        &self.last_prompt
    }

    /// Remembers the controls of the latest submission, successful or not.
    pub fn remember_input(&mut self, prompt: &str, params: GenerationParameters) {
        self.last_prompt = prompt.to_string();
        self.last_params = params;
    }
}

pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Sessions not touched for this long are dropped on the next store access.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
struct Slot {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Maps session ids to their own state. Each session is locked independently.
///
/// A session lives from its first generate submission until the page is reloaded
/// ([`SessionStore::end`]) or it sits idle past the timeout.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Slot>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(SESSION_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns the session for `id`, starting an empty one if it is unknown.
    pub fn session(&self, id: Uuid) -> SessionHandle {
        let now = Instant::now();
        let mut sessions = self.slots();

        let idle_timeout = self.idle_timeout;
        sessions.retain(|sid, slot| {
            let keep = *sid == id || now.duration_since(slot.last_seen) < idle_timeout;
            if !keep {
                log::debug!("Expiring idle session {}", sid);
            }
            keep
        });

        let slot = sessions.entry(id).or_insert_with(|| {
            log::debug!("Starting session {}", id);
            Slot {
                handle: Arc::new(Mutex::new(SessionState::new())),
                last_seen: now,
            }
        });
        slot.last_seen = now;
        slot.handle.clone()
    }

    /// Discards the session and everything it generated. Returns whether it existed.
    pub fn end(&self, id: Uuid) -> bool {
        let ended = self.slots().remove(&id).is_some();
        if ended {
            log::debug!("Ended session {}", id);
        }
        ended
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
