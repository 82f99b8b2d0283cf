use std::collections::HashMap;
use std::sync::Arc;

use codesnip_app::app::App;
use codesnip_auth::session::SessionFactory;
use codesnip_storage::store::DocumentStore;
use jiff::{SignedDuration, Timestamp};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Browser session id.
pub const SESSION_COOKIE: &str = "codesnip_sid";
/// Remembered sign-in, replayed when a browser starts a new session.
pub const REFRESH_COOKIE: &str = "codesnip_refresh";

const DEFAULT_IDLE_SECS: i64 = 30 * 60;
const DEFAULT_CAPACITY: usize = 10_000;

/// One browser session's app. Requests for the same browser are
/// serialized on its lock.
pub type SharedApp = Arc<Mutex<App>>;

/// How long an untouched browser session is kept, and how many are kept
/// at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub idle: SignedDuration,
    pub capacity: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle: SignedDuration::from_secs(DEFAULT_IDLE_SECS),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

struct Entry {
    app: SharedApp,
    last_seen: Timestamp,
}

/// Registry of live browser sessions keyed by [`SESSION_COOKIE`].
///
/// Idle sessions are dropped when looked up and whenever a new session is
/// opened; past `capacity` the least recently seen ones go first. A dropped
/// browser starts over with a fresh session, restored from its refresh
/// cookie if it has one.
#[derive(Clone, Default)]
pub struct BrowserSessions {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    limits: SessionLimits,
}

impl BrowserSessions {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            entries: Arc::default(),
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub async fn get(&self, id: &str) -> Option<SharedApp> {
        self.get_at(id, Timestamp::now()).await
    }

    /// Look up a session and mark it seen at `now`. A session idle for
    /// longer than the limit is removed instead.
    pub async fn get_at(&self, id: &str, now: Timestamp) -> Option<SharedApp> {
        let mut entries = self.entries.write().await;
        let expired = now.duration_since(entries.get(id)?.last_seen) > self.limits.idle;
        if expired {
            entries.remove(id);
            debug!("browser session expired");
            return None;
        }

        let entry = entries.get_mut(id)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.app))
    }

    pub async fn open(
        &self,
        store: Arc<dyn DocumentStore>,
        sessions: &dyn SessionFactory,
        restore: Option<String>,
    ) -> (String, SharedApp) {
        self.open_at(store, sessions, restore, Timestamp::now()).await
    }

    /// Start a browser session with its own session provider, restoring
    /// a remembered sign-in when one is given.
    pub async fn open_at(
        &self,
        store: Arc<dyn DocumentStore>,
        sessions: &dyn SessionFactory,
        restore: Option<String>,
        now: Timestamp,
    ) -> (String, SharedApp) {
        let id = Uuid::new_v4().to_string();
        let restoring = restore.is_some();
        let app = Arc::new(Mutex::new(App::new(store, sessions.open(restore))));

        let mut entries = self.entries.write().await;
        let evicted = make_room(&mut entries, now, self.limits);
        entries.insert(
            id.clone(),
            Entry {
                app: Arc::clone(&app),
                last_seen: now,
            },
        );
        info!(restoring, evicted, live = entries.len(), "browser session started");
        (id, app)
    }

    /// Forget a session, e.g. after its user signed out.
    pub async fn remove(&self, id: &str) -> bool {
        self.entries.write().await.remove(id).is_some()
    }

    /// Drop every session idle at `now`. Returns how many were dropped.
    pub async fn evict_idle(&self, now: Timestamp) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_seen) <= self.limits.idle);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Drop idle entries, then the least recently seen ones until one more
/// entry fits. Returns how many were dropped.
fn make_room(entries: &mut HashMap<String, Entry>, now: Timestamp, limits: SessionLimits) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| now.duration_since(entry.last_seen) <= limits.idle);

    while entries.len() >= limits.capacity.max(1) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(id, _)| id.clone());
        match oldest {
            Some(id) => {
                entries.remove(&id);
            }
            None => break,
        }
    }
    before - entries.len()
}
