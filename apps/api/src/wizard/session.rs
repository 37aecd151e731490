//! In-memory wizard sessions.
//!
//! Each session owns one `Wizard`. Mutating operations first take the
//! session's in-flight flag; a second operation arriving while one is pending
//! is rejected instead of queued. Sessions idle for longer than the store's
//! TTL are evicted together with their photo bitmap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::wizard::{Wizard, WizardSnapshot};

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    last_active: StdMutex<Instant>,
    in_flight: AtomicBool,
    wizard: Mutex<Wizard>,
    /// Snapshot taken the last time the wizard lock was free. Served to
    /// readers while an action holds the lock.
    last_snapshot: StdMutex<WizardSnapshot>,
}

impl Session {
    fn new() -> Self {
        let wizard = Wizard::new();
        Session {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            last_active: StdMutex::new(Instant::now()),
            in_flight: AtomicBool::new(false),
            last_snapshot: StdMutex::new(wizard.snapshot()),
            wizard: Mutex::new(wizard),
        }
    }

    /// Claims the in-flight flag. Fails with `AppError::Busy` if another
    /// action holds it.
    pub fn begin(&self) -> Result<InFlightGuard<'_>, AppError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Busy)?;
        Ok(InFlightGuard { flag: &self.in_flight })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Read or write access to the wizard. Writers must hold an
    /// `InFlightGuard` first.
    pub async fn wizard(&self) -> tokio::sync::MutexGuard<'_, Wizard> {
        self.wizard.lock().await
    }

    /// Current snapshot without waiting on a pending action. When the wizard
    /// is locked the last recorded snapshot is returned instead.
    pub fn snapshot(&self) -> WizardSnapshot {
        let mut cached = self
            .last_snapshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Ok(wizard) = self.wizard.try_lock() {
            *cached = wizard.snapshot();
        }
        cached.clone()
    }

    fn touch(&self) {
        let mut last = self
            .last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .elapsed()
    }
}

/// Releases the in-flight flag on drop, on success and failure paths alike.
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn create(&self) -> Result<Arc<Session>, AppError> {
        self.evict_idle()?;
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("session store poisoned: {e}")))?
            .insert(session.id, session.clone());
        info!(session_id = %session.id, "session created");
        Ok(session)
    }

    /// Looks up a session and marks it active.
    pub fn get(&self, id: Uuid) -> Result<Arc<Session>, AppError> {
        let session = self
            .sessions
            .read()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("session store poisoned: {e}")))?
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        session.touch();
        Ok(session)
    }

    /// Removes the session. Its photo bitmap is freed once in-flight
    /// requests holding the `Arc<Session>` finish.
    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .sessions
            .write()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("session store poisoned: {e}")))?
            .remove(&id);
        match removed {
            Some(_) => {
                info!(session_id = %id, "session removed");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Session {id} not found"))),
        }
    }

    /// Drops sessions idle for at least the TTL. Sessions with an action in
    /// flight are kept. Returns how many were evicted.
    pub fn evict_idle(&self) -> Result<usize, AppError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("session store poisoned: {e}")))?;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_busy() || s.idle_for() < self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
        Ok(evicted)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

/// Background sweep: evicts idle sessions every half TTL.
pub fn spawn_eviction(store: Arc<SessionStore>) -> tokio::task::JoinHandle<()> {
    let period = (store.idle_ttl() / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        loop {
            tick.tick().await;
            if let Err(e) = store.evict_idle() {
                tracing::error!("session eviction failed: {e}");
            } else {
                debug!("session sweep done");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::photo::{png_fixture, PhotoPreview};

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_create_get_remove() {
        let store = SessionStore::new(TTL);
        let session = store.create().unwrap();
        assert_eq!(store.get(session.id).unwrap().id, session.id);
        assert_eq!(store.len(), 1);

        store.remove(session.id).unwrap();
        assert!(matches!(store.get(session.id), Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(session.id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_second_action_rejected_while_in_flight() {
        let store = SessionStore::new(TTL);
        let session = store.create().unwrap();

        let guard = session.begin().unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.begin(), Err(AppError::Busy)));

        drop(guard);
        assert!(!session.is_busy());
        assert!(session.begin().is_ok());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new(TTL);
        let a = store.create().unwrap();
        let b = store.create().unwrap();
        assert_ne!(a.id, b.id);

        a.wizard().await.set_name("Alex");
        assert_eq!(b.wizard().await.form().name, "");
        assert_eq!(a.wizard().await.form().name, "Alex");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_evicted_and_bitmap_released() {
        let store = SessionStore::new(TTL);
        let session = store.create().unwrap();
        let id = session.id;
        let photo = PhotoPreview::decode(None, "image/png", &png_fixture(8, 8)).unwrap();
        let bitmap = Arc::clone(&photo.bitmap);
        session.wizard().await.set_photo(photo);
        drop(session);

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert_eq!(store.evict_idle().unwrap(), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.evict_idle().unwrap(), 1);
        assert!(matches!(store.get(id), Err(AppError::NotFound(_))));
        assert_eq!(Arc::strong_count(&bitmap), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_session_alive() {
        let store = SessionStore::new(TTL);
        let id = store.create().unwrap().id;

        tokio::time::advance(TTL - Duration::from_secs(5)).await;
        store.get(id).unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.evict_idle().unwrap(), 0);
        assert!(store.get(id).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_session_survives_sweep() {
        let store = SessionStore::new(TTL);
        let session = store.create().unwrap();
        let _guard = session.begin().unwrap();

        tokio::time::advance(TTL * 2).await;
        assert_eq!(store.evict_idle().unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_sweeps_expired_sessions() {
        let store = SessionStore::new(TTL);
        let old = store.create().unwrap().id;
        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        store.create().unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(old).is_err());
    }

    #[tokio::test]
    async fn test_snapshot_does_not_wait_for_wizard_lock() {
        let store = SessionStore::new(TTL);
        let session = store.create().unwrap();
        session.wizard().await.set_name("Alex");
        assert_eq!(session.snapshot().name, "Alex");

        let mut locked = session.wizard().await;
        locked.set_name("Sam");
        // Lock held: the last recorded snapshot is served.
        assert_eq!(session.snapshot().name, "Alex");
        drop(locked);
        assert_eq!(session.snapshot().name, "Sam");
    }
}
