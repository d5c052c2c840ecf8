// Editor sessions: one in-memory document plus its editors per session id.
// Nothing is persisted; a session lives until it is deleted, sits idle past
// the store's idle timeout, or the process exits.

pub mod handlers;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::ResumeDocument;
use crate::editor::Editors;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(Uuid),

    #[error("session limit of {0} reached")]
    Full(usize),

    #[error("an export is already running for this session")]
    ExportInProgress,
}

#[derive(Debug)]
pub struct EditorSession {
    pub id: Uuid,
    pub document: ResumeDocument,
    pub editors: Editors,
    downloading: Arc<AtomicBool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Monotonic twin of `updated_at`, used for idle eviction.
    last_active: Instant,
}

impl EditorSession {
    fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            document: ResumeDocument::new(),
            editors: Editors::default(),
            downloading: Arc::new(AtomicBool::new(false)),
            created_at: now,
            updated_at: now,
            last_active: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.last_active = Instant::now();
    }

    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        !self.is_downloading() && now.saturating_duration_since(self.last_active) >= idle_timeout
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading.load(Ordering::SeqCst)
    }
}

/// Holds the session's `downloading` flag for the duration of one export.
/// Dropping the guard clears the flag, whatever the export's outcome.
#[derive(Debug)]
pub struct ExportGuard {
    flag: Arc<AtomicBool>,
}

impl ExportGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, EditorSession>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_sessions,
            idle_timeout,
        }
    }

    /// Creates a session. When the store is full, idle sessions are evicted
    /// first and the limit is checked again.
    pub async fn create(&self) -> Result<Uuid, SessionError> {
        let mut sessions = self.inner.write().await;
        if sessions.len() >= self.max_sessions {
            sweep_idle(&mut sessions, self.idle_timeout);
        }
        if sessions.len() >= self.max_sessions {
            return Err(SessionError::Full(self.max_sessions));
        }
        let id = Uuid::new_v4();
        sessions.insert(id, EditorSession::new(id));
        info!(session_id = %id, active = sessions.len(), "Session created");
        Ok(id)
    }

    /// Runs `f` against the session under a read lock.
    pub async fn read<T>(&self, id: Uuid, f: impl FnOnce(&EditorSession) -> T) -> Result<T, SessionError> {
        let sessions = self.inner.read().await;
        let session = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        Ok(f(session))
    }

    /// Runs `f` against the session under the write lock. `updated_at` is
    /// bumped whether or not `f` succeeds.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut EditorSession) -> T,
    ) -> Result<T, SessionError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        let out = f(session);
        session.touch();
        Ok(out)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let mut sessions = self.inner.write().await;
        sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
        info!(session_id = %id, active = sessions.len(), "Session removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Drops every session that has not been updated within the idle
    /// timeout. Sessions with an export running are kept. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.inner.write().await;
        sweep_idle(&mut sessions, self.idle_timeout)
    }

    /// Runs `evict_idle` every `every` on a background task.
    pub fn spawn_idle_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.evict_idle().await;
            }
        })
    }

    /// Marks the session as exporting and returns a snapshot of its document.
    ///
    /// Fails with `ExportInProgress` if an export already holds the flag. The
    /// lock is released before returning so edits can continue while the PDF
    /// is built from the snapshot.
    pub async fn begin_export(&self, id: Uuid) -> Result<(ResumeDocument, ExportGuard), SessionError> {
        let sessions = self.inner.read().await;
        let session = sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        let guard = ExportGuard::acquire(&session.downloading).ok_or(SessionError::ExportInProgress)?;
        debug!(session_id = %id, "Export started");
        Ok((session.document.clone(), guard))
    }
}

fn sweep_idle(sessions: &mut HashMap<Uuid, EditorSession>, idle_timeout: Duration) -> usize {
    let now = Instant::now();
    let before = sessions.len();
    sessions.retain(|_, s| !s.is_idle(now, idle_timeout));
    let evicted = before - sessions.len();
    if evicted > 0 {
        info!(evicted, active = sessions.len(), "Idle sessions evicted");
    }
    evicted
}
