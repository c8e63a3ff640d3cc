use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use telescope_types::{Result, SessionType};
use tracing::info;

use crate::archive::write_archive;
use crate::session::Session;

/// Process-wide holder of the single currently-open session. Starting a new
/// session closes and flushes the previous one first; after any close an
/// idle session is auto-created so a stray `log()` call is never dropped.
pub struct SessionManager {
    data_dir: PathBuf,
    current: Mutex<Option<Arc<Session>>>,
}

impl SessionManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let manager = SessionManager { data_dir: data_dir.into(), current: Mutex::new(None) };
        manager.start_session(SessionType::Idle, None, None, None);
        manager
    }

    pub fn current(&self) -> Arc<Session> {
        self.current
            .lock()
            .clone()
            .expect("SessionManager always holds a session after construction")
    }

    pub fn start_session(
        &self,
        session_type: SessionType,
        target: Option<String>,
        purpose: Option<String>,
        location: Option<String>,
    ) -> Arc<Session> {
        self.close_current_if_open();
        let session = Arc::new(Session::new(session_type, target, purpose, location));
        info!(session_id = %session.session_id, "session started");
        *self.current.lock() = Some(session.clone());
        session
    }

    fn close_current_if_open(&self) {
        let previous = self.current.lock().take();
        if let Some(session) = previous {
            if !session.is_closed() {
                if let Ok(archive) = session.close() {
                    if let Err(e) = write_archive(&self.data_dir, &archive) {
                        tracing::warn!(session_id = %session.session_id, error = %e, "failed to write session archive");
                    }
                }
            }
        }
    }

    /// Closes the current session and starts a fresh idle one so future
    /// mutations still have somewhere to land. Returns the archive path.
    pub fn close_and_archive(&self) -> Result<Option<PathBuf>> {
        let previous = self.current.lock().take();
        let path = match previous {
            Some(session) if !session.is_closed() => {
                let archive = session.close()?;
                let path = write_archive(&self.data_dir, &archive)
                    .map_err(|e| telescope_types::Error::Internal(e.to_string()))?;
                Some(path)
            }
            _ => None,
        };
        let idle = Arc::new(Session::new(SessionType::Idle, None, None, None));
        *self.current.lock() = Some(idle);
        Ok(path)
    }

    /// Closes the current session permanently and leaves the manager
    /// sessionless. A second call is a no-op returning `None`.
    pub fn shutdown(&self) -> Result<Option<PathBuf>> {
        let previous = self.current.lock().take();
        match previous {
            Some(session) if !session.is_closed() => {
                let archive = session.close()?;
                let path = write_archive(&self.data_dir, &archive)
                    .map_err(|e| telescope_types::Error::Internal(e.to_string()))?;
                Ok(Some(path))
            }
            _ => Ok(None),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
