use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::session_db::{SessionDb, SessionDbOptions};

/// Process-scoped cache of read-only session handles, for repeated lookups
/// from replay and extraction tooling.
///
/// Owned, explicit state: construct one at process start and thread it to
/// whatever needs session lookup. At most one live read-only handle exists
/// per session id; a cached handle found closed (its writer deleted the
/// file, say) is replaced transparently instead of being returned stale.
#[derive(Default)]
pub struct SessionRegistry {
    by_id: Mutex<HashMap<String, Arc<SessionDb>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the open read-only handle for a session, opening and caching
    /// one if none exists. Accepts a bare session id or a `<id>.db` file
    /// name.
    pub fn get_cached(
        &self,
        session_id: &str,
        file_must_exist: bool,
        custom_path: Option<PathBuf>,
    ) -> Result<Arc<SessionDb>> {
        let session_id = session_id.strip_suffix(".db").unwrap_or(session_id);

        let mut by_id = self.lock();
        if let Some(existing) = by_id.get(session_id)
            && existing.is_open()
        {
            return Ok(existing.clone());
        }

        let db = SessionDb::open(
            session_id,
            SessionDbOptions {
                readonly: true,
                file_must_exist,
            },
            custom_path,
        )?;
        by_id.insert(session_id.to_string(), db.clone());
        Ok(db)
    }

    /// Drop the cached handle for a session, if any. The handle itself is
    /// returned so the caller may close it.
    pub fn remove(&self, session_id: &str) -> Option<Arc<SessionDb>> {
        let session_id = session_id.strip_suffix(".db").unwrap_or(session_id);
        self.lock().remove(session_id)
    }

    /// Forget every cached handle. Test teardown.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<SessionDb>>> {
        match self.by_id.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
