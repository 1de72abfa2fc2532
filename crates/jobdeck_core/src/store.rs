use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobdeck_logging::{deck_debug, deck_error, deck_warn};

use crate::overlay::merge;
use crate::{ActionKind, ActionOverlay, ActionSet, JobId, Memberships, PersistenceError};

/// Read/write boundary for the locally persisted overlay.
pub trait StorageAdapter {
    /// `Ok(None)` means nothing has been persisted yet (first run).
    fn load(&self) -> Result<Option<ActionOverlay>, PersistenceError>;
    fn save(&mut self, overlay: &ActionOverlay) -> Result<(), PersistenceError>;
}

impl<S: StorageAdapter + ?Sized> StorageAdapter for Box<S> {
    fn load(&self) -> Result<Option<ActionOverlay>, PersistenceError> {
        (**self).load()
    }

    fn save(&mut self, overlay: &ActionOverlay) -> Result<(), PersistenceError> {
        (**self).save(overlay)
    }
}

/// Session-only storage. Used server side and when no state directory is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saved: Option<ActionOverlay>,
    save_count: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlay(overlay: ActionOverlay) -> Self {
        Self {
            saved: Some(overlay),
            save_count: 0,
        }
    }

    pub fn saved(&self) -> Option<&ActionOverlay> {
        self.saved.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl StorageAdapter for MemoryStorage {
    fn load(&self) -> Result<Option<ActionOverlay>, PersistenceError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, overlay: &ActionOverlay) -> Result<(), PersistenceError> {
        self.saved = Some(overlay.clone());
        self.save_count += 1;
        Ok(())
    }
}

/// Result of a membership change.
///
/// `member` always reflects the in-memory state, even when `persisted`
/// carries an error.
#[derive(Debug)]
#[must_use]
pub struct Toggle {
    pub member: bool,
    pub changed: bool,
    pub persisted: Result<(), PersistenceError>,
}

pub type UtcClock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-memory owner of the three action sets for the current user.
pub struct ActionStore<S> {
    overlay: ActionOverlay,
    storage: S,
    unflushed: bool,
    memory_only: bool,
    now_utc: UtcClock,
}

impl<S: StorageAdapter> ActionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            overlay: ActionOverlay::default(),
            storage,
            unflushed: false,
            memory_only: false,
            now_utc: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock used to stamp `updated_at`.
    pub fn with_clock(mut self, now_utc: UtcClock) -> Self {
        self.now_utc = now_utc;
        self
    }

    pub fn overlay(&self) -> &ActionOverlay {
        &self.overlay
    }

    pub fn get(&self, kind: ActionKind) -> &ActionSet {
        self.overlay.set(kind)
    }

    pub fn contains(&self, kind: ActionKind, job_id: &JobId) -> bool {
        self.overlay.set(kind).contains(job_id)
    }

    pub fn memberships(&self, job_id: &JobId) -> Memberships {
        self.overlay.memberships(job_id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// True once the store has stopped writing to storage for this session.
    pub fn is_memory_only(&self) -> bool {
        self.memory_only
    }

    /// False after a failed write until a later write succeeds.
    pub fn is_flushed(&self) -> bool {
        !self.unflushed
    }

    /// Flips membership of `job_id` in `kind`.
    pub fn toggle(&mut self, kind: ActionKind, job_id: JobId) -> Toggle {
        let member = !self.contains(kind, &job_id);
        self.set(kind, job_id, member)
    }

    /// Sets membership of `job_id` in `kind`. Joining `archived` leaves
    /// `hidden` and vice versa; `favorites` never touches the other sets.
    pub fn set(&mut self, kind: ActionKind, job_id: JobId, member: bool) -> Toggle {
        let mut changed = false;
        if member {
            if let Some(other) = kind.exclusive_with() {
                changed |= self.overlay.set_mut(other).remove(&job_id);
            }
            changed |= self.overlay.set_mut(kind).insert(job_id.clone());
        } else {
            changed |= self.overlay.set_mut(kind).remove(&job_id);
        }

        if !changed {
            let persisted = if self.unflushed { self.persist() } else { Ok(()) };
            return Toggle {
                member,
                changed,
                persisted,
            };
        }

        deck_debug!("{} {} job={}", if member { "add" } else { "remove" }, kind, job_id);
        self.touch();
        Toggle {
            member,
            changed,
            persisted: self.persist(),
        }
    }

    /// Puts a job back to exactly the given memberships.
    pub fn restore(&mut self, job_id: &JobId, prior: Memberships) -> Result<(), PersistenceError> {
        let mut changed = false;
        for kind in ActionKind::ALL {
            let set = self.overlay.set_mut(kind);
            changed |= if prior.get(kind) {
                set.insert(job_id.clone())
            } else {
                set.remove(job_id)
            };
        }
        if !changed {
            return if self.unflushed { self.persist() } else { Ok(()) };
        }
        deck_debug!("restore job={} to {:?}", job_id, prior);
        self.touch();
        self.persist()
    }

    /// Merged view of the current overlay and `remote`. Does not mutate the store.
    pub fn merge(&self, remote: &ActionOverlay) -> ActionOverlay {
        merge(&self.overlay, remote)
    }

    /// Reads the persisted overlay, repairing exclusivity violations.
    pub fn load_local(&self) -> Result<Option<ActionOverlay>, PersistenceError> {
        let Some(mut overlay) = self.storage.load()? else {
            return Ok(None);
        };
        let conflicts = overlay.conflicts();
        if !conflicts.is_empty() {
            deck_warn!(
                "Persisted overlay had {} archived/hidden conflicts; keeping hidden",
                conflicts.len()
            );
            overlay.resolve_conflicts();
        }
        Ok(Some(overlay))
    }

    /// Replaces the in-memory overlay and persists it.
    pub fn hydrate(&mut self, overlay: ActionOverlay) -> Result<(), PersistenceError> {
        self.overlay = overlay;
        self.persist()
    }

    /// Replaces the in-memory overlay and stops writing to storage for the
    /// rest of the session. Used when the persisted overlay could not be
    /// read, so a blind write would clobber it.
    pub fn hydrate_in_memory(&mut self, overlay: ActionOverlay) {
        deck_warn!("Action store is in-memory only for this session");
        self.overlay = overlay;
        self.memory_only = true;
        self.unflushed = false;
    }

    /// Writes the current overlay.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        self.persist()
    }

    fn touch(&mut self) {
        self.overlay.version = self.overlay.version.saturating_add(1);
        self.overlay.updated_at = Some((self.now_utc)());
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        if self.memory_only {
            return Ok(());
        }
        match self.storage.save(&self.overlay) {
            Ok(()) => {
                self.unflushed = false;
                Ok(())
            }
            Err(err) => {
                deck_error!("Failed to persist action overlay v{}: {}", self.overlay.version, err);
                self.unflushed = true;
                Err(err)
            }
        }
    }
}
