use std::collections::HashMap;
use std::time::{Duration, Instant};

use jobdeck_logging::{deck_debug, deck_info};

use crate::{
    ActionKind, ActionStore, JobId, Memberships, Notification, NotificationKind, NotificationSink,
    PersistenceError, StorageAdapter,
};

/// Grace window used when the caller does not configure one.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(5);

const PERSIST_FAILED_MESSAGE: &str = "Your change could not be saved on this device";

/// How long an applied action stays reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoPolicy {
    After(Duration),
    UntilDismissed,
}

impl Default for UndoPolicy {
    fn default() -> Self {
        UndoPolicy::After(DEFAULT_GRACE_WINDOW)
    }
}

impl UndoPolicy {
    fn deadline(self, now: Instant) -> Option<Instant> {
        match self {
            UndoPolicy::After(window) => Some(now + window),
            UndoPolicy::UntilDismissed => None,
        }
    }

    fn duration_ms(self) -> Option<u64> {
        match self {
            UndoPolicy::After(window) => Some(window.as_millis() as u64),
            UndoPolicy::UntilDismissed => None,
        }
    }
}

/// Reversible gestures on a job card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndoKind {
    Hidden,
    Unfavorited,
    Unarchived,
}

impl UndoKind {
    /// Set and target membership the gesture writes.
    pub fn target(self) -> (ActionKind, bool) {
        match self {
            UndoKind::Hidden => (ActionKind::Hidden, true),
            UndoKind::Unfavorited => (ActionKind::Favorites, false),
            UndoKind::Unarchived => (ActionKind::Archived, false),
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            UndoKind::Hidden => "Job hidden",
            UndoKind::Unfavorited => "Removed from favorites",
            UndoKind::Unarchived => "Removed from archive",
        }
    }
}

/// Outstanding undo for one job. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUndo {
    pub job_id: JobId,
    pub kind: UndoKind,
    pub expires_at: Option<Instant>,
    prior: Memberships,
}

impl PendingUndo {
    /// Memberships the job had before the gesture; undo restores these.
    pub fn prior(&self) -> Memberships {
        self.prior
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// What a job card should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    AppliedPending {
        kind: UndoKind,
        expires_at: Option<Instant>,
    },
}

#[derive(Debug)]
#[must_use]
pub struct Applied {
    /// Undo that was cancelled (not reverted) to make room for this one.
    pub replaced: Option<UndoKind>,
    pub persisted: Result<(), PersistenceError>,
}

/// Applies gestures immediately and keeps them reversible for the grace window.
///
/// At most one pending undo exists per job. Time is passed in by the
/// caller, so expiry is driven by whatever tick source the host has.
pub struct OptimisticActionController<N> {
    policy: UndoPolicy,
    pending: HashMap<JobId, PendingUndo>,
    notifier: N,
}

impl<N: NotificationSink> OptimisticActionController<N> {
    pub fn new(policy: UndoPolicy, notifier: N) -> Self {
        Self {
            policy,
            pending: HashMap::new(),
            notifier,
        }
    }

    pub fn policy(&self) -> UndoPolicy {
        self.policy
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Mutates `store` at once and registers an undo for `job_id`,
    /// replacing any outstanding one without reverting it.
    pub fn apply_and_show_undo<S: StorageAdapter>(
        &mut self,
        store: &mut ActionStore<S>,
        job_id: JobId,
        kind: UndoKind,
        now: Instant,
    ) -> Applied {
        let replaced = self.pending.remove(&job_id).map(|prev| {
            deck_debug!("Replacing pending {:?} on job={}", prev.kind, job_id);
            prev.kind
        });

        let prior = store.memberships(&job_id);
        let (action, member) = kind.target();
        let toggle = store.set(action, job_id.clone(), member);

        let expires_at = self.policy.deadline(now);
        deck_debug!("Applied {:?} on job={} expires_at={:?}", kind, job_id, expires_at);
        self.pending.insert(
            job_id.clone(),
            PendingUndo {
                job_id: job_id.clone(),
                kind,
                expires_at,
                prior,
            },
        );

        self.notifier.notify(Notification {
            message: kind.message().to_string(),
            kind: NotificationKind::Undoable(kind),
            job_id: Some(job_id.clone()),
            duration_ms: self.policy.duration_ms(),
        });
        if toggle.persisted.is_err() {
            self.notify_persist_failed(job_id);
        }

        Applied {
            replaced,
            persisted: toggle.persisted,
        }
    }

    /// Reverts the pending action on `job_id`. Returns `None` when there
    /// is nothing to undo or the grace window already elapsed.
    pub fn undo<S: StorageAdapter>(
        &mut self,
        store: &mut ActionStore<S>,
        job_id: &JobId,
        now: Instant,
    ) -> Option<UndoKind> {
        let pending = self.pending.remove(job_id)?;
        if pending.is_expired(now) {
            deck_debug!("Undo for job={} arrived after the grace window; committed", job_id);
            return None;
        }

        let persisted = store.restore(job_id, pending.prior);
        deck_info!("Reverted {:?} on job={}", pending.kind, job_id);
        self.notifier.notify(Notification {
            message: "Action undone".to_string(),
            kind: NotificationKind::Info,
            job_id: Some(job_id.clone()),
            duration_ms: Some(2_000),
        });
        if persisted.is_err() {
            self.notify_persist_failed(job_id.clone());
        }
        Some(pending.kind)
    }

    /// Commits every pending undo whose window has elapsed.
    pub fn expire_due(&mut self, now: Instant) -> Vec<PendingUndo> {
        let due: Vec<JobId> = self
            .pending
            .values()
            .filter(|pending| pending.is_expired(now))
            .map(|pending| pending.job_id.clone())
            .collect();
        let mut committed: Vec<PendingUndo> = due
            .iter()
            .filter_map(|job_id| self.pending.remove(job_id))
            .collect();
        committed.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        for pending in &committed {
            deck_debug!("Committed {:?} on job={}", pending.kind, pending.job_id);
        }
        committed
    }

    /// Commits one pending undo before its window ends (manual dismissal).
    pub fn dismiss(&mut self, job_id: &JobId) -> Option<PendingUndo> {
        let pending = self.pending.remove(job_id)?;
        deck_debug!("Dismissed {:?} on job={}", pending.kind, job_id);
        Some(pending)
    }

    /// Commits everything, e.g. when the user navigates away.
    pub fn commit_all(&mut self) -> Vec<PendingUndo> {
        let mut committed: Vec<PendingUndo> = self.pending.drain().map(|(_, p)| p).collect();
        committed.sort_by(|a, b| a.job_id.cmp(&b.job_id));
        committed
    }

    pub fn state(&self, job_id: &JobId, now: Instant) -> CardState {
        match self.pending.get(job_id) {
            Some(pending) if !pending.is_expired(now) => CardState::AppliedPending {
                kind: pending.kind,
                expires_at: pending.expires_at,
            },
            _ => CardState::Idle,
        }
    }

    pub fn pending(&self, job_id: &JobId) -> Option<&PendingUndo> {
        self.pending.get(job_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Earliest deadline among pending undos, for scheduling the next sweep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().filter_map(|p| p.expires_at).min()
    }

    fn notify_persist_failed(&self, job_id: JobId) {
        self.notifier.notify(Notification {
            message: PERSIST_FAILED_MESSAGE.to_string(),
            kind: NotificationKind::Error,
            job_id: Some(job_id),
            duration_ms: Some(4_000),
        });
    }
}
