use crate::{JobId, UndoKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// An optimistic action was applied; the UI may offer undo.
    Undoable(UndoKind),
    Info,
    Error,
}

/// Transient message for the surrounding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub job_id: Option<JobId>,
    /// `None` keeps the notification until dismissed.
    pub duration_ms: Option<u64>,
}

/// Fire-and-forget notification boundary.
pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}

/// Sink that drops everything. Handy for headless callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: Notification) {}
}
