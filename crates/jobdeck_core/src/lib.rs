//! Jobdeck core: per-user job actions, union merge and the optimistic undo state machine.
mod auth;
mod error;
mod ids;
mod notify;
mod overlay;
mod store;
mod undo;
mod view_model;

pub use auth::{AuthGate, AuthProvider};
pub use error::{ParseError, PersistenceError};
pub use ids::JobId;
pub use notify::{Notification, NotificationKind, NotificationSink, NullSink};
pub use overlay::{merge, ActionKind, ActionOverlay, ActionSet, Disposition, Memberships};
pub use store::{ActionStore, MemoryStorage, StorageAdapter, Toggle, UtcClock};
pub use undo::{
    Applied, CardState, OptimisticActionController, PendingUndo, UndoKind, UndoPolicy,
    DEFAULT_GRACE_WINDOW,
};
pub use view_model::{CardView, DeckView};
