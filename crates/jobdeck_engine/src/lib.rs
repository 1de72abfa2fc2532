//! Jobdeck engine: storage adapters, snapshot fetching and startup sync.
mod persist;
mod remote;
mod storage;
mod sync;
mod types;

pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use remote::{FetchSettings, RemoteActions, ReqwestRemote};
pub use storage::{FileStorage, OVERLAY_FILENAME};
pub use sync::SyncCoordinator;
pub use types::{FailureKind, FetchError};
