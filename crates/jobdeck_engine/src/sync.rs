use jobdeck_core::{merge, ActionOverlay, ActionStore, PersistenceError, StorageAdapter};
use jobdeck_logging::{deck_debug, deck_error, deck_info, deck_warn};

use crate::RemoteActions;

/// One-shot startup reconciliation of the server snapshot with local state.
pub struct SyncCoordinator<R> {
    remote: Option<R>,
    initialized: bool,
}

impl<R: RemoteActions> SyncCoordinator<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote: Some(remote),
            initialized: false,
        }
    }

    /// No server configured; reconciliation only repairs and re-persists local state.
    pub fn local_only() -> Self {
        Self {
            remote: None,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Merges persisted, in-memory and server state into `store` and
    /// returns the result. Never fails: every error degrades to the best
    /// local state available. A local overlay that exists but cannot be
    /// read puts the store in memory-only mode instead of overwriting it. Later calls return the store's overlay
    /// without fetching again.
    pub async fn initialize<S: StorageAdapter>(
        &mut self,
        store: &mut ActionStore<S>,
    ) -> ActionOverlay {
        if self.initialized {
            deck_debug!("Sync already initialized; skipping fetch");
            return store.overlay().clone();
        }
        self.initialized = true;

        let remote = match &self.remote {
            Some(remote) => match remote.fetch_snapshot().await {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    deck_warn!("Server snapshot unavailable, using local actions only: {}", err);
                    None
                }
            },
            None => None,
        };

        let (persisted, writable) = match store.load_local() {
            Ok(overlay) => (overlay.unwrap_or_default(), true),
            Err(PersistenceError::Corrupt(err)) => {
                deck_warn!("Discarding unreadable local overlay: {}", err);
                (ActionOverlay::default(), true)
            }
            Err(err) => {
                deck_warn!("Local overlay unavailable, continuing in memory: {}", err);
                (ActionOverlay::default(), false)
            }
        };

        // Keep gestures made while startup was in flight.
        let local = merge(store.overlay(), &persisted);
        let merged = match &remote {
            Some(snapshot) => merge(&local, snapshot),
            None => local,
        };

        if !writable {
            store.hydrate_in_memory(merged.clone());
        } else if let Err(err) = store.hydrate(merged.clone()) {
            deck_error!("Failed to persist reconciled overlay: {}", err);
        }
        deck_info!(
            "Action sync complete: favorites={} archived={} hidden={} remote={}",
            merged.favorites.len(),
            merged.archived.len(),
            merged.hidden.len(),
            remote.is_some()
        );
        merged
    }
}
