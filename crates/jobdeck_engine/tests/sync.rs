use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use jobdeck_core::{
    ActionKind, ActionOverlay, ActionStore, JobId, MemoryStorage, PersistenceError, StorageAdapter,
};
use jobdeck_engine::{
    FailureKind, FetchError, FetchSettings, FileStorage, RemoteActions, ReqwestRemote,
    SyncCoordinator, OVERLAY_FILENAME,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jobdeck_logging::initialize_for_tests);
}

fn overlay(favorites: &[u64], archived: &[u64], hidden: &[u64]) -> ActionOverlay {
    ActionOverlay {
        favorites: favorites.iter().copied().collect(),
        archived: archived.iter().copied().collect(),
        hidden: hidden.iter().copied().collect(),
        ..ActionOverlay::default()
    }
}

struct StaticRemote {
    snapshot: Result<ActionOverlay, FetchError>,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl RemoteActions for StaticRemote {
    async fn fetch_snapshot(&self) -> Result<ActionOverlay, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone()
    }
}

#[tokio::test]
async fn merges_local_and_server_then_persists() {
    init_logging();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Ok(overlay(&[3], &[2], &[])),
        calls: calls.clone(),
    });
    let mut store = ActionStore::new(MemoryStorage::with_overlay(overlay(&[1], &[], &[2])));

    let merged = coordinator.initialize(&mut store).await;

    assert_eq!(merged, overlay(&[1, 3], &[], &[2]));
    assert_eq!(store.overlay(), &merged);
    assert_eq!(store.storage().saved(), Some(&merged));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_initialize_does_not_fetch_again() {
    init_logging();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Ok(overlay(&[3], &[], &[4])),
        calls: calls.clone(),
    });
    let mut store = ActionStore::new(MemoryStorage::new());

    let first = coordinator.initialize(&mut store).await;
    let second = coordinator.initialize(&mut store).await;

    assert_eq!(first, second);
    assert!(coordinator.is_initialized());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.storage().save_count(), 1);
}

#[tokio::test]
async fn fetch_failure_falls_back_to_local_overlay() {
    init_logging();
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Err(FetchError {
            kind: FailureKind::Network,
            message: "connection refused".into(),
        }),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let local = overlay(&[1], &[5], &[]);
    let mut store = ActionStore::new(MemoryStorage::with_overlay(local.clone()));

    let merged = coordinator.initialize(&mut store).await;
    assert_eq!(merged, local);
}

#[tokio::test]
async fn first_run_adopts_server_snapshot() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Ok(overlay(&[8], &[9], &[])),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut store = ActionStore::new(FileStorage::new(temp.path()));

    let merged = coordinator.initialize(&mut store).await;
    assert_eq!(merged, overlay(&[8], &[9], &[]));
    assert!(temp.path().join(OVERLAY_FILENAME).exists());
}

#[tokio::test]
async fn corrupt_local_file_is_replaced_by_server_state() {
    init_logging();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(OVERLAY_FILENAME), "not json").unwrap();
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Ok(overlay(&[4], &[], &[])),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut store = ActionStore::new(FileStorage::new(temp.path()));

    let merged = coordinator.initialize(&mut store).await;
    assert_eq!(merged, overlay(&[4], &[], &[]));

    let reread = ActionStore::new(FileStorage::new(temp.path()))
        .load_local()
        .unwrap()
        .expect("rewritten overlay");
    assert_eq!(reread, merged);
}

#[tokio::test]
async fn gestures_during_startup_survive_reconciliation() {
    init_logging();
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Ok(overlay(&[], &[], &[6])),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut store = ActionStore::new(MemoryStorage::new());
    let _ = store.toggle(ActionKind::Favorites, JobId::from(6));
    let _ = store.toggle(ActionKind::Archived, JobId::from(7));

    let merged = coordinator.initialize(&mut store).await;
    assert_eq!(merged, overlay(&[6], &[7], &[6]));
}

/// Storage whose reads fail and whose writes are only counted.
struct UnreadableStorage {
    saves: Arc<AtomicUsize>,
}

impl StorageAdapter for UnreadableStorage {
    fn load(&self) -> Result<Option<ActionOverlay>, PersistenceError> {
        Err(PersistenceError::Unavailable("disk offline".into()))
    }

    fn save(&mut self, _overlay: &ActionOverlay) -> Result<(), PersistenceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn unreadable_local_overlay_is_never_overwritten() {
    init_logging();
    let saves = Arc::new(AtomicUsize::new(0));
    let mut coordinator = SyncCoordinator::new(StaticRemote {
        snapshot: Ok(overlay(&[3], &[], &[])),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut store = ActionStore::new(UnreadableStorage {
        saves: saves.clone(),
    });

    let merged = coordinator.initialize(&mut store).await;
    assert_eq!(merged, overlay(&[3], &[], &[]));
    assert_eq!(store.overlay(), &merged);
    assert!(store.is_memory_only());
    assert_eq!(saves.load(Ordering::SeqCst), 0);

    // later gestures stay in memory for the rest of the session
    let toggle = store.toggle(ActionKind::Hidden, JobId::from(4));
    assert!(toggle.persisted.is_ok());
    assert!(store.contains(ActionKind::Hidden, &JobId::from(4)));
    assert_eq!(saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn local_only_coordinator_keeps_local_state() {
    init_logging();
    let mut coordinator: SyncCoordinator<ReqwestRemote> = SyncCoordinator::local_only();
    let mut store = ActionStore::new(MemoryStorage::with_overlay(overlay(&[1], &[], &[])));

    let merged = coordinator.initialize(&mut store).await;
    assert_eq!(merged, overlay(&[1], &[], &[]));
}

#[tokio::test]
async fn reqwest_remote_is_fetched_exactly_once() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"favorites":[3],"archived":[2]}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let remote = ReqwestRemote::new(server.uri(), FetchSettings::default());
    let mut coordinator = SyncCoordinator::new(remote);
    let mut store = ActionStore::new(MemoryStorage::with_overlay(overlay(&[1], &[], &[2])));

    let merged = coordinator.initialize(&mut store).await;
    let again = coordinator.initialize(&mut store).await;

    assert_eq!(merged, overlay(&[1, 3], &[], &[2]));
    assert_eq!(again, merged);
    server.verify().await;
}
