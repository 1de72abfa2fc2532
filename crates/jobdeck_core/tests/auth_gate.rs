use std::cell::{Cell, RefCell};
use std::time::Instant;

use jobdeck_core::{
    ActionKind, ActionStore, AuthGate, AuthProvider, JobId, MemoryStorage, NullSink,
    OptimisticActionController, UndoKind, UndoPolicy,
};

#[derive(Default)]
struct FakeAuth {
    signed_in: bool,
    prompts: RefCell<Vec<String>>,
    redirects: Cell<usize>,
}

impl AuthProvider for FakeAuth {
    fn is_authenticated(&self) -> bool {
        self.signed_in
    }

    fn prompt_login(&self, feature: &str) {
        self.prompts.borrow_mut().push(feature.to_string());
    }

    fn redirect_to_login(&self) {
        self.redirects.set(self.redirects.get() + 1);
    }
}

#[test]
fn unauthenticated_hide_is_rejected_with_one_prompt() {
    let gate = AuthGate::new(FakeAuth::default());
    let mut store = ActionStore::new(MemoryStorage::new());
    let mut controller = OptimisticActionController::new(UndoPolicy::default(), NullSink);

    let ran = gate.guard(
        || {
            let _ = controller.apply_and_show_undo(
                &mut store,
                JobId::from(7),
                UndoKind::Hidden,
                Instant::now(),
            );
        },
        "hide jobs",
    );

    assert!(!ran);
    assert!(store.get(ActionKind::Hidden).is_empty());
    assert_eq!(store.overlay().version, 0);
    assert_eq!(controller.pending_count(), 0);
    assert_eq!(*gate.provider().prompts.borrow(), vec!["hide jobs".to_string()]);
}

#[test]
fn authenticated_action_runs_synchronously() {
    let gate = AuthGate::new(FakeAuth {
        signed_in: true,
        ..FakeAuth::default()
    });
    let mut store = ActionStore::new(MemoryStorage::new());

    let ran = gate.guard(
        || {
            let _ = store.toggle(ActionKind::Favorites, JobId::from(7));
        },
        "save favorites",
    );

    assert!(ran);
    assert!(store.contains(ActionKind::Favorites, &JobId::from(7)));
    assert!(gate.provider().prompts.borrow().is_empty());
}

#[test]
fn rejected_action_is_not_replayed_after_login() {
    let mut gate = AuthGate::new(FakeAuth::default());
    let calls = Cell::new(0);

    assert!(!gate.guard(|| calls.set(calls.get() + 1), "archive jobs"));
    gate.provider_mut().signed_in = true;

    assert_eq!(calls.get(), 0);
    assert!(gate.guard(|| calls.set(calls.get() + 1), "archive jobs"));
    assert_eq!(calls.get(), 1);
}

#[test]
fn guard_with_returns_action_result() {
    let gate = AuthGate::new(FakeAuth {
        signed_in: true,
        ..FakeAuth::default()
    });
    assert_eq!(gate.guard_with(|| 41 + 1, "count"), Some(42));

    let anonymous = AuthGate::new(FakeAuth::default());
    assert_eq!(anonymous.guard_with(|| 42, "count"), None);
    anonymous.redirect_to_login();
    assert_eq!(anonymous.provider().redirects.get(), 1);
}
