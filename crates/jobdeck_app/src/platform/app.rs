use std::io::{self, BufRead};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use jobdeck_core::{
    ActionStore, AuthGate, DeckView, Disposition, JobId, MemoryStorage, OptimisticActionController,
    StorageAdapter,
};
use jobdeck_engine::{FileStorage, ReqwestRemote, SyncCoordinator};
use jobdeck_logging::{deck_error, deck_info, deck_warn};

use super::adapters::{SessionAuth, TerminalNotifier};
use super::commands::{parse_command, Gesture, Msg, HELP};
use super::config::{AppConfig, CONFIG_FILENAME};
use super::logging;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

pub fn run_app() -> anyhow::Result<()> {
    let (config, config_error) = match AppConfig::load(Path::new(CONFIG_FILENAME)) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::initialize(&config.log);
    if let Some(err) = config_error {
        deck_warn!("Using default configuration: {:#}", err);
    }

    let storage: Box<dyn StorageAdapter> = match &config.state_dir {
        Some(dir) => Box::new(FileStorage::new(dir)),
        None => Box::new(MemoryStorage::new()),
    };
    let mut store = ActionStore::new(storage);

    let mut coordinator = match &config.server_url {
        Some(url) => {
            let mut remote = ReqwestRemote::new(url, config.fetch_settings());
            if let Some(token) = &config.auth_token {
                remote = remote.with_bearer_token(token);
            }
            SyncCoordinator::new(remote)
        }
        None => SyncCoordinator::<ReqwestRemote>::local_only(),
    };

    let runtime = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
    let overlay = runtime.block_on(coordinator.initialize(&mut store));
    drop(runtime);

    let mut app = App::new(
        store,
        OptimisticActionController::new(config.undo_policy(), TerminalNotifier),
        AuthGate::new(SessionAuth::new(config.auth_token.clone(), &config.login_url)),
    );
    app.remember(overlay.favorites.iter().chain(&overlay.archived).chain(&overlay.hidden));

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    spawn_input_reader(msg_tx.clone());
    // Background tick that sweeps expired undo windows.
    thread::spawn(move || {
        while msg_tx.send(Msg::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    println!("{HELP}");
    while let Ok(msg) = msg_rx.recv() {
        if !app.dispatch(msg, Instant::now()) {
            break;
        }
    }
    app.shutdown();
    Ok(())
}

fn spawn_input_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let msg = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => parse_command(&line),
                Err(err) => {
                    deck_error!("Failed to read input: {}", err);
                    break;
                }
            };
            if msg_tx.send(msg).is_err() {
                return;
            }
        }
        let _ = msg_tx.send(Msg::Quit);
    });
}

/// Owns the store, controller and gate for one session; all mutations run
/// on the dispatch thread in arrival order.
pub(crate) struct App<S> {
    store: ActionStore<S>,
    controller: OptimisticActionController<TerminalNotifier>,
    gate: AuthGate<SessionAuth>,
    seen: Vec<JobId>,
}

impl<S: StorageAdapter> App<S> {
    pub(crate) fn new(
        store: ActionStore<S>,
        controller: OptimisticActionController<TerminalNotifier>,
        gate: AuthGate<SessionAuth>,
    ) -> Self {
        Self {
            store,
            controller,
            gate,
            seen: Vec::new(),
        }
    }

    fn remember<'a>(&mut self, jobs: impl IntoIterator<Item = &'a JobId>) {
        for job_id in jobs {
            if !self.seen.contains(job_id) {
                self.seen.push(job_id.clone());
            }
        }
    }

    /// Returns `false` once the session should end.
    pub(crate) fn dispatch(&mut self, msg: Msg, now: Instant) -> bool {
        match msg {
            Msg::Gesture { job_id, gesture } => {
                self.remember([&job_id]);
                self.apply_gesture(job_id, gesture, now);
            }
            Msg::Undo(job_id) => {
                if self.controller.undo(&mut self.store, &job_id, now).is_none() {
                    println!("Nothing to undo for job {job_id}");
                }
            }
            Msg::Dismiss(job_id) => {
                let _ = self.controller.dismiss(&job_id);
            }
            Msg::Tick => {
                let _ = self.controller.expire_due(now);
            }
            Msg::List => self.print_deck(now),
            Msg::Login(Some(token)) => {
                self.gate.provider_mut().sign_in(token);
                println!("Signed in.");
            }
            Msg::Login(None) => self.gate.redirect_to_login(),
            Msg::Logout => {
                self.gate.provider_mut().sign_out();
                println!("Signed out.");
            }
            Msg::Help => println!("{HELP}"),
            Msg::Invalid(input) => println!("Unrecognized input `{input}`. {HELP}"),
            Msg::Quit => return false,
        }
        true
    }

    fn apply_gesture(&mut self, job_id: JobId, gesture: Gesture, now: Instant) {
        let store = &mut self.store;
        let controller = &mut self.controller;
        self.gate.guard(
            || match gesture {
                Gesture::Toggle(kind) => {
                    let toggle = store.toggle(kind, job_id.clone());
                    let verb = if toggle.member { "Added to" } else { "Removed from" };
                    println!("{verb} {kind} [job {job_id}]");
                    if let Err(err) = toggle.persisted {
                        println!("error: your change could not be saved on this device ({err})");
                    }
                }
                Gesture::Undoable(kind) => {
                    // persistence failures are already surfaced as notifications
                    let _ = controller.apply_and_show_undo(store, job_id, kind, now);
                }
            },
            gesture.feature(),
        );
    }

    fn print_deck(&self, now: Instant) {
        let view = DeckView::build(&self.store, &self.controller, &self.seen, now);
        println!(
            "favorites={} archived={} hidden={}",
            view.favorites, view.archived, view.hidden
        );
        for card in &view.cards {
            let star = if card.favorite { "*" } else { " " };
            let place = match card.disposition {
                Disposition::Active => "active",
                Disposition::Archived => "archived",
                Disposition::Hidden => "hidden",
            };
            let undo = card
                .undo
                .map(|kind| format!("  undo: {}", kind.message()))
                .unwrap_or_default();
            println!("{star} {:<12} {place}{undo}", card.job_id.as_str());
        }
    }

    /// Navigating away commits every pending undo and flushes the store.
    pub(crate) fn shutdown(&mut self) {
        let committed = self.controller.commit_all();
        if let Err(err) = self.store.flush() {
            deck_error!("Final flush failed: {}", err);
        }
        deck_info!("Session closed; committed {} pending actions", committed.len());
    }

    #[cfg(test)]
    fn store(&self) -> &ActionStore<S> {
        &self.store
    }
}
