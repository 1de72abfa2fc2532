use jobdeck_core::{ActionKind, JobId, UndoKind};

/// What a job-card gesture does to the action sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Plain toggle, no undo affordance.
    Toggle(ActionKind),
    Undoable(UndoKind),
}

impl Gesture {
    /// Feature name shown in the login prompt.
    pub fn feature(self) -> &'static str {
        match self {
            Gesture::Toggle(ActionKind::Favorites) | Gesture::Undoable(UndoKind::Unfavorited) => {
                "save favorite jobs"
            }
            Gesture::Toggle(ActionKind::Archived) | Gesture::Undoable(UndoKind::Unarchived) => {
                "archive jobs"
            }
            Gesture::Toggle(ActionKind::Hidden) | Gesture::Undoable(UndoKind::Hidden) => {
                "hide jobs"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Gesture { job_id: JobId, gesture: Gesture },
    Undo(JobId),
    Dismiss(JobId),
    List,
    /// Without a token the user is sent to the identity provider.
    Login(Option<String>),
    Logout,
    Help,
    /// Periodic sweep of expired undo windows.
    Tick,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "commands: fav <id> | archive <id> | hide <id> | unfavorite <id> | \
unarchive <id> | undo <id> | dismiss <id> | list | login [token] | logout | help | quit";

/// Parses one line of user input.
pub fn parse_command(line: &str) -> Msg {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Msg::Invalid(String::new());
    };
    let arg = words.next();
    if words.next().is_some() {
        return Msg::Invalid(line.trim().to_string());
    }

    let gesture = |gesture: Gesture| {
        with_job(verb, arg, |job_id| Msg::Gesture { job_id, gesture })
    };

    match (verb.to_ascii_lowercase().as_str(), arg) {
        ("fav" | "favorite", _) => gesture(Gesture::Toggle(ActionKind::Favorites)),
        ("archive", _) => gesture(Gesture::Toggle(ActionKind::Archived)),
        ("hide", _) => gesture(Gesture::Undoable(UndoKind::Hidden)),
        ("unfavorite" | "unfav", _) => gesture(Gesture::Undoable(UndoKind::Unfavorited)),
        ("unarchive", _) => gesture(Gesture::Undoable(UndoKind::Unarchived)),
        ("undo", _) => with_job(verb, arg, Msg::Undo),
        ("dismiss", _) => with_job(verb, arg, Msg::Dismiss),
        ("login", token) => Msg::Login(token.map(ToOwned::to_owned)),
        ("list" | "ls", None) => Msg::List,
        ("logout", None) => Msg::Logout,
        ("help" | "?", None) => Msg::Help,
        ("quit" | "exit", None) => Msg::Quit,
        _ => Msg::Invalid(line.trim().to_string()),
    }
}

fn with_job(verb: &str, arg: Option<&str>, build: impl FnOnce(JobId) -> Msg) -> Msg {
    match arg {
        Some(raw) => build(JobId::from(raw)),
        None => Msg::Invalid(format!("{verb} needs a job id")),
    }
}
