use jobdeck_core::{AuthProvider, Notification, NotificationKind, NotificationSink};
use jobdeck_logging::deck_info;

/// Prints notifications as terminal lines.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        println!("{}", render_notification(&notification));
    }
}

fn render_notification(notification: &Notification) -> String {
    let job = notification
        .job_id
        .as_ref()
        .map(|id| format!(" [job {id}]"))
        .unwrap_or_default();
    match notification.kind {
        NotificationKind::Undoable(_) => {
            let window = match notification.duration_ms {
                Some(ms) => format!("within {:.1}s", ms as f64 / 1000.0),
                None => "until dismissed".to_string(),
            };
            let undo_hint = notification
                .job_id
                .as_ref()
                .map(|id| format!(" (undo {id} {window})"))
                .unwrap_or_default();
            format!("{}{job}{undo_hint}", notification.message)
        }
        NotificationKind::Info => format!("{}{job}", notification.message),
        NotificationKind::Error => format!("error: {}{job}", notification.message),
    }
}

/// Session identity backed by the token the identity provider handed out.
pub struct SessionAuth {
    token: Option<String>,
    login_url: String,
}

impl SessionAuth {
    pub fn new(token: Option<String>, login_url: impl Into<String>) -> Self {
        Self {
            token,
            login_url: login_url.into(),
        }
    }

    pub fn sign_in(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn sign_out(&mut self) {
        self.token = None;
    }
}

impl AuthProvider for SessionAuth {
    fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    fn prompt_login(&self, feature: &str) {
        println!("Sign in to {feature}. Use `login <token>` and try again.");
    }

    fn redirect_to_login(&self) {
        deck_info!("Redirecting to login at {}", self.login_url);
        println!("Open {} to sign in.", self.login_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdeck_core::{JobId, UndoKind};

    #[test]
    fn undoable_notification_mentions_undo_command() {
        let line = render_notification(&Notification {
            message: "Job hidden".to_string(),
            kind: NotificationKind::Undoable(UndoKind::Hidden),
            job_id: Some(JobId::from(9)),
            duration_ms: Some(5_000),
        });
        assert_eq!(line, "Job hidden [job 9] (undo 9 within 5.0s)");
    }

    #[test]
    fn empty_token_is_not_signed_in() {
        let mut auth = SessionAuth::new(Some(String::new()), "https://example.com/login");
        assert!(!auth.is_authenticated());
        auth.sign_in("abc".to_string());
        assert!(auth.is_authenticated());
        auth.sign_out();
        assert!(!auth.is_authenticated());
    }
}
