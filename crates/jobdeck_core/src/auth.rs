use jobdeck_logging::deck_info;

/// Identity boundary. Token issuance lives elsewhere.
pub trait AuthProvider {
    fn is_authenticated(&self) -> bool;
    /// Shows a login dialog explaining that `feature` needs an account.
    fn prompt_login(&self, feature: &str);
    fn redirect_to_login(&self);
}

/// Runs actions only for authenticated users.
///
/// Rejected actions are dropped, not queued: after logging in the user
/// repeats the gesture.
pub struct AuthGate<P> {
    provider: P,
}

impl<P: AuthProvider> AuthGate<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Invokes `action` and returns `true` when authenticated; otherwise
    /// prompts for login with `feature` and returns `false`.
    pub fn guard(&self, action: impl FnOnce(), feature: &str) -> bool {
        self.guard_with(action, feature).is_some()
    }

    /// Like [`AuthGate::guard`] but hands back the action's result.
    pub fn guard_with<T>(&self, action: impl FnOnce() -> T, feature: &str) -> Option<T> {
        if self.provider.is_authenticated() {
            return Some(action());
        }
        deck_info!("Login required for {}", feature);
        self.provider.prompt_login(feature);
        None
    }

    pub fn redirect_to_login(&self) {
        self.provider.redirect_to_login();
    }
}
