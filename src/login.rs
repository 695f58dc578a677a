//! Sign-in form with hard-coded demo accounts.
//!
//! This is a stand-in for a real identity provider: credentials are compared
//! in plain text against a fixed table and the role is whatever the store
//! says. It only routes users to the right landing page.

use std::fmt;

/// Role a signed-in user has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Candidate,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Candidate => "candidate",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "candidate" => Some(Role::Candidate),
            _ => None,
        }
    }

    /// Where this role lands after signing in.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => "/dashboard",
            Role::Candidate => "/job-list",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEMO_ACCOUNTS: [(&str, &str, Role); 2] = [
    ("admin", "password", Role::Admin),
    ("candidate", "password", Role::Candidate),
];

pub const LOGIN_SUCCESS: &str = "Login Successfully";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Where the current role is kept. Raw strings, since stored values may be stale or unknown.
pub trait RoleStore {
    fn role(&self) -> Option<String>;
    fn set_role(&mut self, role: Option<String>);
}

/// Page navigation.
pub trait Navigator {
    fn push(&mut self, path: &str);
    fn replace(&mut self, path: &str);
}

/// Toast-style notifications.
pub trait Notifier {
    fn success(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Role store kept in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryRoleStore {
    role: Option<String>,
}

impl RoleStore for MemoryRoleStore {
    fn role(&self) -> Option<String> {
        self.role.clone()
    }

    fn set_role(&mut self, role: Option<String>) {
        self.role = role;
    }
}

/// Extract the `role` value from a `Cookie` header string.
pub fn role_from_cookie(cookie: &str) -> Option<&str> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "role")
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Outcome of a submitted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn(Role),
    Rejected,
}

pub struct LoginForm<R, N, T> {
    roles: R,
    navigator: N,
    notifier: T,
}

impl<R: RoleStore, N: Navigator, T: Notifier> LoginForm<R, N, T> {
    pub fn new(roles: R, navigator: N, notifier: T) -> Self {
        Self {
            roles,
            navigator,
            notifier,
        }
    }

    /// Check the credentials against the demo accounts.
    pub fn submit(&mut self, username: &str, password: &str) -> LoginOutcome {
        let account = DEMO_ACCOUNTS
            .iter()
            .find(|(user, pass, _)| *user == username && *pass == password);

        match account {
            Some((_, _, role)) => {
                log::info!("Signed in as {}", role);
                self.roles.set_role(Some(role.as_str().to_string()));
                self.navigator.push(role.landing_path());
                self.notifier.success(LOGIN_SUCCESS);
                LoginOutcome::SignedIn(*role)
            }
            None => {
                log::debug!("Rejected sign-in for '{}'", username);
                self.notifier.error(INVALID_CREDENTIALS);
                LoginOutcome::Rejected
            }
        }
    }

    /// Pick up an existing role (from the store, else the cookie) and redirect.
    ///
    /// An unknown stored role is cleared and no navigation happens.
    pub fn restore(&mut self, cookie: Option<&str>) -> Option<Role> {
        if self.roles.role().is_none() {
            if let Some(role) = cookie.and_then(role_from_cookie) {
                self.roles.set_role(Some(role.to_string()));
            }
        }

        let stored = self.roles.role()?;
        match Role::parse(&stored) {
            Some(role) => {
                self.navigator.replace(role.landing_path());
                Some(role)
            }
            None => {
                log::warn!("Clearing unknown role '{}'", stored);
                self.roles.set_role(None);
                None
            }
        }
    }

    pub fn roles(&self) -> &R {
        &self.roles
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn notifier(&self) -> &T {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        pushed: Vec<String>,
        replaced: Vec<String>,
        successes: Vec<String>,
        errors: Vec<String>,
    }

    impl Navigator for Recorder {
        fn push(&mut self, path: &str) {
            self.pushed.push(path.to_string());
        }

        fn replace(&mut self, path: &str) {
            self.replaced.push(path.to_string());
        }
    }

    impl Notifier for Recorder {
        fn success(&mut self, message: &str) {
            self.successes.push(message.to_string());
        }

        fn error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    fn form() -> LoginForm<MemoryRoleStore, Recorder, Recorder> {
        LoginForm::new(
            MemoryRoleStore::default(),
            Recorder::default(),
            Recorder::default(),
        )
    }

    #[test]
    fn test_admin_goes_to_dashboard() {
        let mut form = form();
        assert_eq!(form.submit("admin", "password"), LoginOutcome::SignedIn(Role::Admin));
        assert_eq!(form.roles().role().as_deref(), Some("admin"));
        assert_eq!(form.navigator().pushed, vec!["/dashboard"]);
        assert_eq!(form.notifier().successes, vec![LOGIN_SUCCESS]);
    }

    #[test]
    fn test_candidate_goes_to_job_list() {
        let mut form = form();
        assert_eq!(
            form.submit("candidate", "password"),
            LoginOutcome::SignedIn(Role::Candidate)
        );
        assert_eq!(form.navigator().pushed, vec!["/job-list"]);
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let mut form = form();
        assert_eq!(form.submit("admin", "hunter2"), LoginOutcome::Rejected);
        assert!(form.roles().role().is_none());
        assert!(form.navigator().pushed.is_empty());
        assert_eq!(form.notifier().errors, vec![INVALID_CREDENTIALS]);
    }

    #[test]
    fn test_cookie_parsing() {
        assert_eq!(role_from_cookie("theme=dark; role=admin"), Some("admin"));
        assert_eq!(role_from_cookie("role=candidate"), Some("candidate"));
        assert_eq!(role_from_cookie("myrole=admin"), None);
        assert_eq!(role_from_cookie("role="), None);
    }

    #[test]
    fn test_restore_from_cookie_redirects() {
        let mut form = form();
        assert_eq!(form.restore(Some("role=candidate")), Some(Role::Candidate));
        assert_eq!(form.navigator().replaced, vec!["/job-list"]);
    }

    #[test]
    fn test_restore_clears_unknown_role() {
        let mut form = form();
        assert_eq!(form.restore(Some("role=superuser")), None);
        assert!(form.roles().role().is_none());
        assert!(form.navigator().replaced.is_empty());
    }

    #[test]
    fn test_restore_without_role_does_nothing() {
        let mut form = form();
        assert_eq!(form.restore(None), None);
        assert!(form.navigator().replaced.is_empty());
    }
}
