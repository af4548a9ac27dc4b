//! View state owned by the controller

use std::fmt;

use crate::domain::{ActionPlan, Session};

/// The screen currently shown; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Landing,
    Login,
    Pricing,
    Dashboard,
    Processing,
    Result,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Landing => "landing",
            Screen::Login => "login",
            Screen::Pricing => "pricing",
            Screen::Dashboard => "dashboard",
            Screen::Processing => "processing",
            Screen::Result => "result",
        };
        write!(f, "{}", name)
    }
}

/// Everything the controller knows
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Active screen
    pub screen: Screen,
    /// Cached copy of the provider's session
    pub session: Option<Session>,
    /// Last generated plan
    pub plan: Option<ActionPlan>,
    /// Last generation failure, shown on the dashboard
    pub error: Option<String>,
    /// Last auth failure, shown on the login screen
    pub auth_error: Option<String>,
    /// Informational message for the login screen
    pub notice: Option<String>,
    /// An auth call (sign-in, sign-up, OAuth start or sign-out) is in flight
    pub auth_pending: bool,
    /// Startup has finished
    pub initialized: bool,
    /// Incremented on every transition out of Processing
    pub epoch: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Email of the signed-in user, for the header
    pub fn email(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.email.as_str())
    }
}

/// Handle for one in-flight generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    /// Controller epoch when the generation started
    pub epoch: u64,
    /// URL exactly as submitted
    pub board_url: String,
}
