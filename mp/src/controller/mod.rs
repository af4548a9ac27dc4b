//! View State Controller
//!
//! Single source of truth for which screen is visible. The controller owns
//! an explicit [`AppState`], reacts to user actions and to session changes
//! reported by the auth provider, and sequences plan generation.
//!
//! Generation is split in two so a front end can run the service call off
//! its event loop:
//!
//! 1. [`Controller::begin_generation`] moves Dashboard -> Processing and
//!    hands out a [`GenerationTicket`]
//! 2. [`Controller::complete_generation`] applies the outcome, unless the
//!    ticket is stale
//!
//! Every transition out of Processing bumps the epoch, so a result that
//! arrives after the user logged out (or was otherwise moved away) is
//! dropped instead of overwriting newer state.
//!
//! Auth calls follow the same begin/complete split (`begin_auth` then
//! `complete_sign_in`, `complete_sign_up` or `complete_oauth`;
//! `begin_logout` then `complete_logout`). Only one auth call is in flight
//! at a time. The async `sign_in`, `sign_up`, `sign_in_with_oauth` and
//! `logout` wrap both halves for callers that can simply await.

mod state;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use state::{AppState, GenerationTicket, Screen};

use crate::auth::{AuthError, AuthProvider, SessionChange, SessionSubscription};
use crate::domain::{ActionPlan, Session};
use crate::planner::{PlanError, PlanGenerator};

/// Shown on the dashboard for any generation failure
pub const GENERATION_ERROR_MESSAGE: &str = "Oops! Something went wrong with the AI analysis. Try a public board link.";

/// Shown after a sign-up that needs email confirmation
pub const CONFIRM_EMAIL_NOTICE: &str = "Check your email for the confirmation link!";

/// Orchestrates screens, auth and generation
pub struct Controller {
    state: AppState,
    auth: Arc<dyn AuthProvider>,
    planner: PlanGenerator,
}

impl Controller {
    pub fn new(auth: Arc<dyn AuthProvider>, planner: PlanGenerator) -> Self {
        debug!(provider = auth.name(), "Controller::new: called");
        Self {
            state: AppState::new(),
            auth,
            planner,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        self.state.screen
    }

    /// Name of the auth provider in use
    pub fn auth_provider(&self) -> &'static str {
        self.auth.name()
    }

    /// Auth provider, cloned into background tasks
    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        Arc::clone(&self.auth)
    }

    /// Planner used for generation, cloned into background tasks
    pub fn planner(&self) -> &PlanGenerator {
        &self.planner
    }

    fn set_screen(&mut self, screen: Screen) {
        let from = self.state.screen;
        if from == Screen::Processing && screen != Screen::Processing {
            self.state.epoch += 1;
            debug!(epoch = self.state.epoch, "Controller::set_screen: left processing, epoch bumped");
        }
        if from != screen {
            info!(%from, to = %screen, "Screen transition");
        }
        self.state.screen = screen;
    }

    /// Subscribe to session changes, then look for an existing session
    ///
    /// Runs once. A failing provider is treated as "no session".
    pub async fn startup(&mut self) -> SessionSubscription {
        debug!("Controller::startup: called");
        let subscription = self.auth.subscribe();

        match self.auth.current_session().await {
            Ok(Some(session)) => {
                info!(user_id = %session.user_id, "Resumed existing session");
                self.state.session = Some(session);
                self.set_screen(Screen::Dashboard);
            }
            Ok(None) => debug!("Controller::startup: no existing session"),
            Err(e) => warn!(error = %e, "Session lookup failed, continuing signed out"),
        }

        self.state.initialized = true;
        subscription
    }

    /// Apply one notification from the auth provider
    pub fn apply_session_change(&mut self, change: SessionChange) {
        debug!(?change, "Controller::apply_session_change: called");
        match change {
            SessionChange::SignedIn(session) => {
                self.state.session = Some(session);
                self.state.auth_error = None;
                self.state.notice = None;
                self.set_screen(Screen::Dashboard);
            }
            SessionChange::SignedOut => {
                self.clear_signed_in_state();
                self.set_screen(Screen::Landing);
            }
            SessionChange::Failed(message) => {
                if self.state.screen == Screen::Login {
                    self.state.auth_error = Some(message);
                    self.state.notice = None;
                } else {
                    debug!(%message, screen = %self.state.screen, "Controller::apply_session_change: sign-in failure off login, ignored");
                }
            }
        }
    }

    /// Apply every pending notification; returns how many were applied
    pub fn pump_session_changes(&mut self, subscription: &mut SessionSubscription) -> usize {
        let mut applied = 0;
        while let Some(change) = subscription.try_recv() {
            self.apply_session_change(change);
            applied += 1;
        }
        applied
    }

    fn clear_signed_in_state(&mut self) {
        self.state.session = None;
        self.state.plan = None;
        self.state.error = None;
    }

    fn clear_login_messages(&mut self) {
        self.state.auth_error = None;
        self.state.notice = None;
    }

    /// Landing/Pricing -> Login
    pub fn request_sign_in(&mut self) -> bool {
        debug!(screen = %self.state.screen, "Controller::request_sign_in: called");
        match self.state.screen {
            Screen::Landing | Screen::Pricing => {
                self.clear_login_messages();
                self.set_screen(Screen::Login);
                true
            }
            _ => false,
        }
    }

    /// Landing -> Pricing
    pub fn request_pricing(&mut self) -> bool {
        debug!(screen = %self.state.screen, "Controller::request_pricing: called");
        if self.state.screen != Screen::Landing {
            return false;
        }
        self.set_screen(Screen::Pricing);
        true
    }

    /// Login/Pricing -> Landing
    pub fn back(&mut self) -> bool {
        debug!(screen = %self.state.screen, "Controller::back: called");
        match self.state.screen {
            Screen::Login | Screen::Pricing => {
                self.clear_login_messages();
                self.set_screen(Screen::Landing);
                true
            }
            _ => false,
        }
    }

    /// Show an auth failure on the login form
    fn report_auth_error(&mut self, what: &str, e: &AuthError) {
        warn!(error = %e, "{} failed", what);
        if self.state.screen == Screen::Login {
            self.state.auth_error = Some(e.user_message());
        }
    }

    /// Start an auth call from the login screen
    ///
    /// Returns false when not on Login or while another auth call is in
    /// flight.
    pub fn begin_auth(&mut self) -> bool {
        debug!(screen = %self.state.screen, pending = self.state.auth_pending, "Controller::begin_auth: called");
        if self.state.screen != Screen::Login || self.state.auth_pending {
            return false;
        }
        self.clear_login_messages();
        self.state.auth_pending = true;
        true
    }

    /// Apply the result of an email/password sign-in
    pub fn complete_sign_in(&mut self, result: Result<Session, AuthError>) -> bool {
        debug!(ok = result.is_ok(), "Controller::complete_sign_in: called");
        self.state.auth_pending = false;
        match result {
            Ok(session) => {
                self.state.session = Some(session);
                self.set_screen(Screen::Dashboard);
                true
            }
            Err(e) => {
                self.report_auth_error("Sign-in", &e);
                false
            }
        }
    }

    /// Apply the result of a sign-up
    pub fn complete_sign_up(&mut self, result: Result<Option<Session>, AuthError>) -> bool {
        debug!(ok = result.is_ok(), "Controller::complete_sign_up: called");
        self.state.auth_pending = false;
        match result {
            Ok(Some(session)) => {
                self.state.session = Some(session);
                self.set_screen(Screen::Dashboard);
                true
            }
            Ok(None) => {
                if self.state.screen == Screen::Login {
                    self.state.notice = Some(CONFIRM_EMAIL_NOTICE.to_string());
                }
                false
            }
            Err(e) => {
                self.report_auth_error("Sign-up", &e);
                false
            }
        }
    }

    /// Apply the result of starting an OAuth sign-in
    ///
    /// The session itself arrives later as a notification. Returns the
    /// authorization URL when the user has to open one.
    pub fn complete_oauth(&mut self, result: Result<Option<String>, AuthError>) -> Option<String> {
        debug!(ok = result.is_ok(), "Controller::complete_oauth: called");
        self.state.auth_pending = false;
        match result {
            Ok(Some(url)) => {
                if self.state.screen == Screen::Login {
                    self.state.notice = Some(format!("Open this link in your browser to continue: {}", url));
                }
                Some(url)
            }
            Ok(None) => None,
            Err(e) => {
                self.report_auth_error("OAuth sign-in", &e);
                None
            }
        }
    }

    /// Submit email and password on the login screen
    pub async fn sign_in(&mut self, email: &str, password: &str) -> bool {
        debug!(%email, "Controller::sign_in: called");
        if !self.begin_auth() {
            return false;
        }
        let result = self.auth.sign_in_with_password(email, password).await;
        self.complete_sign_in(result)
    }

    /// Create an account from the login screen
    pub async fn sign_up(&mut self, email: &str, password: &str) -> bool {
        debug!(%email, "Controller::sign_up: called");
        if !self.begin_auth() {
            return false;
        }
        let result = self.auth.sign_up(email, password).await;
        self.complete_sign_up(result)
    }

    /// Start an OAuth sign-in
    pub async fn sign_in_with_oauth(&mut self, provider: &str) -> Option<String> {
        debug!(%provider, "Controller::sign_in_with_oauth: called");
        if !self.begin_auth() {
            return None;
        }
        let result = self.auth.sign_in_with_oauth(provider).await;
        self.complete_oauth(result)
    }

    /// Clear the local session and go to Landing
    ///
    /// The provider sign-out runs afterwards; further auth calls wait for
    /// `complete_logout`. Returns false when nobody is signed in.
    pub fn begin_logout(&mut self) -> bool {
        debug!(screen = %self.state.screen, "Controller::begin_logout: called");
        if !self.state.is_signed_in() {
            return false;
        }
        self.clear_signed_in_state();
        self.state.auth_pending = true;
        self.set_screen(Screen::Landing);
        true
    }

    /// Apply the provider's sign-out result
    ///
    /// Local state is already cleared, a failure is only logged.
    pub fn complete_logout(&mut self, result: Result<(), AuthError>) {
        debug!(ok = result.is_ok(), "Controller::complete_logout: called");
        self.state.auth_pending = false;
        if let Err(e) = result {
            warn!(error = %e, "Provider sign-out failed, local session already cleared");
        }
    }

    /// Sign out from any authenticated state
    pub async fn logout(&mut self) -> bool {
        if !self.begin_logout() {
            return false;
        }
        let result = self.auth.sign_out().await;
        self.complete_logout(result);
        true
    }

    /// Dashboard -> Processing for a non-empty URL
    ///
    /// Returns `None` (and changes nothing) for an empty URL or when not on
    /// the dashboard, which also rejects a second submission while one is
    /// in flight.
    pub fn begin_generation(&mut self, board_url: &str) -> Option<GenerationTicket> {
        debug!(%board_url, screen = %self.state.screen, "Controller::begin_generation: called");
        if self.state.screen != Screen::Dashboard {
            debug!("Controller::begin_generation: rejected, not on dashboard");
            return None;
        }
        if board_url.trim().is_empty() {
            debug!("Controller::begin_generation: rejected, empty URL");
            return None;
        }

        self.state.error = None;
        self.set_screen(Screen::Processing);
        Some(GenerationTicket {
            epoch: self.state.epoch,
            board_url: board_url.to_string(),
        })
    }

    /// Apply a generation outcome
    ///
    /// Returns false when the result is stale and was dropped.
    pub fn complete_generation(&mut self, epoch: u64, result: Result<ActionPlan, PlanError>) -> bool {
        debug!(epoch, current = self.state.epoch, ok = result.is_ok(), "Controller::complete_generation: called");
        if epoch != self.state.epoch || self.state.screen != Screen::Processing {
            info!(epoch, current = self.state.epoch, "Dropping stale generation result");
            return false;
        }

        match result {
            Ok(plan) => {
                self.state.plan = Some(plan);
                self.set_screen(Screen::Result);
            }
            Err(e) => {
                let (retryable, retry_after) = match &e {
                    PlanError::Service(inner) => (inner.is_retryable(), inner.retry_after()),
                    _ => (false, None),
                };
                warn!(error = %e, retryable, ?retry_after, "Plan generation failed");
                self.state.error = Some(GENERATION_ERROR_MESSAGE.to_string());
                self.set_screen(Screen::Dashboard);
            }
        }
        true
    }

    /// Begin, call the planner and complete in one step
    pub async fn submit_board_url(&mut self, board_url: &str) -> bool {
        let Some(ticket) = self.begin_generation(board_url) else {
            return false;
        };
        let result = self.planner.generate(&ticket.board_url).await;
        self.complete_generation(ticket.epoch, result)
    }

    /// Result -> Dashboard, discarding the plan
    pub fn new_plan(&mut self) -> bool {
        debug!(screen = %self.state.screen, "Controller::new_plan: called");
        if self.state.screen != Screen::Result {
            return false;
        }
        self.state.plan = None;
        self.state.error = None;
        self.set_screen(Screen::Dashboard);
        true
    }

    /// Hide the dashboard error banner
    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use std::time::Duration;

    use crate::auth::{LocalAuthProvider, SessionBroadcaster};
    use crate::llm::LlmError;
    use crate::llm::client::mock::MockLlmClient;

    const GET_FIT: &str = r#"{"goal":"Get Fit","weeklyPlan":[{"day":"Mon","actions":["Walk 20 min"]}],"firstSteps":["Buy shoes"],"suggestedHabits":["Daily walk"]}"#;

    fn controller(texts: &[&str]) -> (Controller, Arc<MockLlmClient>, Arc<LocalAuthProvider>) {
        let llm = Arc::new(MockLlmClient::with_texts(texts));
        let auth = Arc::new(LocalAuthProvider::new());
        let controller = Controller::new(auth.clone(), PlanGenerator::new(llm.clone()));
        (controller, llm, auth)
    }

    async fn signed_in(texts: &[&str]) -> (Controller, Arc<MockLlmClient>) {
        let (mut controller, llm, _) = controller(texts);
        controller.apply_session_change(SessionChange::SignedIn(Session::local("me@example.com")));
        assert_eq!(controller.screen(), Screen::Dashboard);
        (controller, llm)
    }

    /// Provider whose every call fails
    struct BrokenAuth {
        events: SessionBroadcaster,
    }

    #[async_trait]
    impl AuthProvider for BrokenAuth {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn current_session(&self) -> Result<Option<Session>, AuthError> {
            Err(AuthError::OAuth("unreachable".to_string()))
        }
        async fn sign_up(&self, _: &str, _: &str) -> Result<Option<Session>, AuthError> {
            Err(AuthError::InvalidCredentials("nope".to_string()))
        }
        async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<Session, AuthError> {
            Err(AuthError::InvalidCredentials("Invalid login credentials".to_string()))
        }
        async fn sign_in_with_oauth(&self, _: &str) -> Result<Option<String>, AuthError> {
            Err(AuthError::OAuth("provider disabled".to_string()))
        }
        async fn sign_out(&self) -> Result<(), AuthError> {
            Err(AuthError::Rejected {
                status: 503,
                message: "down".to_string(),
            })
        }
        fn subscribe(&self) -> SessionSubscription {
            self.events.subscribe()
        }
    }

    fn broken_controller() -> Controller {
        let auth = Arc::new(BrokenAuth {
            events: SessionBroadcaster::new("broken"),
        });
        Controller::new(auth, PlanGenerator::new(Arc::new(MockLlmClient::with_texts(&[]))))
    }

    #[tokio::test]
    async fn test_startup_without_session_stays_on_landing() {
        let (mut controller, _, _) = controller(&[]);
        let _sub = controller.startup().await;
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(controller.state().initialized);
        assert!(!controller.state().is_signed_in());
    }

    #[tokio::test]
    async fn test_startup_with_session_goes_to_dashboard() {
        let llm = Arc::new(MockLlmClient::with_texts(&[]));
        let auth = Arc::new(LocalAuthProvider::with_session(Session::local("me@example.com")));
        let mut controller = Controller::new(auth, PlanGenerator::new(llm));

        let _sub = controller.startup().await;
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert_eq!(controller.state().email(), Some("me@example.com"));
        assert!(controller.state().initialized);
    }

    #[tokio::test]
    async fn test_startup_failure_is_no_session() {
        let mut controller = broken_controller();
        let _sub = controller.startup().await;
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(controller.state().initialized);
    }

    #[tokio::test]
    async fn test_subscription_sees_changes_after_startup() {
        let (mut controller, _, auth) = controller(&[]);
        let mut sub = controller.startup().await;

        auth.sign_in_with_oauth("google").await.unwrap();
        assert_eq!(controller.pump_session_changes(&mut sub), 1);
        assert_eq!(controller.screen(), Screen::Dashboard);

        auth.sign_out().await.unwrap();
        assert_eq!(controller.pump_session_changes(&mut sub), 1);
        assert_eq!(controller.screen(), Screen::Landing);
        sub.unsubscribe();
    }

    #[test]
    fn test_navigation() {
        let (mut controller, _, _) = controller(&[]);
        assert!(controller.request_pricing());
        assert_eq!(controller.screen(), Screen::Pricing);
        assert!(controller.request_sign_in());
        assert_eq!(controller.screen(), Screen::Login);
        assert!(!controller.request_pricing());
        assert!(controller.back());
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(!controller.back());
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let (mut controller, _, _) = controller(&[]);
        controller.request_sign_in();
        assert!(controller.sign_in("me@example.com", "secret").await);
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert_eq!(controller.state().email(), Some("me@example.com"));
    }

    #[tokio::test]
    async fn test_sign_in_failure_stays_on_login() {
        let mut controller = broken_controller();
        controller.request_sign_in();
        assert!(!controller.sign_in("me@example.com", "wrong").await);
        assert_eq!(controller.screen(), Screen::Login);
        assert_eq!(controller.state().auth_error.as_deref(), Some("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_oauth_failure_stays_on_login() {
        let mut controller = broken_controller();
        controller.request_sign_in();
        assert!(controller.sign_in_with_oauth("google").await.is_none());
        assert_eq!(controller.screen(), Screen::Login);
        assert!(controller.state().auth_error.is_some());
    }

    #[test]
    fn test_background_oauth_failure_shows_on_login() {
        let (mut controller, _, _) = controller(&[]);
        controller.request_sign_in();
        assert!(controller.begin_auth());
        controller.complete_oauth(Ok(Some("https://auth.example.com/authorize".to_string())));
        assert!(controller.state().notice.is_some());

        controller.apply_session_change(SessionChange::Failed("User cancelled".to_string()));
        assert_eq!(controller.screen(), Screen::Login);
        assert_eq!(controller.state().auth_error.as_deref(), Some("User cancelled"));
        assert!(controller.state().notice.is_none());
    }

    #[test]
    fn test_background_failure_ignored_off_login() {
        let (mut controller, _, _) = controller(&[]);
        controller.apply_session_change(SessionChange::SignedIn(Session::local("me@example.com")));
        controller.apply_session_change(SessionChange::Failed("User cancelled".to_string()));
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert!(controller.state().auth_error.is_none());
    }

    #[test]
    fn test_one_auth_call_in_flight() {
        let (mut controller, _, _) = controller(&[]);
        assert!(!controller.begin_auth());
        controller.request_sign_in();
        assert!(controller.begin_auth());
        assert!(controller.state().auth_pending);
        assert!(!controller.begin_auth());

        controller.complete_sign_in(Err(AuthError::InvalidCredentials("Invalid login credentials".to_string())));
        assert!(!controller.state().auth_pending);
        assert_eq!(controller.screen(), Screen::Login);
        assert!(controller.begin_auth());
    }

    #[test]
    fn test_sign_in_result_after_leaving_login() {
        let (mut controller, _, _) = controller(&[]);
        controller.request_sign_in();
        assert!(controller.begin_auth());
        controller.back();

        controller.complete_sign_in(Err(AuthError::InvalidCredentials("nope".to_string())));
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(controller.state().auth_error.is_none());
    }

    #[test]
    fn test_logout_blocks_auth_until_complete() {
        let (mut controller, _, _) = controller(&[]);
        controller.apply_session_change(SessionChange::SignedIn(Session::local("me@example.com")));
        assert!(controller.begin_logout());
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(!controller.state().is_signed_in());

        controller.request_sign_in();
        assert!(!controller.begin_auth());
        controller.complete_logout(Err(AuthError::Rejected {
            status: 503,
            message: "down".to_string(),
        }));
        assert!(controller.begin_auth());
    }

    #[test]
    fn test_rate_limited_failure_uses_generic_message() {
        let (mut controller, _, _) = controller(&[]);
        controller.apply_session_change(SessionChange::SignedIn(Session::local("me@example.com")));
        let ticket = controller.begin_generation("https://pinterest.com/u/a").unwrap();

        let err = PlanError::Service(LlmError::RateLimited {
            retry_after: Duration::from_secs(30),
        });
        assert!(controller.complete_generation(ticket.epoch, Err(err)));
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert_eq!(controller.state().error.as_deref(), Some(GENERATION_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_sign_in_ignored_off_login() {
        let (mut controller, _, _) = controller(&[]);
        assert!(!controller.sign_in("me@example.com", "secret").await);
        assert_eq!(controller.screen(), Screen::Landing);
    }

    #[tokio::test]
    async fn test_generation_success() {
        let (mut controller, llm) = signed_in(&[GET_FIT]).await;
        assert!(controller.submit_board_url("https://pinterest.com/u/fitness").await);
        assert_eq!(controller.screen(), Screen::Result);
        assert_eq!(controller.state().plan.as_ref().map(|p| p.goal.as_str()), Some("Get Fit"));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_sets_generic_error() {
        let (mut controller, _) = signed_in(&["not valid json"]).await;
        controller.submit_board_url("https://pinterest.com/u/b").await;
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert_eq!(controller.state().error.as_deref(), Some(GENERATION_ERROR_MESSAGE));
        assert!(controller.state().plan.is_none());
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let (mut controller, llm) = signed_in(&[GET_FIT]).await;
        assert!(!controller.submit_board_url("").await);
        assert!(!controller.submit_board_url("   ").await);
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_processing() {
        let (mut controller, _) = signed_in(&[GET_FIT]).await;
        let ticket = controller.begin_generation("https://pinterest.com/u/a").unwrap();
        assert!(controller.begin_generation("https://pinterest.com/u/b").is_none());
        assert_eq!(controller.screen(), Screen::Processing);
        assert_eq!(ticket.board_url, "https://pinterest.com/u/a");
    }

    #[tokio::test]
    async fn test_new_attempt_clears_error() {
        let (mut controller, _) = signed_in(&["", GET_FIT]).await;
        controller.submit_board_url("https://pinterest.com/u/a").await;
        assert!(controller.state().error.is_some());

        controller.begin_generation("https://pinterest.com/u/a").unwrap();
        assert!(controller.state().error.is_none());
    }

    #[tokio::test]
    async fn test_logout_during_processing_drops_result() {
        let (mut controller, _) = signed_in(&[]).await;
        let ticket = controller.begin_generation("https://pinterest.com/u/a").unwrap();

        assert!(controller.logout().await);
        assert_eq!(controller.screen(), Screen::Landing);

        let plan = crate::planner::parse_plan(GET_FIT).unwrap();
        assert!(!controller.complete_generation(ticket.epoch, Ok(plan)));
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(controller.state().plan.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_provider_fails() {
        let mut controller = broken_controller();
        controller.apply_session_change(SessionChange::SignedIn(Session::local("me@example.com")));
        assert!(controller.logout().await);
        assert_eq!(controller.screen(), Screen::Landing);
        assert!(!controller.state().is_signed_in());
    }

    #[tokio::test]
    async fn test_new_plan_clears_plan() {
        let (mut controller, _) = signed_in(&[GET_FIT]).await;
        controller.submit_board_url("https://pinterest.com/u/a").await;
        assert!(controller.new_plan());
        assert_eq!(controller.screen(), Screen::Dashboard);
        assert!(controller.state().plan.is_none());
        assert!(!controller.new_plan());
    }

    #[test]
    fn test_epoch_bumps_only_when_leaving_processing() {
        let (mut controller, _, _) = controller(&[]);
        controller.apply_session_change(SessionChange::SignedIn(Session::local("me@example.com")));
        let start = controller.state().epoch;

        controller.begin_generation("https://pinterest.com/u/a").unwrap();
        assert_eq!(controller.state().epoch, start);

        controller.complete_generation(start, Err(PlanError::EmptyResponse));
        assert_eq!(controller.state().epoch, start + 1);

        controller.dismiss_error();
        assert!(controller.state().error.is_none());
        assert_eq!(controller.state().epoch, start + 1);
    }
}
