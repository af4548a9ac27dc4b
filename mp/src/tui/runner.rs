//! TUI Runner - main loop
//!
//! The TuiRunner owns the controller and is the only place state changes.
//! It waits on four sources at once:
//! - terminal events (keys, resize, ticks)
//! - the auth provider's session-change stream
//! - results of background auth calls
//! - results of the background generation task
//!
//! Auth calls and generation both run on spawned tasks, so a slow service
//! never stalls redraws or key handling. Generation results come back
//! tagged with the ticket epoch and the controller drops stale ones.

use std::time::Duration;

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::Tui;
use super::app::{App, UiAction};
use super::events::{Event, EventHandler};
use super::views;
use crate::auth::{AuthError, SessionChange};
use crate::config::UiConfig;
use crate::controller::Controller;
use crate::domain::{ActionPlan, Session};
use crate::planner::PlanError;

/// Result from the background generation task
#[derive(Debug)]
struct GenerationOutcome {
    epoch: u64,
    result: Result<ActionPlan, PlanError>,
}

/// Result from a background auth call
#[derive(Debug)]
enum AuthOutcome {
    SignIn(Result<Session, AuthError>),
    SignUp(Result<Option<Session>, AuthError>),
    OAuth(Result<Option<String>, AuthError>),
    SignOut(Result<(), AuthError>),
}

/// TUI Runner that manages the event loop
pub struct TuiRunner {
    controller: Controller,
    app: App,
    tick_rate: Duration,
    /// Provider name used for "continue with OAuth"
    oauth_provider: String,
    generation_tx: mpsc::UnboundedSender<GenerationOutcome>,
    generation_rx: mpsc::UnboundedReceiver<GenerationOutcome>,
    auth_tx: mpsc::UnboundedSender<AuthOutcome>,
    auth_rx: mpsc::UnboundedReceiver<AuthOutcome>,
}

impl TuiRunner {
    pub fn new(controller: Controller, ui: &UiConfig, oauth_provider: impl Into<String>) -> Self {
        debug!(?ui, "TuiRunner::new: called");
        let (generation_tx, generation_rx) = mpsc::unbounded_channel();
        let (auth_tx, auth_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            app: App::new(ui),
            tick_rate: Duration::from_millis(ui.tick_ms.max(1)),
            oauth_provider: oauth_provider.into(),
            generation_tx,
            generation_rx,
            auth_tx,
            auth_rx,
        }
    }

    /// Run until the user quits
    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        debug!("TuiRunner::run: called");
        let mut event_handler = EventHandler::new(self.tick_rate);

        terminal.draw(|frame| views::render(self.controller.state(), &self.app, frame))?;
        let mut sessions = Some(self.controller.startup().await);
        info!(
            provider = self.controller.auth_provider(),
            screen = %self.controller.screen(),
            "TUI started"
        );

        loop {
            terminal.draw(|frame| views::render(self.controller.state(), &self.app, frame))?;
            if self.app.should_quit {
                break;
            }

            tokio::select! {
                event = event_handler.next() => {
                    match event? {
                        Event::Key(key) => {
                            let screen = self.controller.screen();
                            if let Some(action) = self.app.handle_key(screen, key) {
                                self.apply_action(action);
                            }
                        }
                        Event::Resize(width, height) => {
                            debug!(width, height, "TuiRunner::run: resize");
                        }
                        Event::Tick => self.app.on_tick(),
                    }
                }
                change = async {
                    match sessions.as_mut() {
                        Some(subscription) => subscription.recv().await,
                        None => std::future::pending::<Option<SessionChange>>().await,
                    }
                } => {
                    match change {
                        Some(change) => self.handle_session_change(change),
                        None => {
                            warn!("Auth provider closed its session stream");
                            sessions = None;
                        }
                    }
                }
                Some(outcome) = self.auth_rx.recv() => {
                    self.handle_auth(outcome);
                }
                Some(outcome) = self.generation_rx.recv() => {
                    self.handle_generation(outcome);
                }
            }
        }

        if let Some(subscription) = sessions {
            subscription.unsubscribe();
        }
        info!("TUI exiting");
        Ok(())
    }

    fn handle_session_change(&mut self, change: SessionChange) {
        debug!(?change, "TuiRunner::handle_session_change: called");
        self.controller.apply_session_change(change);
        if self.controller.state().is_signed_in() {
            self.app.reset_login();
        }
    }

    fn handle_auth(&mut self, outcome: AuthOutcome) {
        debug!(?outcome, "TuiRunner::handle_auth: called");
        match outcome {
            AuthOutcome::SignIn(result) => {
                let signed_in = self.controller.complete_sign_in(result);
                self.after_credentials(signed_in);
            }
            AuthOutcome::SignUp(result) => {
                let signed_in = self.controller.complete_sign_up(result);
                self.after_credentials(signed_in);
            }
            AuthOutcome::OAuth(result) => {
                if let Some(url) = self.controller.complete_oauth(result) {
                    info!(%url, "Open the authorization URL to finish signing in");
                }
            }
            AuthOutcome::SignOut(result) => self.controller.complete_logout(result),
        }
    }

    fn after_credentials(&mut self, signed_in: bool) {
        if signed_in {
            self.app.reset_login();
        } else {
            self.app.clear_credentials();
        }
    }

    /// Run one auth call on a background task
    fn spawn_auth<F>(&self, call: F)
    where
        F: std::future::Future<Output = AuthOutcome> + Send + 'static,
    {
        let tx = self.auth_tx.clone();
        tokio::spawn(async move {
            if tx.send(call.await).is_err() {
                debug!("Auth call finished after the runner exited");
            }
        });
    }

    fn handle_generation(&mut self, outcome: GenerationOutcome) {
        debug!(epoch = outcome.epoch, "TuiRunner::handle_generation: called");
        self.controller.complete_generation(outcome.epoch, outcome.result);
    }

    /// Apply a user action to the controller
    fn apply_action(&mut self, action: UiAction) {
        debug!(?action, "TuiRunner::apply_action: called");
        match action {
            UiAction::Quit => self.app.should_quit = true,
            UiAction::GoToLogin => {
                if self.controller.request_sign_in() {
                    self.app.reset_login();
                }
            }
            UiAction::GoToPricing => {
                self.controller.request_pricing();
            }
            UiAction::Back => {
                self.controller.back();
            }
            UiAction::SignIn { email, password } => {
                if self.controller.begin_auth() {
                    let auth = self.controller.auth();
                    self.spawn_auth(async move { AuthOutcome::SignIn(auth.sign_in_with_password(&email, &password).await) });
                }
            }
            UiAction::SignUp { email, password } => {
                if self.controller.begin_auth() {
                    let auth = self.controller.auth();
                    self.spawn_auth(async move { AuthOutcome::SignUp(auth.sign_up(&email, &password).await) });
                }
            }
            UiAction::OAuth => {
                if self.controller.begin_auth() {
                    let auth = self.controller.auth();
                    let provider = self.oauth_provider.clone();
                    self.spawn_auth(async move { AuthOutcome::OAuth(auth.sign_in_with_oauth(&provider).await) });
                }
            }
            UiAction::SubmitUrl(url) => self.start_generation(&url),
            UiAction::NewPlan => {
                self.controller.new_plan();
            }
            UiAction::Logout => {
                if self.controller.begin_logout() {
                    let auth = self.controller.auth();
                    self.spawn_auth(async move { AuthOutcome::SignOut(auth.sign_out().await) });
                }
            }
            UiAction::DismissError => self.controller.dismiss_error(),
        }
    }

    /// Begin a generation and run the planner on a background task
    fn start_generation(&mut self, board_url: &str) {
        let Some(ticket) = self.controller.begin_generation(board_url) else {
            return;
        };
        self.app.start_loading();
        let epoch = ticket.epoch;

        let planner = self.controller.planner().clone();
        let tx = self.generation_tx.clone();
        tokio::spawn(async move {
            let result = planner.generate(&ticket.board_url).await;
            if tx
                .send(GenerationOutcome {
                    epoch: ticket.epoch,
                    result,
                })
                .is_err()
            {
                debug!("Generation finished after the runner exited");
            }
        });
        info!(epoch, "Generation task spawned");
    }
}
