//! Authentication providers
//!
//! The controller only talks to the `AuthProvider` trait. Two
//! implementations exist:
//!
//! - [`LocalAuthProvider`] - demo mode, sessions are minted locally
//! - [`SupabaseAuthProvider`] - Supabase GoTrue REST endpoints
//!
//! Every provider broadcasts session changes; subscribers receive them in
//! emission order through a [`SessionSubscription`]. A sign-in that fails
//! after the call returned (the OAuth browser leg) is reported on the same
//! stream.

use std::sync::Arc;

use async_trait::async_trait;
use eyre::Result;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{AuthBackend, AuthConfig};
use crate::domain::Session;

mod local;
mod supabase;

pub use local::LocalAuthProvider;
pub use supabase::SupabaseAuthProvider;

/// Buffered notifications per subscriber before it starts lagging
const SESSION_CHANNEL_CAPACITY: usize = 32;

/// Errors from an auth provider
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Auth service error {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OAuth sign-in failed: {0}")]
    OAuth(String),
}

impl AuthError {
    /// Short message suitable for the login form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(message) => message.clone(),
            AuthError::Rejected { message, .. } => message.clone(),
            AuthError::Network(_) => "Could not reach the sign-in service".to_string(),
            AuthError::OAuth(message) => message.clone(),
            AuthError::Io(_) | AuthError::Json(_) => "Authentication failed".to_string(),
        }
    }
}

/// A change reported by an auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Session),
    SignedOut,
    /// A sign-in finished in the background and failed; carries a message
    /// for the login form
    Failed(String),
}

impl SessionChange {
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => Self::SignedIn(session),
            None => Self::SignedOut,
        }
    }
}

/// Fan-out of session changes shared by the provider implementations
#[derive(Debug, Clone)]
pub struct SessionBroadcaster {
    tx: broadcast::Sender<SessionChange>,
    provider: &'static str,
}

impl SessionBroadcaster {
    pub fn new(provider: &'static str) -> Self {
        let (tx, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Self { tx, provider }
    }

    /// Emit a change to every current subscriber
    pub fn notify(&self, session: Option<Session>) {
        let change = SessionChange::from_session(session);
        debug!(provider = self.provider, ?change, "SessionBroadcaster::notify: called");
        // No subscribers is not an error
        let _ = self.tx.send(change);
    }

    /// Report a background sign-in failure
    pub fn notify_failure(&self, error: &AuthError) {
        debug!(provider = self.provider, %error, "SessionBroadcaster::notify_failure: called");
        let _ = self.tx.send(SessionChange::Failed(error.user_message()));
    }

    pub fn subscribe(&self) -> SessionSubscription {
        debug!(provider = self.provider, "SessionBroadcaster::subscribe: called");
        SessionSubscription {
            rx: self.tx.subscribe(),
            provider: self.provider,
        }
    }
}

/// Handle on a provider's session-change stream
#[derive(Debug)]
pub struct SessionSubscription {
    rx: broadcast::Receiver<SessionChange>,
    provider: &'static str,
}

impl SessionSubscription {
    /// Wait for the next change; `None` once the provider is gone
    pub async fn recv(&mut self) -> Option<SessionChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(provider = self.provider, skipped, "Session subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next pending change without waiting
    pub fn try_recv(&mut self) -> Option<SessionChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) => return Some(change),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(provider = self.provider, skipped, "Session subscription lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Stop receiving changes
    pub fn unsubscribe(self) {
        debug!(provider = self.provider, "SessionSubscription::unsubscribe: called");
    }
}

/// Authentication collaborator
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Provider name, for logging and the header
    fn name(&self) -> &'static str;

    /// Existing session, if any
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Create an account
    ///
    /// Returns `None` when the account exists but the provider requires email
    /// confirmation before a session is issued.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError>;

    /// Sign in with email and password
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Start an OAuth sign-in
    ///
    /// Returns the authorization URL the user has to open, if any. The
    /// resulting session arrives through the change stream.
    async fn sign_in_with_oauth(&self, provider: &str) -> Result<Option<String>, AuthError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribe to session changes
    fn subscribe(&self) -> SessionSubscription;
}

/// Build the provider selected by configuration
pub fn create_provider(config: &AuthConfig) -> Result<Arc<dyn AuthProvider>> {
    debug!(mode = ?config.mode, "create_provider: called");
    match config.resolve()? {
        AuthBackend::Local => {
            info!("Auth: local demo mode (no auth service configured)");
            Ok(Arc::new(LocalAuthProvider::new()))
        }
        AuthBackend::Supabase { url, anon_key } => {
            info!(%url, "Auth: Supabase");
            let provider = SupabaseAuthProvider::new(
                url,
                anon_key,
                Some(config.session_file.clone()),
                std::time::Duration::from_millis(config.request_timeout_ms),
            )?
            .with_oauth_port(config.oauth_port)
            .with_oauth_timeout(std::time::Duration::from_millis(config.oauth_timeout_ms));
            Ok(Arc::new(provider))
        }
    }
}
