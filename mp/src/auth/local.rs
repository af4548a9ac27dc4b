//! Local demo-mode auth provider
//!
//! Used when no auth service is configured. Sign-in mints a stand-in
//! session without contacting anything; the session lives in memory for the
//! lifetime of the process.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{AuthError, AuthProvider, SessionBroadcaster, SessionSubscription};
use crate::domain::Session;

/// In-memory identity provider
#[derive(Debug)]
pub struct LocalAuthProvider {
    session: Mutex<Option<Session>>,
    events: SessionBroadcaster,
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        debug!("LocalAuthProvider::new: called");
        Self {
            session: Mutex::new(None),
            events: SessionBroadcaster::new("local"),
        }
    }

    /// Start with an existing session, as if restored at startup
    pub fn with_session(session: Session) -> Self {
        let provider = Self::new();
        *provider.lock() = Some(session);
        provider
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        // A poisoned lock only means a panic elsewhere; the data is still a plain Option
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_session(&self, session: Option<Session>) {
        *self.lock() = session.clone();
        self.events.notify(session);
    }

    fn validate(email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "Email and password are required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AuthError::InvalidCredentials("Enter a valid email address".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        debug!("LocalAuthProvider::current_session: called");
        Ok(self.lock().clone())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        debug!(%email, "LocalAuthProvider::sign_up: called");
        Self::validate(email, password)?;
        let session = Session::local(email.trim());
        info!(user_id = %session.user_id, "Local account created");
        self.set_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!(%email, "LocalAuthProvider::sign_in_with_password: called");
        Self::validate(email, password)?;
        let session = Session::local(email.trim());
        info!(user_id = %session.user_id, "Local sign-in");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_in_with_oauth(&self, provider: &str) -> Result<Option<String>, AuthError> {
        debug!(%provider, "LocalAuthProvider::sign_in_with_oauth: called");
        let session = Session::local(format!("{}-user@demo.local", provider));
        info!(user_id = %session.user_id, %provider, "Local OAuth sign-in");
        self.set_session(Some(session));
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        debug!("LocalAuthProvider::sign_out: called");
        self.set_session(None);
        Ok(())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
