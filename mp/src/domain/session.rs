//! Session domain type
//!
//! Identity of the signed-in principal. Owned by an auth provider; the
//! controller only keeps a read-only copy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Signed-in identity and, for remote providers, its credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque user id
    pub user_id: String,
    /// Email the user signed in with
    pub email: String,
    /// Bearer token for the auth service (None for local sessions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Token used to renew an expired session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// End of the validity window (None = does not expire)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Mint a stand-in session that no service knows about
    pub fn local(email: impl Into<String>) -> Self {
        let email = email.into();
        debug!(%email, "Session::local: called");
        Self {
            user_id: Uuid::new_v4().to_string(),
            email,
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Check whether the validity window has passed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Check whether the validity window has passed
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True when this session was issued by a remote service
    pub fn is_remote(&self) -> bool {
        self.access_token.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_local_session_has_unique_ids() {
        let a = Session::local("a@example.com");
        let b = Session::local("a@example.com");
        assert_ne!(a.user_id, b.user_id);
        assert_eq!(a.email, "a@example.com");
        assert!(!a.is_remote());
        assert!(!a.is_expired());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut session = Session::local("a@example.com");
        session.expires_at = Some(now - Duration::seconds(1));
        assert!(session.is_expired_at(now));

        session.expires_at = Some(now + Duration::hours(1));
        assert!(!session.is_expired_at(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let mut session = Session::local("a@example.com");
        session.access_token = Some("secret-access".to_string());
        session.refresh_token = Some("secret-refresh".to_string());
        let out = format!("{:?}", session);
        assert!(!out.contains("secret-access"));
        assert!(!out.contains("secret-refresh"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn test_local_session_serializes_without_tokens() {
        let session = Session::local("a@example.com");
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("access_token"));
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
