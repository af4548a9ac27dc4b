//! Supabase auth provider
//!
//! Talks to the GoTrue REST endpoints under `{url}/auth/v1`. Sessions are
//! persisted to a JSON file so a restart resumes the signed-in user; an
//! expired session is refreshed once with its refresh token.
//!
//! OAuth uses the PKCE flow with a loopback redirect: `sign_in_with_oauth`
//! returns the authorization URL and a background task waits for the
//! browser to hit `http://127.0.0.1:<port>/callback?code=...`, exchanges the
//! code and broadcasts the new session. A denied consent, a failed exchange
//! or a timeout is broadcast as [`super::SessionChange::Failed`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{AuthError, AuthProvider, SessionBroadcaster, SessionSubscription};
use crate::domain::Session;

/// Length of the PKCE code verifier (43..=128 allowed)
const PKCE_VERIFIER_LEN: usize = 64;

/// Largest callback request we read from the browser
const MAX_CALLBACK_BYTES: usize = 8192;

/// Idle browser connections (preconnects) are dropped after this
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Default wait for the user to finish the browser leg of OAuth
const DEFAULT_OAUTH_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

/// Supabase (GoTrue) identity provider
#[derive(Clone)]
pub struct SupabaseAuthProvider {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    anon_key: String,
    http: Client,
    session: RwLock<Option<Session>>,
    session_file: Option<PathBuf>,
    events: SessionBroadcaster,
    oauth_port: u16,
    oauth_timeout: Duration,
}

/// Token grant response from GoTrue
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + chrono::Duration::seconds(secs)));

        Session {
            user_id: self.user.id,
            email: self.user.email.unwrap_or_default(),
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

impl SupabaseAuthProvider {
    /// Create a provider for a project URL and anon key
    ///
    /// `request_timeout` bounds every HTTP request. The OAuth callback wait
    /// is set separately with [`Self::with_oauth_timeout`].
    pub fn new(
        url: impl Into<String>,
        anon_key: impl Into<String>,
        session_file: Option<PathBuf>,
        request_timeout: Duration,
    ) -> Result<Self, AuthError> {
        let url = url.into().trim_end_matches('/').to_string();
        debug!(%url, ?session_file, ?request_timeout, "SupabaseAuthProvider::new: called");
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                url,
                anon_key: anon_key.into(),
                http,
                session: RwLock::new(None),
                session_file,
                events: SessionBroadcaster::new("supabase"),
                oauth_port: 0,
                oauth_timeout: DEFAULT_OAUTH_TIMEOUT,
            }),
        })
    }

    /// Fixed loopback port for OAuth redirects (0 = any free port)
    ///
    /// Must be called before the provider is shared.
    pub fn with_oauth_port(mut self, port: u16) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.oauth_port = port;
        }
        self
    }

    /// How long to wait for the OAuth browser callback
    ///
    /// Must be called before the provider is shared.
    pub fn with_oauth_timeout(mut self, timeout: Duration) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.oauth_timeout = timeout;
        }
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.inner.url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.endpoint(path))
            .header("apikey", &self.inner.anon_key)
            .header("content-type", "application/json")
    }

    /// Map a non-success response to an AuthError
    async fn check(response: Response) -> Result<Response, AuthError> {
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        debug!(status, %message, "SupabaseAuthProvider::check: request rejected");
        match status {
            400 | 401 | 422 => Err(AuthError::InvalidCredentials(message)),
            _ => Err(AuthError::Rejected { status, message }),
        }
    }

    /// POST /token?grant_type=...
    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, AuthError> {
        debug!(%grant_type, "SupabaseAuthProvider::token_grant: called");
        let response = self
            .request(Method::POST, &format!("token?grant_type={}", grant_type))
            .json(&body)
            .send()
            .await?;
        let token: TokenResponse = Self::check(response).await?.json().await?;
        Ok(token.into_session(Utc::now()))
    }

    /// Replace the held session, persist it and optionally broadcast
    async fn set_session(&self, session: Option<Session>, notify: bool) {
        debug!(signed_in = session.is_some(), notify, "SupabaseAuthProvider::set_session: called");
        *self.inner.session.write().await = session.clone();

        if let Err(e) = self.persist(session.as_ref()).await {
            warn!(error = %e, "Failed to persist session");
        }
        if notify {
            self.inner.events.notify(session);
        }
    }

    async fn persist(&self, session: Option<&Session>) -> Result<(), AuthError> {
        let Some(path) = &self.inner.session_file else {
            return Ok(());
        };
        match session {
            Some(session) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let json = serde_json::to_string_pretty(session)?;
                tokio::fs::write(path, json).await?;
            }
            None => match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    async fn load_persisted(&self) -> Option<Session> {
        let path = self.inner.session_file.as_ref()?;
        let content = tokio::fs::read_to_string(path).await.ok()?;
        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn authorize_url(&self, provider: &str, redirect_to: &str, verifier: &str) -> Result<Url, AuthError> {
        let challenge = pkce_challenge(verifier);
        Url::parse_with_params(
            &self.endpoint("authorize"),
            &[
                ("provider", provider),
                ("redirect_to", redirect_to),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "s256"),
            ],
        )
        .map_err(|e| AuthError::OAuth(format!("bad authorize URL: {}", e)))
    }

    /// Wait for the browser callback, exchange the code, sign in
    async fn finish_oauth(&self, listener: TcpListener, verifier: String) -> Result<Session, AuthError> {
        debug!("SupabaseAuthProvider::finish_oauth: called");
        let code = accept_callback(&listener).await?;
        let session = self
            .token_grant("pkce", json!({ "auth_code": code, "code_verifier": verifier }))
            .await?;
        self.set_session(Some(session.clone()), true).await;
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        debug!("SupabaseAuthProvider::current_session: called");
        let held = self.inner.session.read().await.clone();
        let session = match held {
            Some(session) => session,
            None => match self.load_persisted().await {
                Some(session) => session,
                None => return Ok(None),
            },
        };

        if !session.is_expired() {
            *self.inner.session.write().await = Some(session.clone());
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            debug!("SupabaseAuthProvider::current_session: expired without refresh token");
            self.set_session(None, false).await;
            return Ok(None);
        };

        match self.token_grant("refresh_token", json!({ "refresh_token": refresh_token })).await {
            Ok(refreshed) => {
                info!(user_id = %refreshed.user_id, "Session refreshed");
                self.set_session(Some(refreshed.clone()), false).await;
                Ok(Some(refreshed))
            }
            Err(AuthError::InvalidCredentials(message)) => {
                info!(%message, "Stored session could not be refreshed");
                self.set_session(None, false).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        debug!(%email, "SupabaseAuthProvider::sign_up: called");
        let response = self
            .request(Method::POST, "signup")
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        // With email confirmation enabled GoTrue returns only the user
        if body.get("access_token").is_none() {
            info!(%email, "Sign-up pending email confirmation");
            return Ok(None);
        }

        let session = serde_json::from_value::<TokenResponse>(body)?.into_session(Utc::now());
        info!(user_id = %session.user_id, "Signed up");
        self.set_session(Some(session.clone()), true).await;
        Ok(Some(session))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!(%email, "SupabaseAuthProvider::sign_in_with_password: called");
        let session = self
            .token_grant("password", json!({ "email": email.trim(), "password": password }))
            .await?;
        info!(user_id = %session.user_id, "Signed in");
        self.set_session(Some(session.clone()), true).await;
        Ok(session)
    }

    async fn sign_in_with_oauth(&self, provider: &str) -> Result<Option<String>, AuthError> {
        debug!(%provider, "SupabaseAuthProvider::sign_in_with_oauth: called");
        let listener = TcpListener::bind(("127.0.0.1", self.inner.oauth_port)).await?;
        let port = listener.local_addr()?.port();
        let redirect_to = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let verifier = pkce_verifier();
        let url = self.authorize_url(provider, &redirect_to, &verifier)?;

        let this = self.clone();
        let timeout = self.inner.oauth_timeout;
        tokio::spawn(async move {
            let failure = match tokio::time::timeout(timeout, this.finish_oauth(listener, verifier)).await {
                Ok(Ok(session)) => {
                    info!(user_id = %session.user_id, "OAuth sign-in complete");
                    return;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "OAuth sign-in failed");
                    e
                }
                Err(_) => {
                    warn!(?timeout, "OAuth sign-in timed out waiting for the browser");
                    AuthError::OAuth("Timed out waiting for the browser sign-in".to_string())
                }
            };
            this.inner.events.notify_failure(&failure);
        });

        info!(%port, "Waiting for OAuth callback");
        Ok(Some(url.to_string()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        debug!("SupabaseAuthProvider::sign_out: called");
        let access_token = self
            .inner
            .session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.access_token.clone());

        let remote = match access_token {
            Some(token) => match self
                .request(Method::POST, "logout")
                .bearer_auth(token)
                .send()
                .await
            {
                Ok(response) => Self::check(response).await.map(|_| ()),
                Err(e) => Err(e.into()),
            },
            None => Ok(()),
        };

        // Local state is cleared whatever the service said
        self.set_session(None, true).await;
        remote
    }

    fn subscribe(&self) -> SessionSubscription {
        self.inner.events.subscribe()
    }
}

/// Random PKCE code verifier
fn pkce_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(PKCE_VERIFIER_LEN)
        .map(char::from)
        .collect()
}

/// S256 code challenge: base64url(SHA-256(verifier)) without padding
fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Pull a readable message out of a GoTrue error body
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return if body.trim().is_empty() {
            "Authentication failed".to_string()
        } else {
            body.trim().to_string()
        };
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| "Authentication failed".to_string())
}

/// Serve the loopback listener until the browser hits the callback path
///
/// Empty or idle connections (browser preconnects) and requests for other
/// paths are answered and skipped.
async fn accept_callback(listener: &TcpListener) -> Result<String, AuthError> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        debug!(%peer, "accept_callback: connection");

        let request = match tokio::time::timeout(CALLBACK_READ_TIMEOUT, read_request_head(&mut stream)).await {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                debug!(%peer, error = %e, "accept_callback: read failed, skipping");
                continue;
            }
            Err(_) => {
                debug!(%peer, "accept_callback: idle connection, skipping");
                continue;
            }
        };
        if request.is_empty() {
            debug!(%peer, "accept_callback: empty connection, skipping");
            continue;
        }

        if request_path(&request) != Some(CALLBACK_PATH) {
            debug!(%peer, path = ?request_path(&request), "accept_callback: not the callback, skipping");
            respond(&mut stream, "404 Not Found", "Not found").await;
            continue;
        }

        let outcome = parse_callback(&request);
        let body = match &outcome {
            Ok(_) => "Signed in to moodplan. You can close this tab.",
            Err(_) => "moodplan sign-in failed. You can close this tab and try again.",
        };
        respond(&mut stream, "200 OK", body).await;
        return outcome;
    }
}

/// Read until the end of the request headers, EOF or the size cap
async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while buf.len() < MAX_CALLBACK_BYTES {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Path of the request line, without the query
fn request_path(request: &str) -> Option<&str> {
    let target = request.lines().next()?.split_whitespace().nth(1)?;
    target.split('?').next()
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "respond: write failed");
    }
    stream.shutdown().await.ok();
}

/// Read the auth code (or the provider's error) from a raw callback request
fn parse_callback(request: &str) -> Result<String, AuthError> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| AuthError::OAuth("malformed callback request".to_string()))?;

    let url = Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| AuthError::OAuth(format!("malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error_description" => error = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, error) {
        (Some(code), _) if !code.is_empty() => Ok(code),
        (_, Some(error)) => Err(AuthError::OAuth(error)),
        _ => Err(AuthError::OAuth("callback did not carry an auth code".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionChange;
    use tempfile::TempDir;

    fn provider(session_file: Option<PathBuf>) -> SupabaseAuthProvider {
        SupabaseAuthProvider::new(
            "https://proj.supabase.co/",
            "anon-key",
            session_file,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn remote_session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            user_id: "user-1".to_string(),
            email: "me@example.com".to_string(),
            access_token: Some("access".to_string()),
            refresh_token: None,
            expires_at,
        }
    }

    #[test]
    fn test_token_response_into_session() {
        let json = r#"{
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {"id": "u-1", "email": "me@example.com"}
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let now = Utc::now();
        let session = token.into_session(now);

        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.email, "me@example.com");
        assert_eq!(session.access_token.as_deref(), Some("a"));
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
        assert_eq!(session.expires_at, Some(now + chrono::Duration::seconds(3600)));
    }

    #[test]
    fn test_token_response_prefers_absolute_expiry() {
        let json = r#"{"access_token":"a","expires_in":10,"expires_at":1900000000,"user":{"id":"u"}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let session = token.into_session(Utc::now());
        assert_eq!(session.expires_at, DateTime::from_timestamp(1_900_000_000, 0));
        assert_eq!(session.email, "");
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(r#"{"code":422,"msg":"Password too short"}"#), "Password too short");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(""), "Authentication failed");
        assert_eq!(error_message("{}"), "Authentication failed");
    }

    #[test]
    fn test_pkce_challenge_is_s256() {
        // RFC 7636 appendix B
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_pkce_verifier() {
        let a = pkce_verifier();
        let b = pkce_verifier();
        assert_eq!(a.len(), PKCE_VERIFIER_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_authorize_url() {
        let provider = provider(None);
        let url = provider
            .authorize_url("google", "http://127.0.0.1:5000/callback", "verifier123")
            .unwrap();

        assert!(url.as_str().starts_with("https://proj.supabase.co/auth/v1/authorize?"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".to_string(), "google".to_string())));
        assert!(pairs.contains(&("redirect_to".to_string(), "http://127.0.0.1:5000/callback".to_string())));
        assert!(pairs.contains(&("code_challenge".to_string(), pkce_challenge("verifier123"))));
        assert!(pairs.contains(&("code_challenge_method".to_string(), "s256".to_string())));
        assert!(!url.as_str().contains("verifier123"));
    }

    #[test]
    fn test_parse_callback() {
        let ok = "GET /callback?code=abc-123 HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n";
        assert_eq!(parse_callback(ok).unwrap(), "abc-123");

        let denied = "GET /callback?error=access_denied&error_description=User%20cancelled HTTP/1.1\r\n\r\n";
        match parse_callback(denied) {
            Err(AuthError::OAuth(message)) => assert_eq!(message, "User cancelled"),
            other => panic!("expected OAuth error, got {:?}", other),
        }

        assert!(parse_callback("GET /callback HTTP/1.1\r\n\r\n").is_err());
        assert!(parse_callback("").is_err());
    }

    #[tokio::test]
    async fn test_accept_callback_answers_browser() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let browser = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /callback?code=xyz HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n")
                .await
                .unwrap();
            let mut reply = String::new();
            stream.read_to_string(&mut reply).await.unwrap();
            reply
        });

        let code = accept_callback(&listener).await.unwrap();
        assert_eq!(code, "xyz");

        let reply = browser.await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK"));
        assert!(reply.contains("You can close this tab"));
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("GET /callback?code=x HTTP/1.1\r\n\r\n"), Some("/callback"));
        assert_eq!(request_path("GET /favicon.ico HTTP/1.1\r\n\r\n"), Some("/favicon.ico"));
        assert_eq!(request_path(""), None);
    }

    #[tokio::test]
    async fn test_accept_callback_skips_preconnect_and_other_paths() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let browser = tokio::spawn(async move {
            // Speculative preconnect that never sends anything
            drop(TcpStream::connect(addr).await.unwrap());

            let mut favicon = TcpStream::connect(addr).await.unwrap();
            favicon.write_all(b"GET /favicon.ico HTTP/1.1\r\n\r\n").await.unwrap();
            let mut reply = String::new();
            favicon.read_to_string(&mut reply).await.unwrap();
            assert!(reply.starts_with("HTTP/1.1 404"));

            // Request split across two writes
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"GET /callback?code=sp").await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            stream.write_all(b"lit HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n").await.unwrap();
            let mut reply = String::new();
            stream.read_to_string(&mut reply).await.unwrap();
            reply
        });

        let code = accept_callback(&listener).await.unwrap();
        assert_eq!(code, "split");
        assert!(browser.await.unwrap().starts_with("HTTP/1.1 200 OK"));
    }

    /// Loopback callback address from an authorize URL
    fn redirect_addr(authorize_url: &str) -> String {
        let url = Url::parse(authorize_url).unwrap();
        let redirect_to = url
            .query_pairs()
            .find(|(key, _)| key == "redirect_to")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        let redirect = Url::parse(&redirect_to).unwrap();
        format!("127.0.0.1:{}", redirect.port().unwrap())
    }

    #[tokio::test]
    async fn test_denied_oauth_consent_is_broadcast() {
        let provider = provider(None);
        let mut sub = provider.subscribe();

        let url = provider.sign_in_with_oauth("google").await.unwrap().unwrap();
        let mut browser = TcpStream::connect(redirect_addr(&url)).await.unwrap();
        browser
            .write_all(b"GET /callback?error=access_denied&error_description=User%20cancelled HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        let mut reply = String::new();
        browser.read_to_string(&mut reply).await.unwrap();
        assert!(reply.contains("sign-in failed"));

        assert_eq!(sub.recv().await, Some(SessionChange::Failed("User cancelled".to_string())));
    }

    #[tokio::test]
    async fn test_oauth_timeout_is_broadcast() {
        let provider = provider(None).with_oauth_timeout(Duration::from_millis(50));
        let mut sub = provider.subscribe();

        provider.sign_in_with_oauth("google").await.unwrap();
        match sub.recv().await {
            Some(SessionChange::Failed(message)) => assert!(message.contains("Timed out")),
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_persisted_session_is_restored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let session = remote_session(Some(Utc::now() + chrono::Duration::hours(1)));

        let first = provider(Some(path.clone()));
        first.set_session(Some(session.clone()), false).await;
        assert!(path.exists());

        let second = provider(Some(path.clone()));
        assert_eq!(second.current_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_token_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let expired = remote_session(Some(Utc::now() - chrono::Duration::minutes(5)));
        std::fs::write(&path, serde_json::to_string(&expired).unwrap()).unwrap();

        let provider = provider(Some(path.clone()));
        assert_eq!(provider.current_session().await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_session_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let provider = provider(Some(path));
        assert_eq!(provider.current_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_session_broadcasts_when_asked() {
        let provider = provider(None);
        let mut sub = provider.subscribe();
        let session = remote_session(None);

        provider.set_session(Some(session.clone()), false).await;
        assert_eq!(sub.try_recv(), None);

        provider.set_session(None, true).await;
        assert_eq!(sub.try_recv(), Some(SessionChange::SignedOut));
    }
}
