//! moodplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main moodplan configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Generative-AI service configuration
    pub llm: LlmConfig,

    /// Authentication provider configuration
    pub auth: AuthConfig,

    /// Terminal UI configuration
    pub ui: UiConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./.moodplan.yml`, then
    /// `~/.config/moodplan/moodplan.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed: a broken config file is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidate_paths(),
        };
        paths
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".moodplan.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("moodplan").join("moodplan.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Generative-AI service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "gemini" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum output tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key_env: "API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        debug!(api_key_env = %self.api_key_env, "LlmConfig::get_api_key: called");
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(eyre::eyre!(
                "API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }
}

/// How the auth provider is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Supabase when its URL and key are both set, local demo mode otherwise
    #[default]
    Auto,
    /// Always Supabase; missing credentials are an error
    Supabase,
    /// Always the local demo provider
    Local,
}

/// Authentication provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Provider selection
    pub mode: AuthMode,

    /// Environment variable holding the Supabase project URL
    #[serde(rename = "url-env")]
    pub url_env: String,

    /// Environment variable holding the Supabase anon key
    #[serde(rename = "anon-key-env")]
    pub anon_key_env: String,

    /// Where a remote session is kept between runs
    #[serde(rename = "session-file")]
    pub session_file: PathBuf,

    /// OAuth provider used by "continue with ..." sign-in
    #[serde(rename = "oauth-provider")]
    pub oauth_provider: String,

    /// Loopback port for the OAuth redirect (0 = pick a free port)
    #[serde(rename = "oauth-port")]
    pub oauth_port: u16,

    /// Timeout for each auth service request, in milliseconds
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// How long to wait for the OAuth browser callback, in milliseconds
    #[serde(rename = "oauth-timeout-ms")]
    pub oauth_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let session_file = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodplan")
            .join("session.json");

        Self {
            mode: AuthMode::Auto,
            url_env: "SUPABASE_URL".to_string(),
            anon_key_env: "SUPABASE_ANON_KEY".to_string(),
            session_file,
            oauth_provider: "google".to_string(),
            oauth_port: 0,
            request_timeout_ms: 30_000,
            oauth_timeout_ms: 300_000,
        }
    }
}

/// Auth backend after reading the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBackend {
    /// Demo mode: sessions are minted locally
    Local,
    /// Supabase GoTrue endpoints
    Supabase { url: String, anon_key: String },
}

impl AuthConfig {
    /// Resolve the backend from mode and environment
    pub fn resolve(&self) -> Result<AuthBackend> {
        debug!(mode = ?self.mode, "AuthConfig::resolve: called");
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let url = read(&self.url_env);
        let anon_key = read(&self.anon_key_env);

        match (self.mode, url, anon_key) {
            (AuthMode::Local, _, _) => Ok(AuthBackend::Local),
            (AuthMode::Auto | AuthMode::Supabase, Some(url), Some(anon_key)) => {
                Ok(AuthBackend::Supabase {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                })
            }
            (AuthMode::Auto, _, _) => {
                debug!("AuthConfig::resolve: credentials absent, using local demo mode");
                Ok(AuthBackend::Local)
            }
            (AuthMode::Supabase, _, _) => Err(eyre::eyre!(
                "Supabase auth selected but {} and {} are not both set",
                self.url_env,
                self.anon_key_env
            )),
        }
    }
}

/// Terminal UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Event poll / redraw interval in milliseconds
    #[serde(rename = "tick-ms")]
    pub tick_ms: u64,

    /// How long each loading message stays on screen
    #[serde(rename = "loading-message-ms")]
    pub loading_message_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            loading_message_ms: 2500,
        }
    }
}
