//! moodplan - turn a mood board into a life action plan
//!
//! A user submits a public board URL; a generative-AI service infers the
//! aesthetic or life theme behind it and returns a structured plan: a weekly
//! roadmap, a few first steps, and habits to keep.
//!
//! # Modules
//!
//! - [`controller`] - view state controller (screens, session, generation lifecycle)
//! - [`planner`] - plan generation adapter (prompt, response schema, validation)
//! - [`llm`] - generation client trait and Gemini implementation
//! - [`auth`] - auth provider trait, local demo provider, Supabase provider
//! - [`domain`] - `ActionPlan` and `Session`
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface
//! - [`tui`] - terminal front end

pub mod auth;
pub mod cli;
pub mod config;
pub mod controller;
pub mod domain;
pub mod llm;
pub mod planner;
pub mod tui;

// Re-export commonly used types
pub use auth::{AuthError, AuthProvider, LocalAuthProvider, SessionChange, SessionSubscription, SupabaseAuthProvider};
pub use config::{AuthConfig, Config, LlmConfig, UiConfig};
pub use controller::{AppState, Controller, GENERATION_ERROR_MESSAGE, GenerationTicket, Screen};
pub use domain::{ActionPlan, DayPlan, Session};
pub use llm::{GeminiClient, GenerateRequest, GenerateResponse, LlmClient, LlmError, create_client};
pub use planner::{PlanError, PlanGenerator, parse_plan};
