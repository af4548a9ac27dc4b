//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// moodplan - turn a mood board into a life action plan
#[derive(Parser)]
#[command(
    name = "mp",
    about = "Turn a Pinterest mood board into a weekly life action plan",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the terminal UI (default)
    Tui,

    /// Generate one plan for a board URL and print it
    Generate {
        /// Public board URL
        url: String,

        /// Output format (text, json, markdown)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the current session of the configured auth provider
    Session,

    /// Sign out of the configured auth provider
    Logout,
}

/// Output format for printed plans
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use text, json or markdown", s)),
        }
    }
}

/// Path of the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moodplan")
        .join("logs")
        .join("moodplan.log")
}

/// After-help text showing which environment variables are set
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let config = Config::default();
    let is_set = |name: &str| std::env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false);
    let icon = |set: bool| if set { "\u{2705}" } else { "\u{274C}" };

    let mut help = String::from("Environment:\n");
    for (name, purpose) in [
        (config.llm.api_key_env.as_str(), "generation API key"),
        (config.auth.url_env.as_str(), "Supabase project URL"),
        (config.auth.anon_key_env.as_str(), "Supabase anon key"),
    ] {
        help.push_str(&format!("  {} {:<18} {}\n", icon(is_set(name)), name, purpose));
    }

    help.push_str("\nLogs:\n");
    help.push_str(&format!("  {}\n", get_log_path().display()));
    help
}
