//! moodplan - mood board to life action plan
//!
//! CLI entry point: the terminal UI by default, plus one-shot commands.

use std::fs;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use moodplan::auth::create_provider;
use moodplan::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use moodplan::config::Config;
use moodplan::controller::Controller;
use moodplan::domain::ActionPlan;
use moodplan::llm::create_client;
use moodplan::planner::PlanGenerator;
use moodplan::tui::{self, TuiRunner};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, nothing below can be traced
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "moodplan loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Tui) => cmd_tui(&config).await,
        Some(Command::Generate { url, format }) => cmd_generate(&config, &url, format).await,
        Some(Command::Session) => cmd_session(&config).await,
        Some(Command::Logout) => cmd_logout(&config).await,
    }
}

fn planner_from_config(config: &Config) -> Result<PlanGenerator> {
    let llm = create_client(&config.llm).context("Failed to create generation client")?;
    Ok(PlanGenerator::new(llm).with_max_tokens(config.llm.max_tokens))
}

async fn cmd_tui(config: &Config) -> Result<()> {
    debug!("cmd_tui: called");
    let planner = planner_from_config(config)?;
    let auth = create_provider(&config.auth).context("Failed to create auth provider")?;
    let controller = Controller::new(auth, planner);
    let runner = TuiRunner::new(controller, &config.ui, config.auth.oauth_provider.clone());
    tui::run(runner).await
}

async fn cmd_generate(config: &Config, url: &str, format: OutputFormat) -> Result<()> {
    debug!(%url, ?format, "cmd_generate: called");
    if url.trim().is_empty() {
        eyre::bail!("Board URL must not be empty");
    }

    let planner = planner_from_config(config)?;
    eprintln!("{}", "Analyzing your vibe... ✨".magenta());
    let plan = planner.generate(url).await.context("Plan generation failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Markdown => print!("{}", plan.to_text()),
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(())
}

fn print_plan(plan: &ActionPlan) {
    println!("{}", "PLAN GENERATED".green());
    println!("{}\n", plan.goal.bold());

    println!("{}", "Weekly Roadmap".blue().bold());
    for day in &plan.weekly_plan {
        println!("  {}", day.day.magenta().bold());
        for action in &day.actions {
            println!("    • {}", action);
        }
    }

    println!("\n{}", "First Steps".blue().bold());
    for (i, step) in plan.first_steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    println!("\n{}", "Suggested Habits".blue().bold());
    for habit in &plan.suggested_habits {
        println!("  {} {}", "✿".green(), habit);
    }

    println!(
        "\n{}",
        format!(
            "{} days, {} actions",
            plan.weekly_plan.len(),
            plan.action_count()
        )
        .dimmed()
    );
}

async fn cmd_session(config: &Config) -> Result<()> {
    debug!("cmd_session: called");
    let auth = create_provider(&config.auth).context("Failed to create auth provider")?;
    match auth.current_session().await.context("Failed to look up session")? {
        Some(session) => {
            println!("{} {}", "Signed in:".green(), session.email.bold());
            println!("  provider: {}", auth.name());
            println!("  user id:  {}", session.user_id);
            if let Some(expires_at) = session.expires_at {
                println!("  expires:  {}", expires_at.to_rfc3339());
            }
        }
        None => println!("{} (provider: {})", "Not signed in".yellow(), auth.name()),
    }
    Ok(())
}

async fn cmd_logout(config: &Config) -> Result<()> {
    debug!("cmd_logout: called");
    let auth = create_provider(&config.auth).context("Failed to create auth provider")?;
    // Restores a persisted session first so the service can revoke it
    if auth.current_session().await.ok().flatten().is_none() {
        println!("{}", "Not signed in".yellow());
        return Ok(());
    }
    auth.sign_out().await.context("Sign-out failed")?;
    println!("{}", "Signed out".green());
    Ok(())
}
