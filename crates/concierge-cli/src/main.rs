mod app;
mod booking;
mod config;
mod demo_model;

use app::{DEFAULT_PROMPTS, build_runner, offline_client};
use clap::Parser;
use concierge_agent::{AgentError, RunEvent};
use concierge_sessions::{FsSessionStore, MemorySessionStore, SessionStore};
use config::{DemoConfig, USER_ID, parse_max_steps};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(about = "Booking assistant demo: a coordinator routing to booking and info agents")]
struct Cli {
    /// Prompt to send; repeat for a multi-turn conversation. Defaults to a
    /// three-turn London hotel booking.
    #[arg(long = "prompt")]
    prompts: Vec<String>,
    #[arg(long, value_parser = parse_max_steps_arg)]
    max_steps: Option<usize>,
    /// Persist sessions as JSON under this directory instead of in memory.
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error("Error: {0}")]
    Startup(String),
    #[error("ERROR during agent execution: {0}")]
    Execution(AgentError),
}

impl Failure {
    fn startup(error: impl std::fmt::Display) -> Self {
        Self::Startup(error.to_string())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(failure) => {
            eprintln!("{failure}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_max_steps_arg(raw: &str) -> Result<usize, String> {
    parse_max_steps(raw).map_err(|error| error.to_string())
}

async fn run(cli: Cli) -> Result<ExitCode, Failure> {
    let mut config = DemoConfig::from_env().map_err(Failure::startup)?;
    if let Some(max_steps) = cli.max_steps {
        config.max_steps = max_steps;
    }
    tracing::debug!(model = %config.model, max_steps = config.max_steps, "configuration loaded");

    let store: Arc<dyn SessionStore> = match &cli.state_dir {
        Some(dir) => Arc::new(FsSessionStore::new(dir).map_err(Failure::startup)?),
        None => Arc::new(MemorySessionStore::new()),
    };
    let client = offline_client().map_err(Failure::startup)?;
    let runner = build_runner(&config, client, store).map_err(Failure::startup)?;
    let session = runner
        .create_session(USER_ID)
        .await
        .map_err(Failure::startup)?;

    let prompts: Vec<String> = if cli.prompts.is_empty() {
        DEFAULT_PROMPTS.iter().map(|prompt| prompt.to_string()).collect()
    } else {
        cli.prompts
    };

    for prompt in &prompts {
        println!("\n> {prompt}");
        let mut events = runner.run(USER_ID, &session.session_id, prompt);
        while let Some(event) = events.next().await {
            let event = event.map_err(Failure::Execution)?;
            if let Some(line) = response_line(&event) {
                println!("{line}");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn response_line(event: &RunEvent) -> Option<String> {
    event
        .user_text()
        .filter(|text| !text.is_empty())
        .map(|text| format!("Agent Response: {text}"))
}
