//! Boardflow - turn whiteboard workflows into planned work.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use boardflow::core::{env_lookup, parse_project_id, Config, Settings};
use boardflow::pipeline::{Pipeline, RunOptions, LIST_LIMIT};

/// Analyze whiteboard workflows with an LLM and file the resulting work items
#[derive(Parser)]
#[command(name = "boardflow")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a board and create work items
    Analyze {
        /// Target project ID (0 creates a new project)
        #[arg(env = "PROJECT_ID")]
        project_id: String,

        /// Board to analyze (defaults to MIRO_BOARD_ID or the configured board)
        board_id: Option<String>,

        /// Directory for run artifacts
        output_dir: Option<PathBuf>,

        /// Name used when a project has to be created
        #[arg(short, long)]
        workflow_name: Option<String>,
    },

    /// List boards visible to the access token
    List {
        /// Target project ID
        #[arg(env = "PROJECT_ID")]
        project_id: String,
    },

    /// Run the HTTP API server
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show effective configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    match cli.command {
        Commands::Analyze { project_id, board_id, output_dir, workflow_name } => {
            cmd_analyze(&project_id, board_id, output_dir, workflow_name)?;
        }
        Commands::List { project_id } => {
            cmd_list(&project_id)?;
        }
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            cmd_serve(host, port)?;
        }
        Commands::Config { path } => {
            cmd_config(path)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Load config and validate credentials before any network call.
fn load_settings() -> Result<Settings> {
    let config = Config::load()?.with_env_overrides(env_lookup);
    Ok(Settings::from_env(config)?)
}

/// Project IDs are mandatory on the command line.
fn require_project_id(raw: &str) -> Result<u64> {
    parse_project_id(Some(raw))?.context("PROJECT_ID is not set")
}

/// Run the full pipeline for one board.
fn cmd_analyze(
    project_id: &str,
    board_id: Option<String>,
    output_dir: Option<PathBuf>,
    workflow_name: Option<String>,
) -> Result<()> {
    let settings = load_settings()?;
    let project_id = require_project_id(project_id)?;

    let board_id = board_id
        .filter(|b| !b.is_empty())
        .or_else(|| settings.config.board.default_board_id.clone())
        .context("No board ID given (pass BOARD_ID or set MIRO_BOARD_ID)")?;
    let options = RunOptions {
        board_id,
        output_dir: output_dir.unwrap_or_else(|| settings.config.output.dir.clone()),
        workflow_name,
    };

    let pipeline = Pipeline::from_settings(&settings, Some(project_id));

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(pipeline.run(&options))?;

    println!();
    for line in outcome.summary_lines() {
        println!("{line}");
    }

    Ok(())
}

/// List boards.
fn cmd_list(project_id: &str) -> Result<()> {
    let settings = load_settings()?;
    let project_id = require_project_id(project_id)?;
    let pipeline = Pipeline::from_settings(&settings, Some(project_id));

    let rt = tokio::runtime::Runtime::new()?;
    let boards = rt.block_on(pipeline.list_boards(LIST_LIMIT))?;

    if boards.is_empty() {
        println!("No boards found.");
        return Ok(());
    }

    println!("Available boards:\n");
    for (i, board) in boards.iter().enumerate() {
        println!("{}. {}", i + 1, board.name);
        println!("   ID: {}", board.id);
        println!("   Modified: {}", board.modified_at.as_deref().unwrap_or("unknown"));
        if let Some(description) = board.description.as_deref().filter(|d| !d.is_empty()) {
            println!("   Description: {description}");
        }
        println!();
    }

    Ok(())
}

/// Run the HTTP server until Ctrl+C.
#[cfg(feature = "server")]
fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    use boardflow::server::{settings_factory, start_server, ServerConfig};

    let settings = load_settings()?;

    let mut config = ServerConfig::from_config(&settings.config);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(start_server(config, settings_factory(settings)))
}

/// Print the effective configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        match Config::locate() {
            Some(path) => println!("{}", path.display()),
            None => {
                if let Some(dir) = Config::config_dir() {
                    println!("{} (not found)", dir.join("config.toml").display());
                }
            }
        }
        return Ok(());
    }

    let config = Config::load()?.with_env_overrides(env_lookup);
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "boardflow", &mut io::stdout());
}
