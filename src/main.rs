use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    Terminal,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vimbin::api::{ApiClient, ContentLoader, LoadOutcome, SaveCoordinator, SaveOutcome};
use vimbin::clipboard::ClipboardAdapter;
use vimbin::config::{ConfigManager, Overrides, SessionConfig};
use vimbin::engine::BufferEngine;
use vimbin::session::Session;
use vimbin::widgets::Page;
use vimbin::App;

#[derive(Parser)]
#[command(name = "vimbin", author, version, about = "A pastebin with vim motions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API token
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Server address
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'i', long = "insecure-skip-verify", global = true)]
    insecure_skip_verify: bool,

    /// Verbose logging
    #[arg(long, global = true, conflicts_with = "trace")]
    debug: bool,

    /// Log document contents as well
    #[arg(long, global = true)]
    trace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit the stored document in the terminal (default)
    Edit,
    /// Print the stored document
    #[command(alias = "fetch")]
    Pull,
    /// Store text, replacing the document
    Push {
        /// Append instead of replacing
        #[arg(short, long)]
        append: bool,

        /// Text to store; arguments are joined with newlines
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    let command = cli.command.take().unwrap_or(Commands::Edit);

    init_logging(&cli, matches!(command, Commands::Edit))?;

    let mut config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(&ConfigManager::default_dir()),
    };
    config_manager.load()?;
    info!("Using config {}", config_manager.config_path().display());

    let overrides = Overrides {
        url: cli.url.clone(),
        token: cli.token.clone(),
        skip_insecure_verify: cli.insecure_skip_verify,
    };
    let session_config = SessionConfig::resolve(config_manager.get_config(), &overrides)?;

    match command {
        Commands::Edit => edit(session_config).await,
        Commands::Pull => pull(session_config).await,
        Commands::Push { append, text } => push(session_config, append, &text).await,
    }
}

fn init_logging(cli: &Cli, to_file: bool) -> Result<()> {
    let level = if cli.trace {
        "trace"
    } else if cli.debug {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // The terminal belongs to the editor, so its logs go to a file
    if to_file {
        let log_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vimbin");
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create '{}'", log_dir.display()))?;
        let log_file = File::create(log_dir.join("vimbin.log"))?;

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    Ok(())
}

async fn edit(config: SessionConfig) -> Result<()> {
    let session = Session::start(config, Page::new(), ClipboardAdapter::system(), BufferEngine::new)
        .await
        .context("Failed to start the editing session")?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let result = app.run(&mut terminal).await;

    // Restore the terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        ratatui::crossterm::cursor::Show
    )?;

    if let Err(e) = &result {
        error!("Editor stopped: {:#}", e);
    }
    result
}

async fn pull(config: SessionConfig) -> Result<()> {
    let client = ApiClient::new(config)?;

    match ContentLoader::new(client).load().await {
        LoadOutcome::Content { text } => {
            print!("{}", text);
            Ok(())
        }
        outcome @ LoadOutcome::Failed { .. } => {
            let message = outcome.failure_message().unwrap_or_default();
            error!("{}", message);
            bail!(message)
        }
    }
}

async fn push(config: SessionConfig, append: bool, text: &[String]) -> Result<()> {
    let saver = SaveCoordinator::new(ApiClient::new(config)?);

    let content = text.join("\n");
    let outcome = if append {
        saver.append(&format!("\n{}", content)).await
    } else {
        saver.save(&content).await
    };

    let (_, message) = outcome.status();
    match outcome {
        SaveOutcome::Failed { .. } => {
            error!("{}", message);
            bail!(message)
        }
        _ => {
            info!("{}", message);
            println!("{}", message);
            Ok(())
        }
    }
}
