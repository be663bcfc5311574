//! Habitlab - backend for a bilingual habit-experiment tracker

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use habitlab::{
    api::{build_app, AppState},
    config::HabitlabConfig,
    content::types::{Experiment, ExperimentBox},
    subscriptions::{migration::LegacySubscription, SubscriptionStore},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "habitlab")]
#[command(version)]
#[command(about = "Backend for bilingual habit experiments")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HABITLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Import legacy subscription documents
    Migrate {
        /// JSON file holding an array of legacy subscriptions
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Check configuration and storage
    Doctor,

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("habitlab={},tower_http={}", log_level, log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    let config = HabitlabConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            run_server(config, host, port).await?;
        }
        Commands::Migrate { input } => {
            run_migrate(&config, &input).await?;
        }
        Commands::Doctor => {
            run_doctor(&config, cli.config.as_deref()).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_server(mut config: HabitlabConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Habitlab");
    let state = AppState::open(&config.storage).await?;
    let app = build_app(&state, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Habitlab listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn run_migrate(config: &HabitlabConfig, input: &std::path::Path) -> Result<()> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let docs: Vec<LegacySubscription> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a list of legacy subscriptions", input.display()))?;

    let store = SubscriptionStore::new(config.storage.subscriptions_dir()).await?;
    let total = docs.len();
    let report = store.import_legacy(docs).await?;

    tracing::info!(
        total,
        imported = report.imported,
        skipped = report.skipped,
        merged_duplicates = report.merged_duplicates,
        "Legacy import finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_doctor(config: &HabitlabConfig, config_path: Option<&std::path::Path>) -> Result<()> {
    println!("Habitlab Doctor");
    println!();

    println!("Checking configuration...");
    match config_path {
        Some(path) => println!("  ✓ Configuration file loaded: {}", path.display()),
        None => println!("  ℹ No configuration file given (using defaults)"),
    }

    println!();
    println!("Checking storage...");
    let base = &config.storage.base_dir;
    tokio::fs::create_dir_all(base)
        .await
        .with_context(|| format!("cannot create {}", base.display()))?;
    let probe = base.join(".doctor-probe");
    match tokio::fs::write(&probe, b"ok").await {
        Ok(()) => {
            let _ = tokio::fs::remove_file(&probe).await;
            println!("  ✓ {} is writable", base.display());
        }
        Err(e) => println!("  ✗ {} is not writable: {}", base.display(), e),
    }

    let state = AppState::open(&config.storage).await?;
    let boxes = state.content.list::<ExperimentBox>(None).await.len();
    let experiments = state.content.list::<Experiment>(None).await.len();
    println!("  ✓ {} box(es), {} experiment(s)", boxes, experiments);

    println!();
    println!("Doctor check complete!");
    Ok(())
}

fn show_config(config: Option<&HabitlabConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
