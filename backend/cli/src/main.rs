mod analyze_cmd;
mod api;
mod config;
mod configure_cmd;
mod generate_cmd;
mod terminal_output;
mod validate_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use api::AppState;
use config::Config;

#[derive(Parser)]
#[command(name = "docfill")]
#[command(about = "docfill: turn documents with ${placeholders} into fillable forms")]
#[command(version)]
struct Cli {
    /// Config file (defaults to docfill.yaml in $DOCFILL_CONFIG_DIR or ~/.docfill)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract placeholders from a document and write a template
    Analyze(analyze_cmd::AnalyzeArgs),
    /// Configure one placeholder in a template
    Configure(configure_cmd::ConfigureArgs),
    /// Check a values file against a template
    Validate(validate_cmd::ValidateArgs),
    /// Generate the final document
    Generate(generate_cmd::GenerateArgs),
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).await?;

    docfill_logging::init_logger(config.log_dir(), config.log_level(), config.log_json())?;
    docfill_config::log_warnings(&config.warnings);

    let result = match cli.command {
        Commands::Analyze(args) => analyze_cmd::run(args, &config).await,
        Commands::Configure(args) => configure_cmd::run(args).await,
        Commands::Validate(args) => validate_cmd::run(args).await,
        Commands::Generate(args) => generate_cmd::run(args, &config).await,
        Commands::Serve { port } => run_server(&config, port).await,
    };

    if let Err(e) = &result {
        terminal_output::note_error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}

async fn run_server(config: &Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port());
    let generator = config.generator(None)?;
    info!(
        port,
        bind = %config.bind_address(),
        policy = %generator.policy(),
        "Starting docfill API"
    );

    let state = Arc::new(AppState::new(generator));
    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(sweeper.idle_ttl() / 4);
        loop {
            tick.tick().await;
            sweeper.evict_idle().await;
        }
    });
    let app = api::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.bind_address(), port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
