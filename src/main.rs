use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pulseboard::api::HttpApi;
use pulseboard::config::DashboardConfig;
use pulseboard::dashboard::Dashboard;
use pulseboard::render::text::TerminalSurface;
use pulseboard::render::{MemorySurface, Surface};
use pulseboard::trigger::{TerminalNotifier, TriggerOutcome};

#[derive(Parser)]
#[command(
    name = "pulseboard",
    about = "Trigger metric anomaly analyses and browse their reports",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (default: $PULSEBOARD_CONFIG, then ./pulseboard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print the current reports once
    Reports {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Start an analysis and print the reports after the refresh delay
    Analyze {
        /// Analysis kind slug (see `kinds`)
        kind: String,
    },

    /// List the registered analysis kinds
    Kinds,

    /// Interactive dashboard reading commands from stdin
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::resolve(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
    }
    pulseboard::init_tracing(&config.logging);

    let api = Arc::new(HttpApi::new(&config.server.base_url)?);
    let style = config.display.time_window;

    match cli.command {
        Commands::Reports { json } => {
            tracing::info!(base_url = %api.base_url(), "Fetching reports");
            let surface = Arc::new(MemorySurface::new());
            let dashboard = Dashboard::new(api, surface.clone(), Arc::new(TerminalNotifier), &config);
            let result = dashboard.refresh().await;

            TerminalSurface::new(style, json).replace(surface.view());
            result?;
        }
        Commands::Analyze { kind } => {
            let surface = Arc::new(TerminalSurface::new(style, false));
            let dashboard = Dashboard::new(api, surface, Arc::new(TerminalNotifier), &config);

            tracing::info!(%kind, delay_secs = config.refresh.delay_secs, "Running analysis");
            if let TriggerOutcome::Accepted(refresh) = dashboard.run_analysis(&kind).await? {
                refresh.wait().await;
            }
        }
        Commands::Kinds => {
            println!("{:<4} | {:<16} | Label", "#", "Slug");
            println!("{:-<4}-|-{:-<16}-|-{:-<30}", "", "", "");
            for (i, kind) in config.kinds().iter().enumerate() {
                println!("{:<4} | {:<16} | {}", i + 1, kind.slug, kind.label);
            }
        }
        Commands::Watch => {
            tracing::info!(base_url = %api.base_url(), "Starting dashboard");
            let surface = Arc::new(TerminalSurface::new(style, false));
            let dashboard = Dashboard::new(api, surface, Arc::new(TerminalNotifier), &config);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            dashboard.watch(stdin).await?;
        }
    }

    Ok(())
}
