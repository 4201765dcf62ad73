use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};

use nexus_core::agent::core::{AgentConfig, AgentEvent};
use nexus_core::agent::coordinator::{Coordinator, ResponderKind};
use nexus_core::agent::provider::SharedProvider;
use nexus_core::backend::{MockFlightBackend, TicketDesk};
use nexus_core::config::NexusConfig;
use nexus_core::logging;
use nexus_core::responders::ResponderModel;
use nexus_providers::moonshot::Moonshot;
use nexus_search::{IngestMode, SearchRuntime};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "AirlineNexus: a multi-agent airline customer service assistant")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, short = 'c', env = "NEXUS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print which specialist handles each question
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive assistant (default)
    Chat,
    /// Embed a policy file into the local policy index
    Ingest {
        /// JSON array of {title, category, content}
        #[arg(default_value = "data/airline_policies.json")]
        file: PathBuf,
        /// Drop the existing index and embed everything again
        #[arg(long)]
        full: bool,
    },
    /// Answer a single question and exit
    Ask {
        /// Send the question straight to one specialist instead of the coordinator
        #[arg(long, value_enum)]
        route: Option<Route>,
        /// The question
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Route {
    Flight,
    Policy,
    Support,
    General,
}

impl From<Route> for ResponderKind {
    fn from(route: Route) -> Self {
        match route {
            Route::Flight => ResponderKind::Flight,
            Route::Policy => ResponderKind::Policy,
            Route::Support => ResponderKind::Support,
            Route::General => ResponderKind::General,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NexusConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init_from_config(&config.logging)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Ingest { file, full } => ingest(&config, file, full).await,
        Commands::Ask { route, question } => {
            let coordinator = build_coordinator(&config)?;
            if cli.verbose {
                watch_routing(&coordinator);
            }
            let question = question.join(" ");
            let answer = match route {
                Some(route) => coordinator.dispatch(route.into(), &question).await?,
                None => coordinator.ask(&question).await?,
            };
            println!("{}", answer);
            Ok(())
        }
        Commands::Chat => {
            let coordinator = build_coordinator(&config)?;
            if cli.verbose {
                watch_routing(&coordinator);
            }
            interactive(&coordinator).await
        }
    }
}

async fn ingest(config: &NexusConfig, file: PathBuf, full: bool) -> Result<()> {
    let runtime = SearchRuntime::new(config.search.clone());
    let mode = if full {
        IngestMode::FullReload
    } else {
        IngestMode::Incremental
    };

    let report = runtime
        .ingest_file(&file, mode)
        .await
        .context("Failed to ingest airline policies")?;
    println!("{}", report);
    Ok(())
}

fn build_coordinator(config: &NexusConfig) -> Result<Coordinator> {
    let api_key = config.api_key()?;
    let provider: SharedProvider = Arc::new(Moonshot::from_config(api_key, &config.model)?);

    let model = ResponderModel::new(
        provider,
        AgentConfig::from_settings("responder", &config.model, &config.agent),
    );
    let policies = Arc::new(SearchRuntime::new(config.search.clone()));

    let coordinator = model.coordinator(
        policies,
        Arc::new(MockFlightBackend::new()),
        Arc::new(TicketDesk::new()),
    )?;
    tracing::info!(model = %config.model.model, "assistant ready");
    Ok(coordinator)
}

fn watch_routing(coordinator: &Coordinator) {
    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let AgentEvent::ToolCall { tool, .. } = event {
                eprintln!("  [routing to {}]", tool);
            }
        }
    });
}

async fn interactive(coordinator: &Coordinator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("\n Airline Assistant Agent\n");
    println!("Type 'exit' to quit.");

    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nExecution interrupted. Exiting...");
                break;
            }
        };

        // EOF
        let Some(input) = line else {
            println!("\nGoodbye!");
            break;
        };
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            println!("\nGoodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        match coordinator.ask(input).await {
            Ok(answer) => println!("{}", answer),
            Err(e) => {
                tracing::warn!(error = %e, "query failed");
                println!("\nAn error occurred: {}", e);
                println!("Please try asking a different question.");
            }
        }
    }

    Ok(())
}
