//! sdr-agents - command-line entry point

use clap::{Parser, Subcommand};
use sdr_agents::agents::AgentCatalog;
use sdr_agents::config::AppConfig;
use sdr_agents::llm::registry::ProviderRegistry;
use sdr_agents::observability::logging::{parse_flag, LogFormat};
use sdr_agents::observability::{init_default_logging, init_logging};
use sdr_agents::server::AgentServer;
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, Level};

/// LLM-backed sales development agents
#[derive(Parser)]
#[command(name = "sdr-agents")]
#[command(about = "Sales development agents backed by hosted LLMs")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "SDR_AGENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve every enabled agent over HTTP
    Serve {
        /// Listen address, overriding the configuration
        #[arg(long)]
        host: Option<String>,
        /// Listen port, overriding the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
    /// List enabled agents
    Agents,
    /// Print an agent's welcome message and example prompts
    Welcome { agent: String },
    /// Run one request through an agent and print the response body
    Invoke {
        agent: String,
        /// Read the request body from FILE instead of stdin
        #[arg(short, long, value_name = "FILE", conflicts_with = "example")]
        input: Option<PathBuf>,
        /// Use the agent's Nth welcome example as the request body
        #[arg(short, long, value_name = "N")]
        example: Option<usize>,
        /// Also print the request outcome and stages to stderr
        #[arg(long)]
        report: bool,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_observability(cli.verbose);

    let config = match AppConfig::discover(cli.config.as_deref()) {
        Ok((config, _)) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Config { show } => handle_config_command(&config, show),
        Commands::Agents => list_agents(&config),
        Commands::Welcome { agent } => print_welcome(&config, &agent),
        Commands::Invoke {
            agent,
            input,
            example,
            report,
        } => invoke(&config, &agent, input, example, report).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn init_observability(verbose: u8) {
    let level = match verbose {
        0 => return init_default_logging(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let format = LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()));
    init_logging(level, format, parse_flag(&env::var("LOG_SPANS").unwrap_or_default()));
}

fn build_catalog(config: &AppConfig) -> (AgentCatalog, Arc<ProviderRegistry>) {
    let registry = Arc::new(ProviderRegistry::from_config(&config.providers));
    (AgentCatalog::from_config(config, registry.clone()), registry)
}

async fn serve(config: AppConfig, host: Option<String>, port: Option<u16>) -> CliResult {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting sdr-agents v{}", env!("CARGO_PKG_VERSION"));
    let (catalog, registry) = build_catalog(&config);
    if catalog.is_empty() {
        return Err("No agents are enabled".into());
    }

    AgentServer::new(catalog, registry)
        .run(&host, port, shutdown_signal())
        .await?;

    info!("Application shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}

fn handle_config_command(config: &AppConfig, show: bool) -> CliResult {
    config.validate()?;
    info!("Configuration is valid");

    if show {
        println!("{}", config.to_toml_string()?);
    }
    Ok(())
}

fn list_agents(config: &AppConfig) -> CliResult {
    let (catalog, _) = build_catalog(config);
    for agent in catalog.list() {
        println!("{:<20} {}", agent.id, agent.description);
    }
    Ok(())
}

fn print_welcome(config: &AppConfig, agent_id: &str) -> CliResult {
    let (catalog, _) = build_catalog(config);
    let handler = catalog
        .get(agent_id)
        .ok_or_else(|| format!("Unknown agent: {agent_id}"))?;

    println!("{}", serde_json::to_string_pretty(&handler.welcome())?);
    Ok(())
}

async fn invoke(
    config: &AppConfig,
    agent_id: &str,
    input: Option<PathBuf>,
    example: Option<usize>,
    report: bool,
) -> CliResult {
    let (catalog, _) = build_catalog(config);
    let handler = catalog
        .get(agent_id)
        .ok_or_else(|| format!("Unknown agent: {agent_id}"))?;

    let body = match (input, example) {
        (Some(path), _) => std::fs::read(&path)?,
        (None, Some(index)) => handler
            .welcome()
            .prompts
            .get(index)
            .map(|prompt| prompt.body())
            .ok_or_else(|| format!("{agent_id} has no example {index}"))?,
        (None, None) => {
            let mut body = Vec::new();
            std::io::stdin().read_to_end(&mut body)?;
            body
        }
    };

    let run = handler.execute(&body).await;
    if report {
        let stages: Vec<&str> = run.stages.iter().map(|stage| stage.as_str()).collect();
        eprintln!(
            "request {}: {:?} after {} generation call(s) [{}]",
            run.request_id,
            run.outcome,
            run.generation_calls(),
            stages.join(" -> ")
        );
    }

    println!("{}", run.response.body());
    Ok(())
}
