//! GreenLens CLI - sustainability scans and crisis scenario simulations

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use greenlens_core::api::{self, HealthStatus};
use greenlens_core::auth::User;
use greenlens_core::config::Config;
use greenlens_core::crisis::{CrisisSimulator, SimulationRepository};
use greenlens_core::image::ImageClient;
use greenlens_core::llm::LlmClient;
use greenlens_core::scan::{ScanRepository, ScanRequest, ScanService};
use greenlens_core::storage::Database;
use tracing::debug;

#[derive(Parser)]
#[command(name = "greenlens")]
#[command(author, version, about = "Sustainability scans and crisis scenario simulations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Run one crisis simulation and store it
    Simulate {
        /// Crisis topic, e.g. "su krizi"
        topic: String,
        /// User id to store the simulation under
        #[arg(long)]
        user: i64,
        /// Username recorded in logs
        #[arg(long, default_value = "cli")]
        username: String,
    },

    /// Generate a sustainability report for a product
    Scan {
        /// Product barcode
        #[arg(long)]
        barcode: Option<String>,
        /// Product name
        #[arg(long)]
        product_name: Option<String>,
        /// User id to store the scan under
        #[arg(long)]
        user: i64,
    },

    /// List stored simulations or scans for a user
    History {
        /// User id
        #[arg(long)]
        user: i64,
        /// Show product scans instead of simulations
        #[arg(long)]
        scans: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check configuration, database and secrets
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("greenlens=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = e
            .downcast_ref::<greenlens_core::Error>()
            .and_then(|err| err.suggestion())
        {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { bind } => {
            let config = Config::load()?;
            api::serve(&config, bind).await
        }
        Commands::Simulate {
            topic,
            user,
            username,
        } => cmd_simulate(&topic, User::new(user, username), cli.format).await,
        Commands::Scan {
            barcode,
            product_name,
            user,
        } => {
            let request = ScanRequest {
                barcode,
                product_name,
            };
            cmd_scan(&request, User::new(user, "cli"), cli.format).await
        }
        Commands::History { user, scans } => cmd_history(user, scans, cli.format).await,
        Commands::Config { action } => cmd_config(action, cli.format, cli.quiet),
        Commands::Doctor => cmd_doctor(cli.format, cli.quiet).await,
    }
}

async fn cmd_simulate(topic: &str, user: User, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config).await?;

    let simulator = CrisisSimulator::new(
        Arc::new(LlmClient::from_config(&config.llm)?),
        Arc::new(ImageClient::from_config(&config.image)?),
        db.clone(),
        &config.crisis,
    );

    debug!(topic, user_id = user.id, "Running simulation from CLI");
    let simulation = simulator.simulate(topic, &user).await?;
    db.close().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&simulation)?),
        OutputFormat::Text => {
            println!("Simulation #{}", simulation.sim_id);
            if simulation.scenarios.is_empty() {
                println!("  (no year sections were found in the generated document)");
            }
            for (year, entry) in simulation.scenarios.iter() {
                println!();
                println!("### {}", year);
                println!("{}", entry.text);
                println!("Image: {}", entry.image_url);
            }
        }
    }
    Ok(())
}

async fn cmd_scan(request: &ScanRequest, user: User, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config).await?;

    let service = ScanService::new(Arc::new(LlmClient::from_config(&config.llm)?), db.clone());
    let result = service.scan(request, &user).await?;
    db.close().await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            println!("Scan #{}", result.scan_id);
            println!();
            println!("{}", result.report);
        }
    }
    Ok(())
}

async fn cmd_history(user: i64, scans: bool, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = Database::open(&config).await?;

    if scans {
        let scans = ScanRepository::new(&db).list_by_owner(user).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scans)?),
            OutputFormat::Text if scans.is_empty() => println!("No scans for user {}.", user),
            OutputFormat::Text => {
                for scan in &scans {
                    let product = scan
                        .barcode
                        .as_deref()
                        .or(scan.product_name.as_deref())
                        .unwrap_or("-");
                    println!(
                        "#{:<5} {}  {}",
                        scan.id,
                        scan.created_at.format("%Y-%m-%d %H:%M"),
                        product
                    );
                }
            }
        }
    } else {
        let simulations = SimulationRepository::new(&db).list_by_owner(user).await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&simulations)?),
            OutputFormat::Text if simulations.is_empty() => {
                println!("No simulations for user {}.", user)
            }
            OutputFormat::Text => {
                for sim in &simulations {
                    let years: Vec<&str> = sim.scenarios.years().collect();
                    println!(
                        "#{:<5} {}  {}  [{}]",
                        sim.id,
                        sim.created_at.format("%Y-%m-%d %H:%M"),
                        sim.crisis,
                        years.join(", ")
                    );
                }
            }
        }
    }

    db.close().await;
    Ok(())
}

fn cmd_config(action: ConfigAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if format == OutputFormat::Json {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (key, value) in items {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load().context("Configuration could not be loaded")?;
    let report = api::doctor(&config).await;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        println!("GreenLens Health Check");
        println!("======================");
        println!();
        for check in &report.checks {
            let marker = match check.status {
                HealthStatus::Ok => "[OK]",
                HealthStatus::Warning => "[--]",
                HealthStatus::Error => "[!!]",
            };
            match &check.message {
                Some(message) => println!("{} {}: {}", marker, check.name, message),
                None => println!("{} {}", marker, check.name),
            }
        }
        println!();
    }

    match report.overall_status {
        HealthStatus::Error => Err(anyhow!("Health check found problems")),
        _ => {
            if !quiet && format == OutputFormat::Text {
                println!("All checks passed.");
            }
            Ok(())
        }
    }
}
