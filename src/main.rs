//! mpack-wizard - command line entry point
//!
//! Thin shell over the library: every command loads its inputs, runs one
//! piece of the wizard core and prints the result.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use mpack_wizard::cli::{Cli, Commands};
use mpack_wizard::hosts::evaluate_host_input;
use mpack_wizard::registry::{FileRegistrySource, RegistrySource};
use mpack_wizard::repos::RepositoryMatrixBuilder;
use mpack_wizard::selection::{mpack_version_id, SelectionGraphStore};
use mpack_wizard::wizard::steps::{load_catalog_for, DownloadMpacksStep};
use mpack_wizard::wizard::{ContentStore, JsonFileContentStore, WizardStep};
use mpack_wizard::{HttpTransport, ProvisionState, WizardConfig};

/// Initialize tracing; RUST_LOG overrides the level picked from `--verbose`
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    match run(cli.command).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run one command; `Ok(false)` means it completed but reported a problem
async fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::ExpandHosts { spec } => Ok(expand_hosts(&spec.join(" "))),
        Commands::ValidateConfig { config } => validate_config(&config),
        Commands::Repos {
            registry,
            catalog,
            content,
        } => print_repos(&registry, &catalog, &content).await,
        Commands::Download { config, content } => download(&config, &content).await,
    }
}

fn expand_hosts(spec: &str) -> bool {
    let report = evaluate_host_input(spec, &[]);
    for host in &report.hosts {
        println!("{}", host);
    }
    if report.is_pattern {
        info!("Expanded pattern input to {} host(s)", report.hosts.len());
    }
    if report.all_valid() {
        return true;
    }
    for host in &report.invalid {
        eprintln!("✗ Invalid host name: {}", host);
    }
    false
}

fn validate_config(path: &Path) -> Result<bool> {
    info!("Validating configuration file: {:?}", path);
    let config = WizardConfig::load_from_file(path)?;
    match config.validate() {
        Ok(()) => {
            println!("✓ Configuration file is valid: {:?}", path);
            Ok(true)
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed: {:#}", e);
            Ok(false)
        }
    }
}

async fn print_repos(registry: &Path, catalog: &Path, content: &Path) -> Result<bool> {
    let source = FileRegistrySource::new(registry, catalog);
    let store = SelectionGraphStore::from_registry(&source.load_registry().await?);
    let content = JsonFileContentStore::new(content).load()?;

    let mut known = true;
    for record in &content.selected_mpacks {
        if store.get_mpack_version_by_id(&mpack_version_id(&record.name, &record.version)).is_none() {
            warn!("Mpack {} {} is not in the registry", record.name, record.version);
            known = false;
        }
    }

    let snapshot = load_catalog_for(&source, &content).await?;
    let matrix = RepositoryMatrixBuilder::build_for_records(&content.selected_mpacks, &snapshot);

    let json = serde_json::to_string_pretty(&matrix).context("Failed to serialize repository matrix")?;
    println!("{}", json);
    Ok(known)
}

async fn download(config: &Path, content: &Path) -> Result<bool> {
    let config = WizardConfig::load_from_file(config)?;
    let content = JsonFileContentStore::new(content).load()?;
    if content.selected_mpacks.is_empty() {
        println!("No mpacks selected");
        return Ok(true);
    }

    let transport = Arc::new(HttpTransport::new(&config)?);
    let mut step = DownloadMpacksStep::new(transport);
    step.load(&content)?;
    step.settle_all().await;

    for item in step.items() {
        match item.state {
            ProvisionState::Succeeded => println!("✓ {}", item.id),
            _ => println!("✗ {}: {}", item.id, item.failure_message().unwrap_or("not finished")),
        }
    }
    Ok(step.can_advance())
}
