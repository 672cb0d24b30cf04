mod cli;

use audiohook::config;
use audiohook::http::Transport;
use audiohook::metadata::MetadataCoordinator;
use audiohook::queue::{fallback_metadata, WebhookPayload};
use audiohook::server;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting audiohook");
    tracing::info!(
        regions = ?config.regions.list,
        mam = config.mam.enabled,
        notifiers = config.notifiers.len(),
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start(config).await
}

async fn resolve_once(name: String, url: String, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let transport = Arc::new(Transport::from_config("providers", &config.http)?);
    let coordinator = MetadataCoordinator::from_config(&config, Arc::clone(&transport));

    let report = coordinator.resolve(&name, &url).await;
    let steps: Vec<String> = report.visited.iter().map(|s| s.to_string()).collect();

    let metadata = report.into_metadata().unwrap_or_else(|| {
        fallback_metadata(&WebhookPayload {
            name: name.clone(),
            url: url.clone(),
            download_url: String::new(),
            extra: Default::default(),
        })
    });

    let mut record = metadata.to_flat_record();
    record.insert("steps".into(), steps.join(",").into());
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            config::validate_config(&config)?;
            config
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Queue capacity: {}", config.server.queue_capacity);
    println!("  Signature check: {}", config.server.signature_secret.is_some());
    println!("  Regions: {}", config.regions.list.join(", "));
    println!("  Max regions per race: {}", config.regions.max_regions_to_try);
    println!("  MAM enabled: {}", config.mam.enabled);
    println!(
        "  Notifiers: {} ({} enabled)",
        config.notifiers.len(),
        config.notifiers.iter().filter(|n| n.enabled).count()
    );

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "audiohook=trace,audiohook_parser=debug,audiohook_common=debug,tower_http=debug"
                .to_string()
        } else {
            "audiohook=debug,audiohook_parser=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Resolve { name, url } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_once(name, url, cli.config.as_deref()))
        }
        Commands::Validate { config } => {
            validate_config(config.as_deref().or(cli.config.as_deref()))
        }
        Commands::Version => {
            println!("audiohook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
