// SPDX-License-Identifier: AGPL-3.0-or-later
//! bridge-init: initialize the bridge context and credentials

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_types::region::Region;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use bridge_init::authority::IotIdentityAuthority;
use bridge_init::context::ContextStore;
use bridge_init::ensure::EnsureOutcome;
use bridge_init::remote::{HttpAccountClient, DEFAULT_ENDPOINT};
use bridge_init::secrets::SsmSecretStore;
use bridge_init::{BootstrapSettings, Bootstrapper, CliInput, Config};

/// Initialize context
///
/// Ensures the nRF Cloud device credentials and the local AWS IoT client
/// credentials exist in Parameter Store, then records the bridge settings
/// in the context file.
#[derive(Parser, Debug)]
#[command(name = "bridge-init")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Your nRF Cloud API key
    api_key: String,

    /// The nRF Cloud REST API host endpoint
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Regenerate all credentials. This will regenerate your MQTT Team Device certificate.
    #[arg(long)]
    reset: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "bridge-init.toml")]
    config: PathBuf,

    /// Context file to update (overrides the configured path)
    #[arg(long)]
    context: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    let input = CliInput {
        api_key: cli.api_key,
        endpoint: cli.endpoint,
        reset: cli.reset,
    };
    let context_path = cli.context.unwrap_or_else(|| config.context_file.clone());

    run(&config, &input, context_path).await.map_err(|e| {
        error!(error = %e, "Initialization failed");
        e
    })
}

async fn run(config: &Config, input: &CliInput, context_path: PathBuf) -> anyhow::Result<()> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.local.region {
        loader = loader.region(Region::new(region.clone()));
    }
    let shared_config = loader.load().await;

    let secrets = SsmSecretStore::from_conf(&shared_config);
    let authority = IotIdentityAuthority::from_conf(&shared_config);
    let account = HttpAccountClient::new(
        &input.endpoint,
        &input.api_key,
        Duration::from_secs(config.remote.timeout_secs),
    )?
    .with_issuance(config.remote.issuance);

    let bootstrapper = Bootstrapper::new(
        &secrets,
        &account,
        &authority,
        ContextStore::new(&context_path),
        BootstrapSettings::from(config),
    );

    let report = bootstrapper.run(input.reset).await?;

    println!("Retrieved nRF Cloud account info:");
    println!("{}", serde_json::to_string_pretty(&report.account)?);
    println!();
    println!("MQTT Team Device credentials: {}", describe(report.remote));
    println!("Local IoT client credentials: {}", describe(report.local));
    println!();
    println!("Saved context info to {}:", context_path.display());
    println!("{}", serde_json::to_string_pretty(&report.fields)?);

    Ok(())
}

fn describe(outcome: EnsureOutcome) -> &'static str {
    match outcome {
        EnsureOutcome::Existing => "existing",
        EnsureOutcome::Issued => "newly generated",
    }
}
