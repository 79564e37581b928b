//! railtail - follow a provider's environment logs
//!
//! Streams reconstructed log documents to stdout, one JSON array per line.
//! Diagnostics go to stderr.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use railtail::{log_channel, write_batches, LogPipeline, StreamConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "railtail")]
#[command(about = "Resilient log stream subscriber")]
#[command(version)]
struct Cli {
    /// Emit diagnostics as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream environment logs to stdout
    Stream(ConnectionArgs),

    /// Print the resolved id → name table
    Resolve(ConnectionArgs),
}

#[derive(Args)]
struct ConnectionArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Provider API key
    #[arg(long, env = "RAILWAY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Environment to follow
    #[arg(long, env = "RAILWAY_ENVIRONMENT_ID")]
    environment_id: Option<String>,

    /// Services to scope the stream to
    #[arg(long, env = "RAILWAY_SERVICE_IDS", value_delimiter = ',')]
    service_ids: Vec<String>,

    /// Extra provider filter expression
    #[arg(long)]
    filter: Option<String>,

    /// GraphQL query endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// GraphQL subscription endpoint
    #[arg(long)]
    subscription_url: Option<String>,
}

impl ConnectionArgs {
    fn into_config(self) -> anyhow::Result<StreamConfig> {
        let mut config = match &self.config {
            Some(path) => StreamConfig::from_file(path)?,
            None => StreamConfig::default(),
        };

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if let Some(environment_id) = self.environment_id {
            config.environment_id = environment_id;
        }
        let service_ids: Vec<String> = self
            .service_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if !service_ids.is_empty() {
            config.service_ids = service_ids;
        }
        if self.filter.is_some() {
            config.filter = self.filter;
        }
        if let Some(api_url) = self.api_url {
            config.api_url = api_url;
        }
        if let Some(subscription_url) = self.subscription_url {
            config.subscription_url = subscription_url;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the documents
    tracing_subscriber::registry()
        .with(
            cli.log_json
                .then(|| fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json).then(|| fmt::layer().with_writer(std::io::stderr)),
        )
        .with(EnvFilter::from_default_env().add_directive("railtail=info".parse()?))
        .init();

    match cli.command {
        Commands::Stream(args) => stream(args.into_config()?).await,
        Commands::Resolve(args) => resolve(args.into_config()?).await,
    }
}

async fn stream(config: StreamConfig) -> anyhow::Result<()> {
    info!(environment_id = %config.environment_id, "starting railtail");

    let (sink, mut batches) = log_channel(config.sink_capacity);
    let pipeline = LogPipeline::new(config)?;
    let cancel = CancellationToken::new();

    let signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                signal.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for interrupt"),
        }
    });

    let writer =
        tokio::spawn(async move { write_batches(&mut batches, tokio::io::stdout()).await });

    let result = pipeline.run(sink, cancel).await;

    match writer.await? {
        Ok(written) => info!(records = written, "stream finished"),
        Err(e) => error!(error = %e, "failed to write log documents"),
    }

    result?;
    Ok(())
}

async fn resolve(config: StreamConfig) -> anyhow::Result<()> {
    let pipeline = LogPipeline::new(config)?;
    let table = pipeline.refresh_metadata().await?;

    let names: BTreeMap<&str, &str> = table.iter().collect();
    println!("{}", serde_json::to_string_pretty(&names)?);
    Ok(())
}
