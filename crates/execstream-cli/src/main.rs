//! ExecStream CLI
//!
//! Replays a captured tool-calling LLM stream (SSE text) through the event
//! emitter, or prepares the request body that would start one.
//!
//! Events and request bodies go to stdout; logs and metrics go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use execstream_core::prelude::*;
use execstream_core::{get_adapter, load_history, CompletionRequest};
use futures::StreamExt;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, info, warn};

mod config;

use config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "execstream")]
#[command(about = "Reconstruct message, code and review events from LLM streams", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "execstream.yaml", env = "EXECSTREAM_CONFIG")]
    config: String,

    /// Stream format adapter (openai, anthropic)
    #[arg(short, long, global = true, env = "EXECSTREAM_ADAPTER")]
    adapter: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print a Prometheus metrics snapshot to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay an SSE stream and print one JSON event per line
    Stream {
        /// SSE capture to read (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the completion request body for a message history
    Prepare {
        /// JSON file holding an array of chat messages
        #[arg(short, long)]
        messages: PathBuf,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Language the caller can execute (repeatable)
        #[arg(short, long = "language")]
        languages: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    let config = CliConfig::load(&cli.config, &cli)?;
    debug!(adapter = %config.adapter, model = %config.model, "configuration loaded");

    let metrics_handle = if cli.metrics { Some(init_metrics()?) } else { None };

    match &cli.command {
        Command::Stream { input } => run_stream(&config, input.as_deref()).await?,
        Command::Prepare { messages, .. } => run_prepare(&config, messages).await?,
    }

    if let Some(handle) = metrics_handle {
        eprint!("{}", handle.render());
    }

    Ok(())
}

/// Replay an SSE capture through the configured adapter and emitter
async fn run_stream(config: &CliConfig, input: Option<&Path>) -> Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let adapter = get_adapter(&config.adapter);
    info!(adapter = adapter.name(), "replaying stream");

    let lines = FramedRead::new(reader, LinesCodec::new());
    let emitter = StreamEventEmitter::new(config.emitter.clone())?;
    let mut events = std::pin::pin!(emitter.into_stream(decode_lines(adapter, lines)));

    let mut stdout = tokio::io::stdout();
    let mut count = 0usize;
    while let Some(event) = events.next().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        count += 1;
    }
    stdout.flush().await?;

    if events.emitter().is_aborted() {
        warn!("stream ended early on an unrecognized function call");
    }
    info!(events = count, "stream replay complete");
    Ok(())
}

/// Print the request body for a stored history
async fn run_prepare(config: &CliConfig, messages: &Path) -> Result<()> {
    let history = load_history(messages)
        .with_context(|| format!("failed to load history from {}", messages.display()))?;

    let request = CompletionRequest::prepare_for(
        &config.emitter,
        config.model.as_str(),
        history,
        config.languages.as_slice(),
    )?;
    info!(messages = request.messages.len(), model = %request.model, "request prepared");

    let mut body = serde_json::to_vec_pretty(&request)?;
    body.push(b'\n');

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&body).await?;
    stdout.flush().await?;
    Ok(())
}

/// Initialize tracing/logging on stderr
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("execstream=debug,execstream_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("execstream=info,execstream_core=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Initialize metrics recorder and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("execstream_events_total", "Total number of events emitted by kind");
    metrics::describe_counter!(
        "execstream_fallbacks_total",
        "Function calls handled by a fallback path, by kind"
    );
    metrics::describe_counter!("execstream_turns_total", "Completed turns by outcome");

    debug!("Metrics recorder installed");
    Ok(handle)
}
