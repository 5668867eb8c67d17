//! The host shim: wires the two bridge nodes to the hosting process over
//! line-delimited JSON. Values emitted by the inbound node go out on stdout,
//! one JSON object per line; every line arriving on stdin is a payload for
//! the outbound node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use flow_node::node::{FlowNode, LogStatusSink, StatusSink};
use otsim_bridge::inbound::{InboundConfig, InboundNode};
use otsim_bridge::logger;
use otsim_bridge::outbound::{OutboundConfig, OutboundNode};
use otsim_bridge::settings::BridgeSettings;
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "otsim-bridge",
    about = "Bridges an OT simulation message bus with a flow-execution node graph",
    version
)]
struct Cli {
    /// Tag of the bus point this bridge follows and controls
    #[arg(long)]
    tag: String,

    /// Also relay Update envelopes to the graph, not just Status
    #[arg(long)]
    updates: bool,

    /// Bus publish endpoint (SUB side); overrides OTSIM_PUB_ENDPOINT
    #[arg(long)]
    pub_endpoint: Option<String>,

    /// Bus pull endpoint (PUSH side); overrides OTSIM_PULL_ENDPOINT
    #[arg(long)]
    pull_endpoint: Option<String>,

    /// Log level (e.g. error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to a daily-rolling file in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logger::init(&cli.log_level, cli.log_dir.as_deref())?;

    let settings = BridgeSettings::from_env();
    let status: Arc<dyn StatusSink> = Arc::new(LogStatusSink);

    let mut inbound = InboundNode::new(
        InboundConfig {
            tag: cli.tag.clone(),
            updates: cli.updates,
            endpoint: cli.pub_endpoint.unwrap_or(settings.pub_endpoint),
        },
        status.clone(),
    )?;
    let mut outbound = OutboundNode::new(
        OutboundConfig {
            tag: cli.tag.clone(),
            endpoint: cli.pull_endpoint.unwrap_or(settings.pull_endpoint),
        },
        status,
    )?;

    inbound.start().await?;
    outbound.start().await?;
    info!(tag = %cli.tag, updates = cli.updates, "bridge running");

    let mut stdout = BufWriter::new(io::stdout());
    let mut stdin = BufReader::new(io::stdin()).lines();

    loop {
        tokio::select! {
            emitted = inbound.recv() => match emitted {
                Some(msg) => {
                    let line = serde_json::to_string(&msg)?;
                    stdout.write_all(line.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
                None => break,
            },
            line = stdin.next_line() => match line? {
                Some(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let input = serde_json::from_str::<Value>(line)
                        // bare words count as string payloads
                        .unwrap_or_else(|_| Value::String(line.to_string()));
                    outbound.publish(&input).await?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    inbound.stop().await?;
    outbound.stop().await?;
    Ok(())
}
