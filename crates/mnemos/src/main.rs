//! Interactive chat front end for the Mnemos engine.

use anyhow::Context;
use clap::Parser;
use log::{debug, info, warn};
use mnemos::config::LayeredConfigOptions;
use mnemos::core::CoreError;
use mnemos::protocol::{EventMsg, EventPayload, EventSink};
use mnemos::{CancellationToken, Credentials, MnemosConfig, TurnRequest, build_engine};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line options for the chat client.
#[derive(Parser)]
#[command(name = "mnemos", version)]
struct Cli {
    /// Extra mnemos.json5 applied over the discovered layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Owner whose memories are read and written
    #[arg(long, default_value = "default-user")]
    owner: String,
    /// Conversation thread id
    #[arg(long, default_value = "default")]
    thread: String,
    /// Send a single message and exit
    #[arg(long)]
    message: Option<String>,
    /// Print tool calls as they run
    #[arg(long)]
    show_tools: bool,
}

/// Prints tool activity to stderr.
struct ToolTrace;

impl EventSink for ToolTrace {
    fn emit(&self, event: EventMsg) {
        match event.payload {
            EventPayload::ToolCallStarted {
                tool_name,
                arguments,
                ..
            } => eprintln!("  -> {tool_name} {arguments}"),
            EventPayload::ToolCallFinished {
                result, success, ..
            } => {
                let marker = if success { "ok" } else { "failed" };
                eprintln!("  <- [{marker}] {result}");
            }
            _ => {}
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MnemosConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        info!("adding runtime config layer: {}", path.display());
        options = options.with_runtime_path(path);
    }
    let layered =
        MnemosConfig::load_layered_with_options(options).context("failed to load config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

/// Entry point for the chat client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mnemos::init_logging();

    let cli = Cli::parse();
    info!(
        "starting chat (config_set={}, owner={}, thread={})",
        cli.config.is_some(),
        cli.owner,
        cli.thread
    );
    let config = load_config(&cli)?;
    let sink: Option<Arc<dyn EventSink>> = if cli.show_tools {
        Some(Arc::new(ToolTrace))
    } else {
        None
    };
    let engine = build_engine(&config, &Credentials::from_env(), sink)
        .context("failed to build engine")?;

    if let Some(message) = cli.message.clone() {
        let request = TurnRequest::new(&cli.owner, &cli.thread, message);
        let result = engine.invoke(request, CancellationToken::new()).await?;
        println!("{}", result.final_message);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/exit" | "/quit") {
            break;
        }

        let cancel = CancellationToken::new();
        let request = TurnRequest::new(&cli.owner, &cli.thread, line);
        let turn = engine.invoke(request, cancel.clone());
        tokio::pin!(turn);
        let outcome = tokio::select! {
            outcome = &mut turn => outcome,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                turn.await
            }
        };
        match outcome {
            Ok(result) => println!("{}", result.final_message),
            Err(CoreError::Cancelled) => eprintln!("(cancelled)"),
            Err(err @ CoreError::StoreUnavailable(_)) => {
                warn!("memory store unavailable: {err}");
                eprintln!("error: {err}");
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}
