//! Herald Runtime
//!
//! Minimal binary that runs a script with its output redirected per settings

mod spill;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use herald_core::{ChannelKind, Emitter};
use herald_script::ScriptRuntime;
use spill::SpillOnExhaustion;
use std::cell::Cell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "herald")]
#[command(version)]
#[command(about = "Run a script with captured or redirected output", long_about = None)]
struct Cli {
    /// Script file to execute
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Settings file (JSON)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Output channel, overriding the settings file
    #[arg(short, long, value_enum)]
    channel: Option<ChannelArg>,

    /// Capture output into a buffer of this many bytes
    #[arg(long, value_name = "BYTES")]
    capture: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Posix,
    Web,
    Embedded,
}

impl From<ChannelArg> for ChannelKind {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Posix => ChannelKind::Posix,
            ChannelArg::Web => ChannelKind::Web,
            ChannelArg::Embedded => ChannelKind::Embedded,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with script output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Herald v{}", herald_core::VERSION);

    let mut settings = herald_services::load_settings(cli.settings.as_deref())?;
    if let Some(channel) = cli.channel {
        settings.output.channel = channel.into();
    }
    if let Some(capacity) = cli.capture {
        settings.output.capture_capacity = Some(capacity);
    }

    // Set once the captured bytes went out early because the buffer filled up
    let spilled = Rc::new(Cell::new(false));
    let mut emitter: Box<dyn Emitter> = settings.output.emitter();
    if settings.output.capture_capacity.is_some() {
        emitter = Box::new(SpillOnExhaustion::new(emitter, std::io::stdout(), spilled.clone()));
    }

    let runtime = ScriptRuntime::new(emitter, settings.script.clone())
        .context("failed to initialize script runtime")?;
    tracing::info!(channel = ?settings.output.channel, "runtime initialized");

    let Some(capacity) = settings.output.capture_capacity else {
        runtime
            .execute_file(&cli.script)
            .with_context(|| format!("script '{}' failed", cli.script.display()))?;
        return Ok(());
    };

    let source = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("failed to read script '{}'", cli.script.display()))?;
    let captured = runtime
        .execute_captured(&source, capacity)
        .with_context(|| format!("script '{}' failed", cli.script.display()))?;
    if captured.exhausted {
        tracing::warn!(capacity, "capture buffer exhausted, output truncated");
    }
    if spilled.get() {
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&captured.bytes)?;
    stdout.flush()?;
    Ok(())
}
