//! craftwrap CLI - runs a game server behind an intercepting console.
//!
//! This is the binary entry point. See the `craftwrap` library for the
//! pipeline itself.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use craftwrap::console::SharedWriter;
use craftwrap::constants::{DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILE};
use craftwrap::{Console, LuaScriptRunner, ServerProcess, StandardStreams, WrapperConfig};
use mimalloc::MiMalloc;

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Version from Cargo.toml.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "craftwrap")]
#[command(version = VERSION)]
#[command(about = "Runs a game server behind a scriptable, intercepting console")]
struct Cli {
    /// Config file (created with defaults if missing)
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Server command and arguments, replacing `server_command` from the config
    #[arg(last = true)]
    server_command: Vec<String>,
}

/// Send logs to a file; the server owns the terminal.
///
/// Uses CRAFTWRAP_LOG_FILE, else `<config dir>/craftwrap.log`. Falls back to
/// stderr if neither can be created.
fn init_logging() {
    let log_path = std::env::var("CRAFTWRAP_LOG_FILE")
        .map(PathBuf::from)
        .ok()
        .or_else(|| WrapperConfig::config_dir().map(|dir| dir.join(DEFAULT_LOG_FILE)));

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();

    match log_path.map(std::fs::File::create) {
        Some(Ok(file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Some(Err(e)) => {
            eprintln!("craftwrap: cannot create log file ({e}), logging to stderr");
        }
        None => {}
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = WrapperConfig::load_or_create(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    config.apply_env_overrides();
    if !cli.server_command.is_empty() {
        config.server_command = cli.server_command;
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let triggers = config.triggers().context("Invalid trigger configuration")?;

    // Register before the server starts so an early Ctrl-C still stops it cleanly.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};
        use signal_hook::flag;
        flag::register(SIGINT, Arc::clone(&shutdown))?;
        flag::register(SIGTERM, Arc::clone(&shutdown))?;
        #[cfg(unix)]
        flag::register(signal_hook::consts::signal::SIGHUP, Arc::clone(&shutdown))?;
    }

    let streams = StandardStreams::acquire()?;
    let console_stdout = Arc::new(Mutex::new(streams.message_writer())) as SharedWriter;
    let (mut input, mut output) = streams.into_channels();

    let runner = Arc::new(LuaScriptRunner::new(
        config.script_directory.clone(),
        config.script_extension.clone(),
    ));
    let console = Console::install(
        triggers,
        runner,
        &mut input,
        &mut output,
        console_stdout,
        Arc::new(Mutex::new(io::stderr())) as SharedWriter,
    )
    .context("Failed to start script dispatch")?;

    log::info!("craftwrap v{VERSION} starting server");
    let server = ServerProcess::spawn(&config, input, output)?;
    let status = server.supervise(&shutdown, || {
        console.execute(&config.stop_command);
    })?;

    drop(console);
    std::process::exit(status.code().unwrap_or(1));
}
