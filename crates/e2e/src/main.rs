//! Harness entry point
//!
//! Exit status: 0 when no step failed, 1 when a step failed, 2 when the
//! harness could not run at all.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use navigator_e2e::steps::default_pipeline;
use navigator_e2e::{HarnessConfig, RunMode, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "navigator-e2e")]
#[command(about = "API test harness for the Learning Navigator service")]
#[command(version)]
struct Args {
    /// Configuration file (TOML); defaults apply when it does not exist
    #[arg(short, long, default_value = "navigator-e2e.toml")]
    config: PathBuf,

    /// Base URL of the service under test
    #[arg(long, env = "NAVIGATOR_BASE_URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "NAVIGATOR_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Keep created entities instead of deleting them
    #[arg(long)]
    no_cleanup: bool,

    /// Suppress per-step informational lines
    #[arg(short, long)]
    quiet: bool,

    /// Behaviour after a failed step
    #[arg(long, value_enum)]
    mode: Option<RunMode>,

    /// Run only the named step (repeatable)
    #[arg(long)]
    only: Vec<String>,

    /// Print the registered steps and exit
    #[arg(long)]
    list: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    let mut config = HarnessConfig::load(&args.config)?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if args.no_cleanup {
        config.cleanup = false;
    }
    if args.quiet {
        config.detailed_logging = false;
    }

    let mut pipeline = default_pipeline()?;
    if !args.only.is_empty() {
        pipeline = pipeline.select(&args.only)?;
    }

    if args.list {
        for info in pipeline.describe() {
            let requires: Vec<String> = info.requires.iter().map(|f| f.to_string()).collect();
            if requires.is_empty() {
                println!("{}", info.name);
            } else {
                println!("{}  (requires: {})", info.name, requires.join(", "));
            }
        }
        return Ok(true);
    }

    let mut runner = TestRunner::new(config)?.with_output_dir(args.output);
    let results = runner.run(&pipeline).await;
    runner.write_results(&results)?;

    Ok(results.success())
}
