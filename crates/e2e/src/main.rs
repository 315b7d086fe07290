//! VaultCheck - scenario validator entry point

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vaultcheck_e2e::report::OutputFormat;
use vaultcheck_e2e::{GroupId, ScenarioConfig, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "vaultcheck")]
#[command(about = "End-to-end scenario validator for the learning platform gateway")]
#[command(version)]
struct Args {
    /// Configuration file (TOML); defaults apply when absent
    #[arg(short, long, default_value = "vaultcheck.toml")]
    config: PathBuf,

    /// Gateway base URL, overrides the config file
    #[arg(long, env = "VAULTCHECK_BASE_URL")]
    base_url: Option<String>,

    /// Run only these scenario groups (repeatable)
    #[arg(short, long, value_enum)]
    group: Vec<GroupId>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "console")]
    format: OutputFormat,

    /// Also write the report to this file
    #[arg(short, long)]
    report_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
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
    let mut config = ScenarioConfig::load(&args.config)?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }

    let runner = ScenarioRunner::new(config)?.only(&args.group);
    let report = runner.run().await;

    let rendered = args.format.reporter().render(&report);
    println!("{}", rendered);

    if let Some(path) = &args.report_file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &rendered)?;
        info!("Report written to: {}", path.display());
    }

    Ok(report.summary().success)
}
