//! basalt — plan containerized vulnerability checks
//!
//! Thin glue around the basalt crates: parse arguments, load the run
//! configuration, resolve the checktype catalog (building local sources as
//! needed) and emit the job list for the external check runner as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use basalt_common::config::Config;
use basalt_common::logging::{self, LogFormat};
use basalt_containers::{DockerClient, Runtime};
use basalt_engine::generate_jobs;

#[derive(Parser, Debug)]
#[command(name = "basalt")]
#[command(version)]
#[command(about = "Plan containerized vulnerability checks", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "basalt.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact); overrides config
    #[arg(long)]
    log_format: Option<String>,

    /// Container runtime flavor; overrides config and BASALT_RUNTIME
    #[arg(long)]
    runtime: Option<String>,

    /// Write the job list to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("load configuration {}", args.config))?
        .merge_env();

    let level = args.log_level.as_deref().unwrap_or(&config.log.level);
    let format: LogFormat = args
        .log_format
        .as_deref()
        .unwrap_or(&config.log.format)
        .parse()?;
    logging::init_logging(level, format);

    info!("basalt {} starting", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    let runtime = match args.runtime.as_deref().or(config.runtime.as_deref()) {
        Some(name) => name.parse::<Runtime>()?,
        None => Runtime::default(),
    };
    info!("container runtime: {runtime}");

    let client = DockerClient::new(runtime).context("connect to container engine")?;
    let catalog = basalt_checktypes::resolve(&config.checktypes, &client)
        .await
        .context("resolve checktype catalog")?;

    let jobs = generate_jobs(&catalog, &config.targets)?;
    info!(
        "planned {} jobs from {} checktypes and {} targets",
        jobs.len(),
        catalog.len(),
        config.targets.len()
    );

    let rendered = serde_json::to_string_pretty(&jobs)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("write job list {path}"))?;
            info!("job list written to {path}");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
