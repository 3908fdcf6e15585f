use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use dcelaunch::config_loader::ConfigParser;
use dcelaunch::orchestrator::{generate_launch_plan, write_plan, PlanOptions};

/// Build launch plans for external binaries running as simulated DCE applications
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra application block, e.g. "Id:left/host0/app;Binary:iperf" (repeatable)
    #[arg(short, long = "app", value_name = "BLOCK")]
    apps: Vec<String>,

    /// Output file for the launch plan (.json for JSON, YAML otherwise)
    #[arg(short, long, default_value = "dce_plan.yaml")]
    output: PathBuf,

    /// Check that every binary exists and is executable
    #[arg(long)]
    check_binaries: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if args.config.is_none() && args.apps.is_empty() {
        bail!("No applications configured: pass --config and/or --app");
    }

    let mut parser = ConfigParser::new();
    if let Some(config) = &args.config {
        info!("Configuration file: {:?}", config);
        parser
            .parse_file(config)
            .wrap_err_with(|| format!("Failed to load configuration '{}'", config.display()))?;
    }
    for block in &args.apps {
        parser.add_application_arg(block)?;
    }

    let options = PlanOptions {
        check_binaries: args.check_binaries,
    };
    let (hosts, plan) = generate_launch_plan(&parser, &options)?;
    info!("Bound applications across {} host(s)", hosts.len());

    write_plan(&plan, &args.output)?;

    info!("Launch plan generation completed successfully");
    Ok(())
}
