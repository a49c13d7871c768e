// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Zonekit CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use zonekit::cli::{Reporter, Runner};
use zonekit::EngineConfig;

#[derive(Parser)]
#[command(name = "zonekit")]
#[command(about = "Zonekit - boolean zone algebra with CSG preview and DNF export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (defaults to ./zonekit.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the textual definition of every zone
    Export {
        /// Scene document (JSON)
        input: PathBuf,
    },

    /// Write the zone block of a geo.dat
    Geo {
        /// Scene document (JSON)
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate zone invariants and recompute every zone
    Check {
        /// Scene document (JSON)
        input: PathBuf,
    },

    /// Recompute zones as meshes and print their statistics
    Render {
        /// Scene document (JSON)
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            let mut config = EngineConfig::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => EngineConfig::load()?,
    };
    let runner = Runner::new(config);

    match &cli.command {
        Commands::Export { input } => export_command(&runner, input)?,
        Commands::Geo { input, output } => geo_command(&runner, input, output.as_deref())?,
        Commands::Check { input } => check_command(&runner, input)?,
        Commands::Render { input } => render_command(&runner, input)?,
        Commands::Version => {
            println!("Zonekit v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn require_input(input: &Path) {
    if !input.exists() {
        Reporter::report_error(&format!("Input file not found: {}", input.display()));
        std::process::exit(1);
    }
}

fn export_command(runner: &Runner, input: &Path) -> Result<()> {
    require_input(input);
    let document = runner.load(input)?;
    let definitions = runner.export(&document);
    if definitions.is_empty() {
        Reporter::report_warning("Document defines no zones");
    }
    Reporter::report_definitions(&input.display().to_string(), &definitions);
    Ok(())
}

fn geo_command(runner: &Runner, input: &Path, output: Option<&Path>) -> Result<()> {
    require_input(input);
    let document = runner.load(input)?;
    let card = runner.geo_card(&document);

    match output {
        Some(path) => {
            std::fs::write(path, card)?;
            Reporter::success(&format!("Zone card written to {}", path.display()));
        }
        None => print!("{}", card),
    }
    Ok(())
}

fn check_command(runner: &Runner, input: &Path) -> Result<()> {
    require_input(input);
    let document = runner.load(input)?;
    let reports = runner.check(&document)?;
    if !Reporter::report_check(&input.display().to_string(), &reports) {
        std::process::exit(1);
    }
    Ok(())
}

fn render_command(runner: &Runner, input: &Path) -> Result<()> {
    require_input(input);
    let document = runner.load(input)?;
    let reports = runner.render(&document)?;
    Reporter::report_render(&input.display().to_string(), &reports);
    Ok(())
}
