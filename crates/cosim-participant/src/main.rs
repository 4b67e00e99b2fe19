// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Participant Executable
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field solver participant.
//!
//! Connects to the orchestrator, launches the solver bridge once the
//! handshake is done and runs the coupled analysis to completion. Exits 0
//! on success, 1 on any failure.
//!
//! ```text
//! cosim-participant --schost localhost --scport 52000 --scname HFSS
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cosim_core::driver::ParticipantDriver;
use cosim_core::json_orchestrator::JsonLineOrchestrator;
use cosim_core::process_solver::ProcessSolver;
use cosim_core::solver::DeferredSolver;
use cosim_types::config::{ConnectionConfig, ParticipantConfig};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "cosim-participant")]
#[command(about = "Couple a field solver to a co-simulation orchestrator")]
struct Cli {
    /// Orchestrator host
    #[arg(long)]
    schost: String,

    /// Orchestrator port
    #[arg(long)]
    scport: u16,

    /// Participant name
    #[arg(long)]
    scname: String,

    /// Restart token to resume from
    #[arg(long, default_value = "")]
    screstart: String,

    /// Keep the solver user interface visible
    #[arg(long)]
    gui: bool,

    /// Log every field after each solve
    #[arg(long)]
    printsol: bool,

    /// Participant model configuration (JSON); built-in two-die model if omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cosim_core=info,cosim_participant=info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn bootstrap(cli: &Cli) -> Result<(ConnectionConfig, ParticipantConfig)> {
    let connection = ConnectionConfig {
        host: cli.schost.clone(),
        port: cli.scport,
        name: cli.scname.clone(),
        restart: cli.screstart.clone(),
        interactive: cli.gui,
        verbose_print: cli.printsol,
    };
    let config = match &cli.config {
        Some(path) => ParticipantConfig::from_file(path)
            .with_context(|| format!("loading participant config {}", path.display()))?,
        None => {
            let config = ParticipantConfig::default();
            config.validate().context("built-in participant config")?;
            config
        }
    };
    Ok((connection, config))
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let (connection, config) = match bootstrap(&cli) {
        Ok(v) => v,
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };

    info!(
        host = %connection.host,
        port = connection.port,
        name = %connection.name,
        restart = %connection.restart,
        "starting participant"
    );

    let orchestrator = match JsonLineOrchestrator::connect_tcp(&connection.host, connection.port) {
        Ok(o) => o,
        Err(e) => {
            error!(error = %e, "could not reach orchestrator");
            std::process::exit(1);
        }
    };

    // Launched on the driver's first solver call, after the handshake.
    let (solver_config, interactive) = (config.solver.clone(), connection.interactive);
    let solver = DeferredSolver::new(move || ProcessSolver::spawn(&solver_config, interactive));

    let mut driver = ParticipantDriver::new(connection, config, orchestrator, solver);
    let outcome = driver.run();
    drop(driver);
    std::process::exit(outcome.exit_code());
}
