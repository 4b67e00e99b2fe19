// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Solver Bridge Process
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! [`FieldSolver`] backed by a bridge process that drives the solver
//! application. Requests and replies use [`LineChannel`] framing over the
//! child's stdin/stdout; its stderr passes through to ours.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use cosim_types::config::SolverConfig;
use cosim_types::error::{CouplingError, CouplingResult};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::requests::{
    AnalysisRequest, ExportRequest, MaterialEdit, ProjectRequest, SpatialDataset,
};
use crate::solver::FieldSolver;
use crate::wire::{reject_requests, LineChannel};

/// Solver client over any line-framed transport.
pub struct BridgeSolver<R, W> {
    channel: Option<LineChannel<R, W>>,
}

impl<R: BufRead, W: Write> BridgeSolver<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        BridgeSolver {
            channel: Some(LineChannel::new(reader, writer)),
        }
    }

    fn call(&mut self, stage: &'static str, kind: &str, payload: Value) -> CouplingResult<Value> {
        let channel = self
            .channel
            .as_mut()
            .ok_or_else(|| CouplingError::solve_failed(stage, "solver bridge already closed"))?;
        channel
            .call(kind, payload, reject_requests)
            .map_err(|e| CouplingError::solve_failed(stage, e))?
            .map_err(|msg| CouplingError::solve_failed(stage, msg))
    }

    fn call_with<T: Serialize>(
        &mut self,
        stage: &'static str,
        kind: &str,
        request: &T,
    ) -> CouplingResult<()> {
        let payload = serde_json::to_value(request)?;
        self.call(stage, kind, payload).map(|_| ())
    }

    /// Send the shutdown request and drop the transport.
    fn close(&mut self) -> CouplingResult<()> {
        if self.channel.is_none() {
            return Ok(());
        }
        let result = self.call("shutdown", "shutdown", Value::Null).map(|_| ());
        self.channel = None;
        result
    }
}

impl<R: BufRead, W: Write> FieldSolver for BridgeSolver<R, W> {
    fn open_project(&mut self, request: &ProjectRequest) -> CouplingResult<()> {
        self.call_with("open project", "open_project", request)
    }

    fn add_dataset(&mut self, dataset: &SpatialDataset) -> CouplingResult<()> {
        self.call_with("install dataset", "add_dataset", dataset)
    }

    fn delete_dataset(&mut self, name: &str) -> CouplingResult<()> {
        self.call("delete dataset", "delete_dataset", json!({ "name": name }))
            .map(|_| ())
    }

    fn edit_material(&mut self, edit: &MaterialEdit) -> CouplingResult<()> {
        self.call_with("edit material", "edit_material", edit)
    }

    fn analyze(&mut self, request: &AnalysisRequest) -> CouplingResult<()> {
        self.call_with("analyze", "analyze", request)
    }

    fn export_field(&mut self, request: &ExportRequest) -> CouplingResult<()> {
        self.call_with("export", "export_field", request)
    }

    fn save_project(&mut self) -> CouplingResult<()> {
        self.call("save project", "save_project", Value::Null)
            .map(|_| ())
    }

    fn shutdown(&mut self) -> CouplingResult<()> {
        self.close()
    }
}

/// Bridge solver running as a child process.
pub struct ProcessSolver {
    bridge: BridgeSolver<BufReader<ChildStdout>, ChildStdin>,
    child: Child,
}

impl ProcessSolver {
    /// Launch the bridge command from `config`.
    ///
    /// Non-interactive sessions pass `-ng` so the solver starts without its
    /// user interface.
    pub fn spawn(config: &SolverConfig, interactive: bool) -> CouplingResult<Self> {
        let mut command = Self::command(config, interactive)?;
        let program = config.command[0].clone();
        let mut child = command.spawn().map_err(|e| {
            CouplingError::MissingResource(format!("cannot launch solver bridge '{program}': {e}"))
        })?;
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            let _ = child.kill();
            return Err(CouplingError::MissingResource(
                "solver bridge stdio not captured".to_string(),
            ));
        };
        info!(program = %program, pid = child.id(), interactive, "solver bridge started");
        Ok(ProcessSolver {
            bridge: BridgeSolver::new(BufReader::new(stdout), stdin),
            child,
        })
    }

    fn command(config: &SolverConfig, interactive: bool) -> CouplingResult<Command> {
        let (program, args) = config.command.split_first().ok_or_else(|| {
            CouplingError::ConfigError("solver bridge command must not be empty".to_string())
        })?;
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if !interactive {
            command.arg("-ng");
        }
        if let Some(var) = &config.install_env {
            let root = std::env::var_os(var).ok_or_else(|| {
                CouplingError::MissingResource(format!(
                    "environment variable {var} must point at the solver installation"
                ))
            })?;
            command.env("FIELD_SOLVER_ROOT", root);
        }
        Ok(command)
    }
}

impl FieldSolver for ProcessSolver {
    fn open_project(&mut self, request: &ProjectRequest) -> CouplingResult<()> {
        self.bridge.open_project(request)
    }

    fn add_dataset(&mut self, dataset: &SpatialDataset) -> CouplingResult<()> {
        self.bridge.add_dataset(dataset)
    }

    fn delete_dataset(&mut self, name: &str) -> CouplingResult<()> {
        self.bridge.delete_dataset(name)
    }

    fn edit_material(&mut self, edit: &MaterialEdit) -> CouplingResult<()> {
        self.bridge.edit_material(edit)
    }

    fn analyze(&mut self, request: &AnalysisRequest) -> CouplingResult<()> {
        self.bridge.analyze(request)
    }

    fn export_field(&mut self, request: &ExportRequest) -> CouplingResult<()> {
        self.bridge.export_field(request)
    }

    fn save_project(&mut self) -> CouplingResult<()> {
        self.bridge.save_project()
    }

    /// Ask the bridge to exit, then reap it; kill it if the request failed.
    fn shutdown(&mut self) -> CouplingResult<()> {
        let result = self.bridge.shutdown();
        if result.is_err() {
            warn!("solver bridge did not acknowledge shutdown, killing it");
            let _ = self.child.kill();
        }
        let status = self.child.wait()?;
        info!(%status, "solver bridge exited");
        result
    }
}
