// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Test Doubles
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cosim_core::orchestrator::{OrchestratorClient, ParticipantAccessors};
use cosim_core::requests::{
    AnalysisRequest, ExportRequest, MaterialEdit, ProjectRequest, SpatialDataset,
};
use cosim_core::solver::FieldSolver;
use cosim_types::config::{ConnectionConfig, ParticipantConfig, RegionConfig};
use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::{ParticipantInfo, TimeStep, TransferStatus};
use tempfile::TempDir;

/// Three collinear nodes, as in the smallest end-to-end scenarios.
pub const LINE_POINTS: &str = "0 0 0\n1 0 0\n2 0 0\n";

/// Everything the fake solver saw.
#[derive(Debug, Default)]
pub struct SolverLog {
    pub calls: Vec<String>,
    pub datasets: Vec<SpatialDataset>,
    pub edits: Vec<MaterialEdit>,
    pub exports: Vec<ExportRequest>,
    pub shutdowns: usize,
}

impl SolverLog {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    pub fn last_dataset(&self, name: &str) -> Option<&SpatialDataset> {
        self.datasets.iter().rev().find(|d| d.name == name)
    }
}

/// In-memory field solver.
///
/// `export_field` writes a header plus one `x y z value` row per line of the
/// requested points file, with `value = 100 * (row + 1) + x`, unless a
/// scripted body is registered for that output path.
#[derive(Clone, Default)]
pub struct FakeSolver {
    pub log: Rc<RefCell<SolverLog>>,
    scripted_exports: Rc<RefCell<HashMap<PathBuf, String>>>,
    /// Fail the n-th (1-based) call of the named operation.
    fail_on: Option<(&'static str, usize)>,
}

impl FakeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: &'static str, nth: usize) -> Self {
        FakeSolver {
            fail_on: Some((call, nth)),
            ..Self::default()
        }
    }

    pub fn script_export(&self, path: impl Into<PathBuf>, body: &str) {
        self.scripted_exports
            .borrow_mut()
            .insert(path.into(), body.to_string());
    }

    fn record(&self, call: &'static str) -> CouplingResult<()> {
        let mut log = self.log.borrow_mut();
        log.calls.push(call.to_string());
        match self.fail_on {
            Some((name, nth)) if name == call && log.count(call) == nth => {
                Err(CouplingError::solve_failed("fake", format!("{call} #{nth} rejected")))
            }
            _ => Ok(()),
        }
    }

    fn generated_export(points_path: &Path) -> CouplingResult<String> {
        let points = std::fs::read_to_string(points_path)?;
        let mut body = String::from("X Y Z Volume_Loss_Density\n");
        for (row, line) in points.lines().filter(|l| !l.trim().is_empty()).enumerate() {
            let x: f64 = line
                .split_whitespace()
                .next()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0);
            body.push_str(&format!("{line} {}\n", 100.0 * (row as f64 + 1.0) + x));
        }
        Ok(body)
    }
}

impl FieldSolver for FakeSolver {
    fn open_project(&mut self, _request: &ProjectRequest) -> CouplingResult<()> {
        self.record("open_project")
    }

    fn add_dataset(&mut self, dataset: &SpatialDataset) -> CouplingResult<()> {
        self.record("add_dataset")?;
        self.log.borrow_mut().datasets.push(dataset.clone());
        Ok(())
    }

    fn delete_dataset(&mut self, _name: &str) -> CouplingResult<()> {
        self.record("delete_dataset")
    }

    fn edit_material(&mut self, edit: &MaterialEdit) -> CouplingResult<()> {
        self.record("edit_material")?;
        self.log.borrow_mut().edits.push(edit.clone());
        Ok(())
    }

    fn analyze(&mut self, _request: &AnalysisRequest) -> CouplingResult<()> {
        self.record("analyze")
    }

    fn export_field(&mut self, request: &ExportRequest) -> CouplingResult<()> {
        self.record("export_field")?;
        self.log.borrow_mut().exports.push(request.clone());
        let scripted = self
            .scripted_exports
            .borrow()
            .get(&request.output_path)
            .cloned();
        let body = match scripted {
            Some(body) => body,
            None => Self::generated_export(&request.points_path)?,
        };
        std::fs::write(&request.output_path, body)?;
        Ok(())
    }

    fn save_project(&mut self) -> CouplingResult<()> {
        self.record("save_project")
    }

    fn shutdown(&mut self) -> CouplingResult<()> {
        self.log.borrow_mut().shutdowns += 1;
        Ok(())
    }
}

/// Everything the scripted orchestrator saw.
#[derive(Debug, Default)]
pub struct OrchestratorLog {
    pub calls: Vec<String>,
    pub info: Option<ParticipantInfo>,
    pub fatal: Vec<String>,
    /// `(region, values)` read back after every output transfer.
    pub outputs: Vec<(String, Vec<f64>)>,
    pub restart_tokens: Vec<String>,
}

impl OrchestratorLog {
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }
}

/// Orchestrator that plays back a fixed list of time steps.
///
/// Each entry is a time step and the temperature written to every node of
/// every region for each of its iterations.
#[derive(Clone, Default)]
pub struct ScriptedOrchestrator {
    pub log: Rc<RefCell<OrchestratorLog>>,
    steps: Vec<(TimeStep, Vec<f64>)>,
    step_index: usize,
    iteration_index: usize,
    pub refuse_connect: bool,
    pub refuse_fatal_report: bool,
    pub request_restart_points: bool,
}

impl ScriptedOrchestrator {
    pub fn new(steps: Vec<(TimeStep, Vec<f64>)>) -> Self {
        ScriptedOrchestrator {
            steps,
            ..Self::default()
        }
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().calls.push(call.to_string());
    }

    fn regions(&self) -> Vec<String> {
        self.log
            .borrow()
            .info
            .as_ref()
            .map(|info| info.regions.clone())
            .unwrap_or_default()
    }

    fn read_outputs(&self, accessors: &dyn ParticipantAccessors) -> CouplingResult<()> {
        for region in self.regions() {
            let values = accessors.output_scalar(&region, "Loss Density")?;
            self.log.borrow_mut().outputs.push((region, values));
        }
        Ok(())
    }
}

impl OrchestratorClient for ScriptedOrchestrator {
    fn connect(&mut self, info: &ParticipantInfo) -> CouplingResult<()> {
        self.record("connect");
        if self.refuse_connect {
            return Err(CouplingError::Handshake("connection refused".into()));
        }
        self.log.borrow_mut().info = Some(info.clone());
        Ok(())
    }

    fn initialize_analysis(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<()> {
        self.record("initialize_analysis");
        for region in self.regions() {
            accessors.point_cloud(&region)?;
        }
        self.read_outputs(accessors)
    }

    fn has_more_time_steps(
        &mut self,
        _accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<bool> {
        self.record("has_more_time_steps");
        Ok(self.step_index < self.steps.len())
    }

    fn current_time_step(&mut self) -> CouplingResult<TimeStep> {
        self.record("current_time_step");
        let step = self.steps[self.step_index].0;
        self.step_index += 1;
        self.iteration_index = 0;
        Ok(step)
    }

    fn has_more_iterations(
        &mut self,
        _accessors: &mut dyn ParticipantAccessors,
    ) -> CouplingResult<bool> {
        self.record("has_more_iterations");
        let (_, temps) = &self.steps[self.step_index - 1];
        Ok(self.iteration_index < temps.len())
    }

    fn update_inputs(&mut self, accessors: &mut dyn ParticipantAccessors) -> CouplingResult<()> {
        self.record("update_inputs");
        let temperature = self.steps[self.step_index - 1].1[self.iteration_index];
        self.iteration_index += 1;
        for region in self.regions() {
            let nodes = accessors.point_cloud(&region)?.ids.len();
            accessors.set_input_scalar(&region, "Temperature", &vec![temperature; nodes])?;
        }
        Ok(())
    }

    fn update_outputs(
        &mut self,
        accessors: &mut dyn ParticipantAccessors,
        status: TransferStatus,
    ) -> CouplingResult<()> {
        self.record("update_outputs");
        assert_eq!(status, TransferStatus::Complete);
        self.read_outputs(accessors)?;
        if self.request_restart_points {
            let token = accessors.restart_point()?;
            self.log.borrow_mut().restart_tokens.push(token.0);
        }
        Ok(())
    }

    fn report_fatal(&mut self, message: &str) -> CouplingResult<()> {
        self.record("report_fatal");
        self.log.borrow_mut().fatal.push(message.to_string());
        if self.refuse_fatal_report {
            return Err(CouplingError::OrchestratorProtocol("link lost".into()));
        }
        Ok(())
    }

    fn disconnect(&mut self) -> CouplingResult<()> {
        self.record("disconnect");
        Ok(())
    }
}

/// Temp directory holding point files for the given regions.
pub struct Workspace {
    pub dir: TempDir,
    pub config: ParticipantConfig,
}

impl Workspace {
    /// Regions `(name, pInit, tInit, points)`; materials are the lowercased names.
    pub fn new(regions: &[(&str, f64, f64, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let regions = regions
            .iter()
            .map(|(name, p_init, t_init, points)| {
                let points_file = dir.path().join(format!("{name}.pts"));
                std::fs::write(&points_file, points).unwrap();
                RegionConfig {
                    points_file: Some(points_file),
                    export_file: Some(dir.path().join(format!("{name}.fld"))),
                    ..RegionConfig::new(name, &name.to_lowercase(), *p_init, *t_init)
                }
            })
            .collect();
        let config = ParticipantConfig {
            regions,
            ..ParticipantConfig::default()
        };
        Workspace { dir, config }
    }

    pub fn single_line_region() -> Self {
        Self::new(&[("A", 2.4, 4e-8, LINE_POINTS)])
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }
}

pub fn connection(name: &str) -> ConnectionConfig {
    ConnectionConfig {
        host: "localhost".into(),
        port: 52_000,
        name: name.into(),
        ..ConnectionConfig::default()
    }
}

pub fn step(start_time: f64, step_size: f64) -> TimeStep {
    TimeStep {
        start_time,
        step_size,
    }
}
