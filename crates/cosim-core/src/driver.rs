// ─────────────────────────────────────────────────────────────────────
// SCPN Co-Simulation — Participant Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Orchestrator-facing participant state machine.
//!
//! ```text
//! Disconnected → Connected → Initialized → {TimeStep → {Iteration}*}* → Completed
//!                      any state ──failure──→ Fatal
//! ```
//!
//! Within an iteration the order is fixed: pull inputs, solve, push outputs
//! marked complete. Any error is terminal: it is reported to the
//! orchestrator when the link is up, and the solver is torn down on every
//! exit path.

use std::time::Instant;

use cosim_types::config::{ConnectionConfig, ParticipantConfig};
use cosim_types::constants::BUILD_INFO;
use cosim_types::error::{CouplingError, CouplingResult};
use cosim_types::state::{
    AccessorKind, ParticipantInfo, PointCloud, RestartPoint, TimeStep, TransferStatus,
};
use tracing::{error, info, warn};

use crate::adapter::{FieldSolverAdapter, SolveReport};
use crate::field_store::FieldStore;
use crate::orchestrator::{OrchestratorClient, ParticipantAccessors};
use crate::region::RegionRegistry;
use crate::requests::build_project_request;
use crate::restart::RestartStore;
use crate::solver::{FieldSolver, SolverSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Disconnected,
    Connected,
    Initialized,
    TimeStep,
    Iteration,
    Completed,
    Fatal,
}

/// Legal transitions of the participant protocol.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: DriverState,
    time_step: Option<TimeStep>,
    time_steps: usize,
    iteration: usize,
    iterations: usize,
    connected: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle {
            state: DriverState::Disconnected,
            time_step: None,
            time_steps: 0,
            iteration: 0,
            iterations: 0,
            connected: false,
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn time_step(&self) -> Option<TimeStep> {
        self.time_step
    }

    /// 1-based iteration index within the current time step.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn total_time_steps(&self) -> usize {
        self.time_steps
    }

    pub fn total_iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the handshake ever succeeded.
    pub fn has_connected(&self) -> bool {
        self.connected
    }

    fn illegal(&self, action: &str) -> CouplingError {
        CouplingError::OrchestratorProtocol(format!("cannot {action} in state {:?}", self.state))
    }

    pub fn connect(&mut self) -> CouplingResult<()> {
        if self.state != DriverState::Disconnected {
            return Err(self.illegal("connect"));
        }
        self.state = DriverState::Connected;
        self.connected = true;
        Ok(())
    }

    pub fn initialize(&mut self) -> CouplingResult<()> {
        if self.state != DriverState::Connected {
            return Err(self.illegal("initialize"));
        }
        self.state = DriverState::Initialized;
        Ok(())
    }

    pub fn begin_time_step(&mut self, step: TimeStep) -> CouplingResult<()> {
        match self.state {
            DriverState::Initialized | DriverState::TimeStep | DriverState::Iteration => {
                self.state = DriverState::TimeStep;
                self.time_step = Some(step);
                self.time_steps += 1;
                self.iteration = 0;
                Ok(())
            }
            _ => Err(self.illegal("begin a time step")),
        }
    }

    pub fn begin_iteration(&mut self) -> CouplingResult<()> {
        match (self.state, self.time_step) {
            (DriverState::TimeStep | DriverState::Iteration, Some(_)) => {
                self.state = DriverState::Iteration;
                self.iteration += 1;
                self.iterations += 1;
                Ok(())
            }
            _ => Err(self.illegal("begin an iteration")),
        }
    }

    pub fn complete(&mut self) -> CouplingResult<()> {
        match self.state {
            DriverState::Initialized | DriverState::TimeStep | DriverState::Iteration => {
                self.state = DriverState::Completed;
                self.time_step = None;
                Ok(())
            }
            _ => Err(self.illegal("complete")),
        }
    }

    pub fn fail(&mut self) {
        self.state = DriverState::Fatal;
    }

    /// Completed and Fatal admit no further transitions.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, DriverState::Completed | DriverState::Fatal)
    }
}

/// Region registry, field store and restart ledger: everything the
/// orchestrator may reach through the accessors.
#[derive(Debug)]
pub struct ParticipantData {
    registry: RegionRegistry,
    store: FieldStore,
    restart: RestartStore,
    input_field: String,
    output_field: String,
    solves: usize,
}

impl ParticipantData {
    pub fn new(config: &ParticipantConfig) -> Self {
        ParticipantData {
            registry: RegionRegistry::new(),
            store: FieldStore::new(),
            restart: RestartStore::new(config.restart_dir.clone()),
            input_field: config.fields.input.clone(),
            output_field: config.fields.output.clone(),
            solves: 0,
        }
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn solves(&self) -> usize {
        self.solves
    }

    /// Load every configured region and declare its input and output fields.
    pub fn load(&mut self, config: &ParticipantConfig) -> CouplingResult<()> {
        for cfg in &config.regions {
            let region = self.registry.load(&cfg.name, cfg.points_path())?;
            self.store
                .declare_field(region, &config.fields.output, config.fields.output_initial)?;
            self.store
                .declare_field(region, &config.fields.input, config.fields.input_initial)?;
            info!(region = %cfg.name, nodes = region.node_count(), "region ready");
        }
        Ok(())
    }

    pub fn restore(&mut self, token: &str) -> CouplingResult<usize> {
        self.restart.restore(token, &mut self.store)
    }

    pub fn solve<S: FieldSolver + ?Sized>(
        &mut self,
        adapter: &FieldSolverAdapter,
        solver: &mut S,
        time: f64,
    ) -> CouplingResult<SolveReport> {
        let report = adapter.solve(solver, &self.registry, &mut self.store, time)?;
        self.solves += 1;
        Ok(report)
    }
}

impl ParticipantAccessors for ParticipantData {
    fn point_cloud(&self, region: &str) -> CouplingResult<PointCloud> {
        self.registry.point_cloud(region)
    }

    fn output_scalar(&self, region: &str, field: &str) -> CouplingResult<Vec<f64>> {
        if field != self.output_field {
            return Err(CouplingError::OrchestratorProtocol(format!(
                "'{field}' is not an output field"
            )));
        }
        if self.solves == 0 {
            return Err(CouplingError::OrchestratorProtocol(format!(
                "output '{field}' of region '{region}' requested before any solve"
            )));
        }
        Ok(self.store.get(region, field)?.to_vec())
    }

    fn set_input_scalar(
        &mut self,
        region: &str,
        field: &str,
        values: &[f64],
    ) -> CouplingResult<()> {
        if field != self.input_field {
            return Err(CouplingError::OrchestratorProtocol(format!(
                "'{field}' is not an input field"
            )));
        }
        self.store.set(region, field, values)
    }

    fn restart_point(&mut self) -> CouplingResult<RestartPoint> {
        self.restart.create(&self.store)
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed { time_steps: usize, iterations: usize },
    Failed(CouplingError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Process exit status: 0 on completion, 1 on any fatal condition.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed { .. } => 0,
            RunOutcome::Failed(_) => 1,
        }
    }
}

pub struct ParticipantDriver<O: OrchestratorClient, S: FieldSolver> {
    connection: ConnectionConfig,
    config: ParticipantConfig,
    orchestrator: O,
    session: SolverSession<S>,
    adapter: FieldSolverAdapter,
    data: ParticipantData,
    lifecycle: Lifecycle,
}

impl<O: OrchestratorClient, S: FieldSolver> ParticipantDriver<O, S> {
    /// Takes ownership of the solver; it is shut down when the run ends
    /// or, at the latest, when the driver is dropped.
    pub fn new(
        connection: ConnectionConfig,
        config: ParticipantConfig,
        orchestrator: O,
        solver: S,
    ) -> Self {
        let adapter = FieldSolverAdapter::new(&config);
        let data = ParticipantData::new(&config);
        ParticipantDriver {
            connection,
            config,
            orchestrator,
            session: SolverSession::new(solver),
            adapter,
            data,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.lifecycle.state()
    }

    pub fn data(&self) -> &ParticipantData {
        &self.data
    }

    pub fn orchestrator(&self) -> &O {
        &self.orchestrator
    }

    pub fn solver_released(&self) -> bool {
        self.session.is_released()
    }

    /// Drive the whole exchange, then tear the solver down.
    ///
    /// A finished driver is not driven again and the orchestrator is not
    /// contacted; the call fails with a protocol error.
    pub fn run(&mut self) -> RunOutcome {
        if self.lifecycle.is_finished() {
            let err = self.lifecycle.illegal("run");
            warn!(error = %err, "participant already finished");
            return RunOutcome::Failed(err);
        }
        let outcome = match self.drive() {
            Ok(()) => {
                info!(
                    time_steps = self.lifecycle.total_time_steps(),
                    iterations = self.lifecycle.total_iterations(),
                    "coupled analysis complete"
                );
                RunOutcome::Completed {
                    time_steps: self.lifecycle.total_time_steps(),
                    iterations: self.lifecycle.total_iterations(),
                }
            }
            Err(err) => {
                self.abort(&err);
                RunOutcome::Failed(err)
            }
        };
        if let Err(e) = self.session.release() {
            warn!(error = %e, "field solver shutdown failed");
        }
        info!("shutdown");
        outcome
    }

    fn drive(&mut self) -> CouplingResult<()> {
        self.connect()?;
        self.initialize()?;

        while self.orchestrator.has_more_time_steps(&mut self.data)? {
            let step = self.orchestrator.current_time_step()?;
            self.lifecycle.begin_time_step(step)?;
            info!(
                start_time = step.start_time,
                step_size = step.step_size,
                "time step"
            );

            while self.orchestrator.has_more_iterations(&mut self.data)? {
                self.lifecycle.begin_iteration()?;
                self.iterate(step)?;
            }
        }

        info!("saving solver project");
        self.session
            .save_project()
            .map_err(|e| CouplingError::solve_failed("save project", e))?;
        info!("disconnecting");
        self.orchestrator.disconnect()?;
        self.lifecycle.complete()
    }

    fn connect(&mut self) -> CouplingResult<()> {
        if self.lifecycle.state() != DriverState::Disconnected {
            return Err(self.lifecycle.illegal("connect"));
        }
        let info = ParticipantInfo {
            name: self.connection.name.clone(),
            build_info: BUILD_INFO.to_string(),
            transcript_filename: self.connection.transcript_filename(),
            accessors: AccessorKind::ALL.to_vec(),
            regions: self.config.regions.iter().map(|r| r.name.clone()).collect(),
        };
        self.orchestrator.connect(&info)?;
        self.lifecycle.connect()?;
        info!(
            host = %self.connection.host,
            port = self.connection.port,
            name = %self.connection.name,
            "connected to orchestrator"
        );
        Ok(())
    }

    fn initialize(&mut self) -> CouplingResult<()> {
        let started = Instant::now();
        self.data.load(&self.config)?;
        if let Some(token) = self.connection.restart_token() {
            let restored = self.data.restore(token)?;
            info!(token, fields = restored, "resuming from restart point");
        }

        self.session
            .open_project(&build_project_request(
                &self.config.solver,
                self.connection.interactive,
            ))
            .map_err(|e| CouplingError::solve_failed("open project", e))?;

        info!("performing initial solve");
        self.solve(0.0)?;
        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            "initialized field solver"
        );

        let started = Instant::now();
        info!("initializing the coupled analysis");
        self.orchestrator.initialize_analysis(&mut self.data)?;
        self.lifecycle.initialize()?;
        info!(
            elapsed_s = started.elapsed().as_secs_f64(),
            "initialized orchestrator"
        );
        Ok(())
    }

    fn iterate(&mut self, step: TimeStep) -> CouplingResult<()> {
        info!(iteration = self.lifecycle.iteration(), "iteration");
        self.orchestrator.update_inputs(&mut self.data)?;
        info!("updated inputs, solving");
        self.solve(step.end_time())?;
        self.orchestrator
            .update_outputs(&mut self.data, TransferStatus::Complete)?;
        info!("updated outputs");
        Ok(())
    }

    fn solve(&mut self, time: f64) -> CouplingResult<()> {
        let report = self.data.solve(&self.adapter, &mut *self.session, time)?;
        info!(
            time = report.time,
            elapsed_s = report.elapsed.as_secs_f64(),
            "solved"
        );
        for summary in &report.regions {
            info!(
                region = %summary.region,
                nodes = summary.nodes,
                min_permittivity = summary.min_permittivity,
                max_loss_density = summary.max_loss_density,
                "region solved"
            );
        }
        if self.connection.verbose_print {
            for (region, field, values) in self.data.store().iter() {
                info!(region, field, values = ?values.to_vec(), "solution data");
            }
        }
        Ok(())
    }

    /// Fatal path: notify the orchestrator if it is reachable. Never fails.
    fn abort(&mut self, err: &CouplingError) {
        error!(error = %err, state = ?self.lifecycle.state(), "fatal coupling error");
        self.lifecycle.fail();
        if !self.lifecycle.has_connected() || !err.orchestrator_reachable() {
            return;
        }
        if let Err(report_err) = self.orchestrator.report_fatal(&err.to_string()) {
            warn!(error = %report_err, "could not report fatal error to orchestrator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> TimeStep {
        TimeStep {
            start_time: 0.0,
            step_size: 1.0,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut lc = Lifecycle::new();
        lc.connect().unwrap();
        lc.initialize().unwrap();
        lc.begin_time_step(step()).unwrap();
        lc.begin_iteration().unwrap();
        lc.begin_iteration().unwrap();
        assert_eq!(lc.iteration(), 2);
        lc.begin_time_step(step()).unwrap();
        assert_eq!(lc.iteration(), 0);
        lc.begin_iteration().unwrap();
        lc.complete().unwrap();
        assert_eq!(lc.state(), DriverState::Completed);
        assert_eq!(lc.total_time_steps(), 2);
        assert_eq!(lc.total_iterations(), 3);
        assert!(lc.is_finished());
    }

    #[test]
    fn test_only_terminal_states_are_finished() {
        let mut lc = Lifecycle::new();
        assert!(!lc.is_finished());
        lc.connect().unwrap();
        lc.initialize().unwrap();
        assert!(!lc.is_finished());
        lc.fail();
        assert!(lc.is_finished());
        assert!(lc.connect().is_err());
    }

    #[test]
    fn test_iteration_requires_time_step() {
        let mut lc = Lifecycle::new();
        lc.connect().unwrap();
        lc.initialize().unwrap();
        assert!(matches!(
            lc.begin_iteration(),
            Err(CouplingError::OrchestratorProtocol(_))
        ));
    }

    #[test]
    fn test_time_step_requires_initialized() {
        let mut lc = Lifecycle::new();
        assert!(lc.begin_time_step(step()).is_err());
        lc.connect().unwrap();
        assert!(lc.begin_time_step(step()).is_err());
        assert!(lc.initialize().is_ok());
        assert!(lc.begin_time_step(step()).is_ok());
    }

    #[test]
    fn test_no_transitions_out_of_terminal_states() {
        let mut lc = Lifecycle::new();
        lc.connect().unwrap();
        lc.fail();
        assert!(lc.initialize().is_err());
        assert!(lc.begin_time_step(step()).is_err());
        assert!(lc.complete().is_err());
        assert!(lc.has_connected());

        let mut lc = Lifecycle::new();
        lc.connect().unwrap();
        lc.initialize().unwrap();
        lc.complete().unwrap();
        assert!(lc.connect().is_err());
        assert!(lc.begin_time_step(step()).is_err());
    }

    #[test]
    fn test_output_accessor_guards() {
        let mut data = ParticipantData::new(&ParticipantConfig::default());
        let region = cosim_types::state::Region::from_points("Die1", &[[0.0, 0.0, 0.0]]);
        data.store.declare_field(&region, "Loss Density", 0.0).unwrap();
        data.store.declare_field(&region, "Temperature", 300.0).unwrap();

        assert!(matches!(
            data.output_scalar("Die1", "Loss Density"),
            Err(CouplingError::OrchestratorProtocol(_))
        ));
        data.solves = 1;
        assert_eq!(data.output_scalar("Die1", "Loss Density").unwrap(), vec![0.0]);
        assert!(data.output_scalar("Die1", "Temperature").is_err());

        assert!(data.set_input_scalar("Die1", "Loss Density", &[1.0]).is_err());
        data.set_input_scalar("Die1", "Temperature", &[333.0]).unwrap();
        assert!(matches!(
            data.set_input_scalar("Die1", "Temperature", &[1.0, 2.0]),
            Err(CouplingError::DimensionMismatch { .. })
        ));
        assert_eq!(data.restart_point().unwrap().as_str(), "1");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            RunOutcome::Completed {
                time_steps: 0,
                iterations: 0
            }
            .exit_code(),
            0
        );
        assert_eq!(
            RunOutcome::Failed(CouplingError::Handshake("x".into())).exit_code(),
            1
        );
    }
}
